use anyhow::anyhow;
use rand_seeder::SipRng;

use crate::experiment::{ExperimentConfig, ExperimentResult, Outcome};
use crate::process::Process;
use crate::sim::arrivals::Arrivals;
use crate::sim::lifecycle::Lifecycle;
use crate::sim::resources::{CpuPool, IoQueue, MemoryPool};
use crate::sim::{Clock, EndCondition, Event, Wakeup};
use crate::stats::Collector;
use crate::utils::prelude::*;
use crate::workload::Workload;

/// The machine being simulated: shared resources, the collector, and the run's random stream
pub(crate) struct System {
    pub memory: MemoryPool,
    pub cpu: CpuPool,
    pub io: IoQueue,
    pub collector: Collector,
    pub workload: Workload,
    pub rng: SipRng,
    pub instructions_per_unit: u32,
}

/// One simulation run, from an empty machine to a drained (or cut off) clock
pub(crate) struct Simulator {
    clock: Clock,
    system: System,
    arrivals: Arrivals,
    processes: Vec<Lifecycle>,
}

impl Simulator {
    /// Expects an already validated config
    pub fn new(cfg: &ExperimentConfig, rng: SipRng) -> Result<Self> {
        let system = System {
            memory: MemoryPool::new(cfg.ram_capacity),
            cpu: CpuPool::new(cfg.cpu_count),
            io: IoQueue::new(),
            collector: Collector::new(cfg.include_trace),
            workload: Workload::new(cfg.arrival_interval)?,
            rng,
            instructions_per_unit: cfg.instructions_per_unit,
        };
        Ok(Self {
            clock: Clock::new(),
            system,
            arrivals: Arrivals::new(cfg.process_count),
            processes: vec![],
        })
    }

    /// Start the arrival generator
    pub fn start(&mut self) -> Result<()> {
        self.arrivals
            .schedule_next(&mut self.system, &mut self.clock)
    }

    /// Handle the next due event, `None` once the end condition is met
    pub fn step(&mut self, until: &EndCondition) -> Result<Option<Event>> {
        let event = match self.clock.next_event(until) {
            Some(event) => event,
            None => return Ok(None),
        };
        debug!(%event, "handling event");

        match event.wakeup {
            Wakeup::Arrival => {
                let process = self
                    .arrivals
                    .spawn(&mut self.system, &self.clock);
                self.arrive(process)?;
                self.arrivals
                    .schedule_next(&mut self.system, &mut self.clock)?;
            }
            Wakeup::Resume(pid) => {
                let processes = &mut self.processes;
                let lifecycle = pid
                    .checked_sub(1)
                    .and_then(|idx| processes.get_mut(idx))
                    .ok_or_else(|| anyhow!("no process with pid {}", pid))?;
                lifecycle.resume(&mut self.system, &mut self.clock)?;
            }
        }
        Ok(Some(event))
    }

    /// Hand a freshly created process to its own coordinator
    fn arrive(&mut self, process: Process) -> Result<()> {
        debug_assert_eq!(process.id, self.processes.len() + 1);
        let mut lifecycle = Lifecycle::new(process);
        lifecycle.admit(&mut self.system, &mut self.clock)?;
        self.processes.push(lifecycle);
        Ok(())
    }

    pub fn run(&mut self, until: EndCondition) -> Result<Outcome> {
        while self.step(&until)?.is_some() {}

        let outcome = if !self.clock.is_idle() {
            warn!(
                time = %self.clock.now(),
                pending = self.clock.pending(),
                "time budget exceeded, in-flight processes are left as they are"
            );
            Outcome::BudgetExceeded
        } else if self.arrivals.is_exhausted() && self.processes.iter().all(|p| p.process().is_terminated()) {
            Outcome::Completed
        } else {
            warn!(
                time = %self.clock.now(),
                memory.free = self.system.memory.level(),
                memory.waiting = self.system.memory.waiting(),
                "no more events but some processes never finished"
            );
            Outcome::Stalled
        };

        info!(
            time = %self.clock.now(),
            events = self.clock.processed(),
            arrived = self.arrivals.created(),
            io_requests = self.system.io.served(),
            %outcome,
            "simulation finished"
        );
        Ok(outcome)
    }

    pub fn into_result(self, outcome: Outcome) -> ExperimentResult {
        let end_time = self.clock.now();
        let report = self.system.collector.finish();
        let processes: Vec<Process> = self
            .processes
            .into_iter()
            .map(Lifecycle::into_process)
            .collect();
        ExperimentResult {
            num_processes: self.arrivals.total(),
            average_time: report.average_time,
            standard_deviation: report.standard_deviation,
            processes,
            time_series_data: report.time_series,
            outcome,
            end_time,
        }
    }
}
