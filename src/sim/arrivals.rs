use crate::process::{Pid, Process};
use crate::sim::{Clock, Wakeup};
use crate::simulator::System;
use crate::utils::prelude::*;

/// Injects exactly `total` processes, one exponential gap apart.
///
/// The generator never waits on a resource; it only sleeps on the clock and
/// hands each new process to the caller, which starts its coordinator.
#[derive(Debug)]
pub(crate) struct Arrivals {
    total: usize,
    created: usize,
}

impl Arrivals {
    pub fn new(total: usize) -> Self {
        Self { total, created: 0 }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn created(&self) -> usize {
        self.created
    }

    pub fn is_exhausted(&self) -> bool {
        self.created >= self.total
    }

    /// Sleep until the next arrival, if any is left
    pub fn schedule_next(&self, sys: &mut System, clock: &mut Clock) -> Result<()> {
        if self.is_exhausted() {
            debug!(time = %clock.now(), total = self.total, "all processes arrived");
            return Ok(());
        }
        let gap = sys.workload.inter_arrival(&mut sys.rng);
        clock.timeout(gap, Wakeup::Arrival)
    }

    /// The gap elapsed: create the next process, ids start at 1
    pub fn spawn(&mut self, sys: &mut System, clock: &Clock) -> Process {
        self.created += 1;
        let id: Pid = self.created;
        let memory = sys.workload.memory_demand(&mut sys.rng);
        let instructions = sys.workload.instructions(&mut sys.rng);
        Process::new(id, clock.now(), memory, instructions)
    }
}
