//! Per-process coordinator: memory, then CPU slices interleaved with I/O, until done.
//!
//! A coordinator runs forward until it hits a suspension (a timer on the clock,
//! or a resource that queued it) and records in `phase` where to pick up. It is
//! resumed by `Wakeup::Resume(pid)`, either because its timer fired or because
//! a release handed it the resource it was queued for.

use crate::process::{Pid, Process, ProcessState};
use crate::sim::resources::Grant;
use crate::sim::{Clock, Wakeup};
use crate::simulator::System;
use crate::types::Duration;
use crate::utils::prelude::*;
use crate::workload::AfterSlice;

/// Length of one CPU slice
pub const SLICE: Duration = Duration::units(1.0);

/// What the coordinator is suspended on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    /// Waiting for the memory grant
    Admission,
    /// Waiting for a CPU unit
    CpuQueue,
    /// Holding a CPU for one slice
    Slice,
    /// Inside the I/O queue
    Io,
    Done,
}

#[derive(Debug)]
pub(crate) struct Lifecycle {
    process: Process,
    phase: Phase,
}

impl Lifecycle {
    pub fn new(process: Process) -> Self {
        Self {
            process,
            phase: Phase::Admission,
        }
    }

    pub fn process(&self) -> &Process {
        &self.process
    }

    pub fn into_process(self) -> Process {
        self.process
    }

    fn pid(&self) -> Pid {
        self.process.id
    }

    /// Entry point at arrival: the process sits in `new` until memory is granted
    pub fn admit(&mut self, sys: &mut System, clock: &mut Clock) -> Result<()> {
        sys.collector
            .on_transition(clock.now(), None, ProcessState::New, sys.memory.level());
        debug!(time = %clock.now(), process = %self.process, "arrived");

        self.phase = Phase::Admission;
        match sys
            .memory
            .acquire(self.pid(), self.process.memory_demand)
        {
            Grant::Now => self.resume(sys, clock),
            Grant::Queued => {
                debug!(pid = self.pid(), free = sys.memory.level(), "waiting for memory");
                Ok(())
            }
        }
    }

    /// Continue after the suspension recorded in `phase` is satisfied
    pub fn resume(&mut self, sys: &mut System, clock: &mut Clock) -> Result<()> {
        match self.phase {
            Phase::Admission => {
                self.enter(ProcessState::Ready, sys, clock);
                self.compete_for_cpu(sys, clock)
            }
            Phase::CpuQueue => self.dispatch(sys, clock),
            Phase::Slice => self.after_slice(sys, clock),
            Phase::Io => {
                sys.io.leave(self.pid());
                self.enter(ProcessState::Ready, sys, clock);
                self.compete_for_cpu(sys, clock)
            }
            Phase::Done => {
                error!(pid = self.pid(), "resumed a terminated process");
                Ok(())
            }
        }
    }

    fn compete_for_cpu(&mut self, sys: &mut System, clock: &mut Clock) -> Result<()> {
        self.phase = Phase::CpuQueue;
        match sys.cpu.acquire(self.pid()) {
            Grant::Now => self.dispatch(sys, clock),
            Grant::Queued => Ok(()),
        }
    }

    fn dispatch(&mut self, sys: &mut System, clock: &mut Clock) -> Result<()> {
        self.enter(ProcessState::Running, sys, clock);
        self.phase = Phase::Slice;
        clock.timeout(SLICE, Wakeup::Resume(self.pid()))
    }

    fn after_slice(&mut self, sys: &mut System, clock: &mut Clock) -> Result<()> {
        self.process.execute(sys.instructions_per_unit);

        if let Some(next) = sys.cpu.release() {
            clock.wake_now(Wakeup::Resume(next));
        }

        if self.process.is_finished() {
            return self.terminate(sys, clock);
        }

        match sys.workload.after_slice(&mut sys.rng) {
            AfterSlice::Io => {
                sys.io.enter(self.pid());
                self.enter(ProcessState::Waiting, sys, clock);
                self.phase = Phase::Io;
                let io_time = sys.workload.io_time(&mut sys.rng);
                clock.timeout(io_time, Wakeup::Resume(self.pid()))
            }
            AfterSlice::Requeue => {
                self.enter(ProcessState::Ready, sys, clock);
                self.compete_for_cpu(sys, clock)
            }
        }
    }

    fn terminate(&mut self, sys: &mut System, clock: &mut Clock) -> Result<()> {
        for pid in sys.memory.release(self.process.memory_demand) {
            clock.wake_now(Wakeup::Resume(pid));
        }
        self.process.completion_time = Some(clock.now());
        self.enter(ProcessState::Terminated, sys, clock);
        self.phase = Phase::Done;

        if let Some(sojourn) = self.process.sojourn_time() {
            sys.collector.on_terminated(sojourn);
        }
        Ok(())
    }

    fn enter(&mut self, state: ProcessState, sys: &mut System, clock: &Clock) {
        let from = self.process.state;
        self.process.state = state;
        debug!(time = %clock.now(), pid = self.pid(), %from, to = %state, "transition");
        sys.collector
            .on_transition(clock.now(), Some(from), state, sys.memory.level());
    }
}
