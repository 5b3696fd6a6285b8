use std::fmt;

use parse_display::Display;
use serde::{Deserialize, Serialize};

use crate::types::{Duration, Time};

/// Process id, unique within one simulation run, starting at 1
pub type Pid = usize;

/// Lifecycle states of a process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[display(style = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProcessState {
    New,
    Ready,
    Running,
    Waiting,
    Terminated,
}

impl ProcessState {
    pub const ALL: [ProcessState; 5] = [
        ProcessState::New,
        ProcessState::Ready,
        ProcessState::Running,
        ProcessState::Waiting,
        ProcessState::Terminated,
    ];
}

/// A simulated process.
///
/// `memory_demand` is fixed at creation and held from admission to termination.
/// `remaining_instructions` only goes down, one slice at a time, and never below zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Process {
    pub id: Pid,
    pub memory_demand: u32,
    pub remaining_instructions: u32,
    pub state: ProcessState,
    pub arrival_time: Time,
    pub completion_time: Option<Time>,
}

impl Process {
    pub fn new(id: Pid, arrival_time: Time, memory_demand: u32, instructions: u32) -> Self {
        Self {
            id,
            memory_demand,
            remaining_instructions: instructions,
            state: ProcessState::New,
            arrival_time,
            completion_time: None,
        }
    }

    /// Run one slice at `per_unit` instructions, floored at zero
    pub fn execute(&mut self, per_unit: u32) {
        self.remaining_instructions = self.remaining_instructions.saturating_sub(per_unit);
    }

    pub fn is_finished(&self) -> bool {
        self.remaining_instructions == 0
    }

    pub fn is_terminated(&self) -> bool {
        self.state == ProcessState::Terminated
    }

    /// Time spent in the system, only known once terminated
    pub fn sojourn_time(&self) -> Option<Duration> {
        self.completion_time.map(|done| done - self.arrival_time)
    }
}

impl fmt::Display for Process {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Process({}, {}, mem {}, inst {}, @{:.2})",
            self.id, self.state, self.memory_demand, self.remaining_instructions, self.arrival_time
        )
    }
}
