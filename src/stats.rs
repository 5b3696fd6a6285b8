use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::process::ProcessState;
use crate::types::{Duration, Time};
use crate::utils::prelude::*;

/// Number of processes in each state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateCounts {
    pub new: usize,
    pub ready: usize,
    pub running: usize,
    pub waiting: usize,
    pub terminated: usize,
}

impl StateCounts {
    pub fn get(&self, state: ProcessState) -> usize {
        match state {
            ProcessState::New => self.new,
            ProcessState::Ready => self.ready,
            ProcessState::Running => self.running,
            ProcessState::Waiting => self.waiting,
            ProcessState::Terminated => self.terminated,
        }
    }

    fn slot(&mut self, state: ProcessState) -> &mut usize {
        match state {
            ProcessState::New => &mut self.new,
            ProcessState::Ready => &mut self.ready,
            ProcessState::Running => &mut self.running,
            ProcessState::Waiting => &mut self.waiting,
            ProcessState::Terminated => &mut self.terminated,
        }
    }

    /// Move one process from `from` (None for a new arrival) to `to`
    pub fn transition(&mut self, from: Option<ProcessState>, to: ProcessState) {
        if let Some(from) = from {
            let slot = self.slot(from);
            assert!(*slot > 0, "no process left in state {}", from);
            *slot -= 1;
        }
        *self.slot(to) += 1;
    }

    pub fn total(&self) -> usize {
        ProcessState::ALL.iter().map(|s| self.get(*s)).sum()
    }
}

/// System occupancy right after a state transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub time: Time,
    /// free memory units
    pub memory_level: u32,
    pub states_count: StateCounts,
}

/// Final aggregates of one run
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub average_time: f64,
    pub standard_deviation: f64,
    pub completed: usize,
    pub time_series: Option<Vec<Snapshot>>,
}

/// Mean and population standard deviation, both 0 for an empty sample
pub fn summarize(samples: &[f64]) -> (f64, f64) {
    match samples.len() {
        0 => (0.0, 0.0),
        1 => (samples[0], 0.0),
        _ => (samples.iter().mean(), samples.iter().population_std_dev()),
    }
}

/// Accumulates sojourn times and, when asked to, occupancy snapshots.
///
/// `finish` consumes the collector, nothing can be recorded after the run is drained.
#[derive(Debug)]
pub struct Collector {
    counts: StateCounts,
    sojourn_times: Vec<f64>,
    trace: Option<Vec<Snapshot>>,
}

impl Collector {
    pub fn new(include_trace: bool) -> Self {
        Self {
            counts: Default::default(),
            sojourn_times: vec![],
            trace: if include_trace { Some(vec![]) } else { None },
        }
    }

    pub fn counts(&self) -> &StateCounts {
        &self.counts
    }

    pub fn on_transition(&mut self, now: Time, from: Option<ProcessState>, to: ProcessState, memory_level: u32) {
        self.counts.transition(from, to);
        if let Some(trace) = self.trace.as_mut() {
            let snapshot = Snapshot {
                time: now,
                memory_level,
                states_count: self.counts,
            };
            trace!(time = %now, memory_level, counts = ?snapshot.states_count, "snapshot");
            trace.push(snapshot);
        }
    }

    pub fn on_terminated(&mut self, sojourn: Duration) {
        debug_assert!(sojourn.0 >= 0.0);
        self.sojourn_times.push(sojourn.0);
    }

    pub fn finish(self) -> Report {
        let (average_time, standard_deviation) = summarize(&self.sojourn_times);
        Report {
            average_time,
            standard_deviation,
            completed: self.sojourn_times.len(),
            time_series: self.trace,
        }
    }
}
