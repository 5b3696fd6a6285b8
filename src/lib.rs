//! Discrete-event simulation of process scheduling on a single machine.
//!
//! Processes arrive at random, wait for memory, take turns on the CPUs one
//! slice at a time, sometimes block on I/O, and finally terminate. A run
//! reports the mean and spread of their sojourn times, and optionally a trace
//! of system occupancy after every state transition.

mod config;
pub mod experiment;
pub mod output;
pub mod process;
pub mod sim;
mod simulator;
pub mod stats;
pub mod types;
pub mod utils;
pub mod workload;

pub use crate::experiment::{
    run_all_experiments, run_experiment, ExperimentConfig, ExperimentResult, Outcome, RunSummary, Strategy, Sweep,
    SweepResults,
};
pub use crate::utils::prelude::{Error, Result};
