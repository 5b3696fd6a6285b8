use std::collections::BTreeMap;

use itertools::Itertools;
use parse_display::Display;
use rand_seeder::{Seeder, SipRng};
use serde::{Deserialize, Serialize};

use crate::process::{Process, ProcessState};
use crate::sim::EndCondition;
use crate::simulator::Simulator;
use crate::stats::Snapshot;
use crate::types::Time;
use crate::utils::prelude::*;

pub const DEFAULT_SEED: &str = "42";

/// Population sizes of the standard sweep
pub const PROCESS_COUNTS: [usize; 5] = [25, 50, 100, 150, 200];
/// Mean inter-arrival intervals of the standard sweep, the first one is the baseline
pub const ARRIVAL_INTERVALS: [f64; 3] = [10.0, 5.0, 1.0];

/// Parameters of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub process_count: usize,
    /// Mean gap between two arrivals
    pub arrival_interval: f64,
    pub ram_capacity: u32,
    pub instructions_per_unit: u32,
    pub cpu_count: usize,
    pub include_trace: bool,
    /// Stop after this simulated time, `None` drains every event
    pub time_budget: Option<f64>,
    pub seed: Option<String>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            process_count: 50,
            arrival_interval: 10.0,
            ram_capacity: 100,
            instructions_per_unit: 3,
            cpu_count: 1,
            include_trace: false,
            time_budget: None,
            seed: None,
        }
    }
}

impl ExperimentConfig {
    /// Reject parameters the model has no meaning for
    pub fn validate(&self) -> Result<()> {
        if self.process_count == 0 {
            return Err(Error::invalid_config("process_count must be positive"));
        }
        if !(self.arrival_interval.is_finite() && self.arrival_interval > 0.0) {
            return Err(Error::invalid_config(format!(
                "arrival_interval must be a positive number, got {}",
                self.arrival_interval
            )));
        }
        if self.ram_capacity == 0 {
            return Err(Error::invalid_config("ram_capacity must be positive"));
        }
        if self.instructions_per_unit == 0 {
            return Err(Error::invalid_config("instructions_per_unit must be positive"));
        }
        if self.cpu_count == 0 {
            return Err(Error::invalid_config("cpu_count must be positive"));
        }
        match self.time_budget {
            Some(budget) if !(budget >= 0.0) => Err(Error::invalid_config(format!(
                "time_budget must not be negative, got {}",
                budget
            ))),
            _ => Ok(()),
        }
    }

    pub fn seed(&self) -> &str {
        self.seed.as_deref().unwrap_or(DEFAULT_SEED)
    }

    pub fn with_seed(mut self, seed: impl Into<String>) -> Self {
        self.seed = Some(seed.into());
        self
    }

    /// A fresh random stream for one run
    pub fn rng(&self) -> SipRng {
        Seeder::from(self.seed()).make_rng()
    }

    pub fn end_condition(&self) -> EndCondition {
        match self.time_budget {
            Some(budget) => EndCondition::Time(Time(budget)),
            None => EndCondition::NoEvents,
        }
    }
}

/// How a run came to an end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[display(style = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Every process terminated
    Completed,
    /// Nothing left to happen but some processes never finished
    Stalled,
    /// The time budget cut the run short
    BudgetExceeded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentResult {
    /// Configured population
    pub num_processes: usize,
    pub average_time: f64,
    pub standard_deviation: f64,
    /// Every process that arrived, in the state it last held
    pub processes: Vec<Process>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_series_data: Option<Vec<Snapshot>>,
    pub outcome: Outcome,
    pub end_time: Time,
}

/// Headline numbers of a run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub average_time: f64,
    pub standard_deviation: f64,
    pub processes_completed: usize,
    pub total_processes: usize,
}

impl ExperimentResult {
    pub fn completed(&self) -> usize {
        self.processes
            .iter()
            .filter(|p| p.state == ProcessState::Terminated)
            .count()
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            average_time: self.average_time,
            standard_deviation: self.standard_deviation,
            processes_completed: self.completed(),
            total_processes: self.processes.len(),
        }
    }
}

/// Run one simulation to completion, or to its time budget
#[instrument(skip(cfg), fields(processes = cfg.process_count, interval = cfg.arrival_interval, seed = cfg.seed()))]
pub fn run_experiment(cfg: &ExperimentConfig) -> Result<ExperimentResult> {
    cfg.validate()?;

    let mut sim = Simulator::new(cfg, cfg.rng())?;
    sim.start()?;
    let outcome = sim.run(cfg.end_condition())?;
    Ok(sim.into_result(outcome))
}

/// Single-axis alternatives compared against the baseline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Strategy {
    #[display("ram_200")]
    DoubledMemory,
    #[display("fast_cpu")]
    FastCpu,
    #[display("dual_cpu")]
    DualCpu,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [Strategy::DoubledMemory, Strategy::FastCpu, Strategy::DualCpu];

    /// The base config with this strategy's parameter doubled
    pub fn apply(&self, base: &ExperimentConfig) -> Result<ExperimentConfig> {
        let overflow = |name: &str, value: &dyn std::fmt::Display| {
            Error::invalid_config(format!("{} of {} is too large to double for {}", name, value, self))
        };
        let mut cfg = base.clone();
        match self {
            Strategy::DoubledMemory => {
                cfg.ram_capacity = cfg
                    .ram_capacity
                    .checked_mul(2)
                    .ok_or_else(|| overflow("ram_capacity", &base.ram_capacity))?
            }
            Strategy::FastCpu => {
                cfg.instructions_per_unit = cfg
                    .instructions_per_unit
                    .checked_mul(2)
                    .ok_or_else(|| overflow("instructions_per_unit", &base.instructions_per_unit))?
            }
            Strategy::DualCpu => {
                cfg.cpu_count = cfg
                    .cpu_count
                    .checked_mul(2)
                    .ok_or_else(|| overflow("cpu_count", &base.cpu_count))?
            }
        }
        Ok(cfg)
    }

    /// Chart label, naming the changed parameter's value
    pub fn title(&self, base: &ExperimentConfig) -> Result<String> {
        let cfg = self.apply(base)?;
        Ok(match self {
            Strategy::DoubledMemory => format!("RAM={}", cfg.ram_capacity),
            Strategy::FastCpu => format!("Fast CPU ({} inst)", cfg.instructions_per_unit),
            Strategy::DualCpu => format!("{} CPUs", cfg.cpu_count),
        })
    }
}

pub type SweepResults = BTreeMap<String, Vec<ExperimentResult>>;

/// Independent runs over a grid of parameters.
///
/// Baseline groups cover `process_counts × arrival_intervals` with the base
/// resources; each strategy group covers `process_counts` at the base interval.
#[derive(Debug, Clone)]
pub struct Sweep {
    pub base: ExperimentConfig,
    pub process_counts: Vec<usize>,
    pub arrival_intervals: Vec<f64>,
    pub strategies: Vec<Strategy>,
}

impl Sweep {
    pub fn new(base: ExperimentConfig, process_counts: Vec<usize>, arrival_intervals: Vec<f64>) -> Self {
        Self {
            base,
            process_counts,
            arrival_intervals,
            strategies: Strategy::ALL.to_vec(),
        }
    }

    pub fn standard(base: ExperimentConfig) -> Self {
        Self::new(base, PROCESS_COUNTS.to_vec(), ARRIVAL_INTERVALS.to_vec())
    }

    pub fn interval_key(interval: f64) -> String {
        format!("interval_{}", interval)
    }

    /// Every run of the sweep, tagged by its group, each with a seed of its own.
    ///
    /// Every planned config is validated before any of them runs.
    pub fn plan(&self) -> Result<Vec<(String, ExperimentConfig)>> {
        self.base.validate()?;

        let mut groups = Vec::with_capacity(self.arrival_intervals.len() + self.strategies.len());
        for &interval in &self.arrival_intervals {
            let cfg = ExperimentConfig {
                arrival_interval: interval,
                ..self.base.clone()
            };
            groups.push((Self::interval_key(interval), cfg));
        }
        for strategy in &self.strategies {
            groups.push((strategy.to_string(), strategy.apply(&self.base)?));
        }

        groups
            .iter()
            .cartesian_product(self.process_counts.iter())
            .map(|((group, cfg), &count)| -> Result<(String, ExperimentConfig)> {
                let seed = format!("{}/{}/{}", self.base.seed(), group, count);
                let cfg = ExperimentConfig {
                    process_count: count,
                    ..cfg.clone()
                }
                .with_seed(seed);
                cfg.validate()?;
                Ok((group.clone(), cfg))
            })
            .collect()
    }

    pub fn run(&self) -> Result<SweepResults> {
        let _g = info_span!("sweep", seed = self.base.seed()).entered();

        let plan = self.plan()?;
        info!(runs = plan.len(), "starting sweep");

        let mut results = SweepResults::new();
        for (group, cfg) in plan {
            let result = run_experiment(&cfg)?;
            debug!(%group, processes = cfg.process_count, average = result.average_time, "run done");
            results.entry(group).or_insert_with(Vec::new).push(result);
        }
        Ok(results)
    }
}

/// The standard sweep over the default parameters
pub fn run_all_experiments() -> Result<SweepResults> {
    Sweep::standard(ExperimentConfig::default()).run()
}
