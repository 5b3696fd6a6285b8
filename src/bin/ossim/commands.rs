use std::io;

use itertools::Itertools;
use structopt::StructOpt;

use ossim::output;
use ossim::utils::prelude::*;
use ossim::{run_experiment, ExperimentConfig};

/// Should be implemented by individual subcommand
pub trait Cmd {
    fn run(self) -> Result<()>;
}

/// Show the merged configuration
#[derive(StructOpt, Debug)]
pub struct Config {}

impl Cmd for Config {
    fn run(self) -> Result<()> {
        let merged: serde_yaml::Value = config().fetch()?;
        print!("{}", serde_yaml::to_string(&merged)?);
        Ok(())
    }
}

/// Run a single experiment and print its result as JSON
#[derive(StructOpt, Debug)]
pub struct Run {
    /// Number of processes to simulate
    #[structopt(short = "n", long)]
    process_count: Option<usize>,
    /// Mean time between two arrivals
    #[structopt(short = "i", long)]
    arrival_interval: Option<f64>,
    #[structopt(long)]
    ram_capacity: Option<u32>,
    /// Instructions executed per CPU slice
    #[structopt(long)]
    instructions_per_unit: Option<u32>,
    #[structopt(long)]
    cpu_count: Option<usize>,
    /// Record a snapshot on every state transition
    #[structopt(long)]
    trace: bool,
    /// Stop after this much simulated time
    #[structopt(long)]
    time_budget: Option<f64>,
    #[structopt(long)]
    seed: Option<String>,
    /// Only print the headline statistics
    #[structopt(long)]
    summary: bool,
    /// Also write the result to the output directory
    #[structopt(long)]
    save: bool,
}

impl Run {
    fn experiment_config(&self) -> Result<ExperimentConfig> {
        let mut cfg: ExperimentConfig = config().get("experiment")?;
        if let Some(v) = self.process_count {
            cfg.process_count = v;
        }
        if let Some(v) = self.arrival_interval {
            cfg.arrival_interval = v;
        }
        if let Some(v) = self.ram_capacity {
            cfg.ram_capacity = v;
        }
        if let Some(v) = self.instructions_per_unit {
            cfg.instructions_per_unit = v;
        }
        if let Some(v) = self.cpu_count {
            cfg.cpu_count = v;
        }
        if self.trace {
            cfg.include_trace = true;
        }
        if self.time_budget.is_some() {
            cfg.time_budget = self.time_budget;
        }
        if self.seed.is_some() {
            cfg.seed = self.seed.clone();
        }
        Ok(cfg)
    }
}

impl Cmd for Run {
    fn run(self) -> Result<()> {
        let cfg = self.experiment_config()?;
        debug!(?cfg, "experiment config");

        let result = run_experiment(&cfg)?;
        if self.save {
            output::save_run(&result)?;
        }

        let stdout = io::stdout();
        if self.summary {
            output::write_json(&result.summary(), stdout.lock())
        } else {
            output::write_json(&result, stdout.lock())
        }
    }
}

/// Run the standard sweep and write its results to the output directory
#[derive(StructOpt, Debug)]
pub struct Sweep {
    /// Do not print the per-group overview
    #[structopt(short, long)]
    pub quiet: bool,
}

impl Cmd for Sweep {
    fn run(self) -> Result<()> {
        let base: ExperimentConfig = config().get("experiment")?;
        let sweep = ossim::Sweep::standard(ExperimentConfig {
            include_trace: false,
            time_budget: None,
            ..base
        });

        let results = sweep.run()?;
        output::save_sweep(&sweep, &results)?;

        if !self.quiet {
            for (group, runs) in &results {
                let averages = runs
                    .iter()
                    .map(|r| format!("{}:{:.2}", r.num_processes, r.average_time))
                    .join(" ");
                println!("{:<12} {}", group, averages);
            }
        }
        Ok(())
    }
}
