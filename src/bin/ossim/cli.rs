use std::path::PathBuf;

use structopt::clap::AppSettings;
use structopt::StructOpt;

use ossim::utils::prelude::*;

use crate::commands::{self, Cmd};

/// Simulate process scheduling on a single machine
#[derive(StructOpt, Debug)]
#[structopt(name = "ossim", global_settings = &[AppSettings::VersionlessSubcommands])]
pub struct Cli {
    /// Set a custom config file
    #[structopt(short, long, parse(from_os_str), value_name = "FILE")]
    config: Option<PathBuf>,

    /// Apply a preset from the `presets` config section
    #[structopt(short, long, value_name = "NAME")]
    preset: Option<String>,

    #[structopt(subcommand)]
    cmd: Command,
}

#[derive(StructOpt, Debug)]
pub enum Command {
    Config(commands::Config),
    Run(commands::Run),
    Sweep(commands::Sweep),
}

impl Cli {
    /// Merge the config file then the preset, on top of defaults and environment
    pub fn merge_config(&self) -> Result<()> {
        let mut cfg = config_mut();
        if let Some(path) = &self.config {
            cfg.use_file(path)?;
        }
        if let Some(name) = &self.preset {
            cfg.use_preset(name)?;
        }
        Ok(())
    }

    pub fn produces_output(&self) -> bool {
        match &self.cmd {
            Command::Config(_) | Command::Run(_) => true,
            Command::Sweep(cmd) => !cmd.quiet,
        }
    }

    /// Match commands
    pub fn execute(self) -> Result<()> {
        trace!(cmd = ?self.cmd, "executing");
        match self.cmd {
            Command::Config(cmd) => cmd.run(),
            Command::Run(cmd) => cmd.run(),
            Command::Sweep(cmd) => cmd.run(),
        }
    }
}
