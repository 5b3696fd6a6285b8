use structopt::StructOpt;

use ossim::utils;
use ossim::utils::prelude::*;

mod cli;
mod commands;

fn main() -> Result<()> {
    // panic setup should be done early
    utils::panic::setup();

    // initialize Configuration: defaults, environment, then file and preset
    utils::app_config::setup()?;
    let cli = cli::Cli::from_args();
    cli.merge_config()?;

    // logging is configured from the merged config
    let _guard = utils::logging::setup(cli.produces_output())?;

    trace!("Start cli execution");
    cli.execute()
}
