//! Canopy CLI Binary

use anyhow::Context;
use canopy::logging::init_logging;
use canopy::tooling::cli::{Cli, CliContext};
use clap::Parser;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let context = CliContext::new(cli.workspace.clone(), cli.config.clone(), cli.family)
        .context("Error initializing workspace")?;

    let mut logging = context.config().logging.clone();
    if let Some(level) = &cli.log_level {
        logging.level = level.clone();
    }
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    init_logging(&logging, Some(&cli.workspace))?;

    let output = context.execute(&cli.command)?;
    println!("{}", output);
    Ok(())
}
