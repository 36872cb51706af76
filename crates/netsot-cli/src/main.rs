//! Main entry point for the netsot command line.
//!
//! Loads configuration, starts logging, imports the inventory snapshot and
//! runs one command against it. Failures are printed to stderr with their
//! error code and exit non-zero.

use std::process::ExitCode;

use clap::Parser;
use tracing::debug;

use netsot_cli::{
    command::{self, Cli},
    model::Configuration,
    startup,
};

fn run(cli: &Cli) -> anyhow::Result<String> {
    // Initialize configuration and logging
    let configuration = Configuration::load(cli.config.as_deref(), &cli.overrides())?;
    let _logging_guard = startup::init_logging(&configuration.logging_config())?;

    let persistence = startup::load_inventory(&configuration)?;
    debug!(command = ?cli.command, "Executing command");

    command::execute(&cli.command, persistence, cli.format)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}", command::error_report(e));
            ExitCode::FAILURE
        }
    }
}
