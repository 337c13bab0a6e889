#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod commands;
mod config;
mod telemetry;

use std::process;

use crate::commands::Outcome;
use crate::config::Cli;

// Tracing target constants
pub const TRACING_TARGET_COMMAND: &str = "credhash_cli::command";
pub const TRACING_TARGET_CONFIG: &str = "credhash_cli::config";

/// Exit code for errors, distinct from a rejected password.
const EXIT_FAILURE: i32 = 2;

fn main() {
    let error = match run() {
        Ok(outcome) => process::exit(outcome.exit_code()),
        Err(error) => error,
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_COMMAND,
            error = %format!("{error:#}"),
            "command failed"
        );
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(EXIT_FAILURE);
}

/// Main application entry point.
fn run() -> anyhow::Result<Outcome> {
    let cli = Cli::init();

    telemetry::init_tracing(cli.log_json)?;
    cli.log();

    commands::run(&cli.command)
}
