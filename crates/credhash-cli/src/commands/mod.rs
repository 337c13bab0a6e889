//! Subcommand implementations.
//!
//! Results go to stdout, diagnostics go through `tracing` to stderr.

mod bench;
mod calibrate;
mod credential;

use std::io::{self, BufRead};

use anyhow::Context;

use crate::config::Command;

/// Result of a subcommand that completed without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The command did what was asked.
    Success,
    /// The password did not match or did not meet the policy.
    Rejected,
}

impl Outcome {
    /// Process exit code for this outcome.
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::Rejected => 1,
        }
    }
}

/// Runs the selected subcommand.
pub fn run(command: &Command) -> anyhow::Result<Outcome> {
    let mut input = io::stdin().lock();
    let mut out = io::stdout().lock();

    match command {
        Command::Calibrate(args) => calibrate::run(args, &mut out),
        Command::Bench(args) => bench::run(args, &mut out),
        Command::Hash(security) => credential::hash(security, &mut input, &mut out),
        Command::Verify(args) => {
            credential::verify(&args.security, &args.encoded, &mut input, &mut out)
        }
        Command::Check(security) => credential::check(security, &mut input, &mut out),
    }
}

/// Reads one password line, without its line terminator.
fn read_password(reader: &mut impl BufRead) -> anyhow::Result<String> {
    let mut line = String::new();
    let read = reader
        .read_line(&mut line)
        .context("failed to read password from stdin")?;
    if read == 0 {
        anyhow::bail!("no password provided on stdin");
    }

    let trimmed = line.strip_suffix('\n').unwrap_or(&line);
    let trimmed = trimmed.strip_suffix('\r').unwrap_or(trimmed);
    Ok(trimmed.to_owned())
}
