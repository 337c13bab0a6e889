//! CLI configuration management.
//!
//! This module defines the complete CLI configuration hierarchy:
//!
//! ```text
//! Cli
//! ├── log_json: bool
//! └── command: Command
//!     ├── calibrate: CalibrateArgs   # Target latency, profile, search limits
//!     ├── bench: BenchArgs           # Loops, profiles
//!     ├── hash: SecurityConfig       # Variant, cost and pepper settings
//!     ├── verify: VerifyArgs         # Encoded hash + SecurityConfig
//!     └── check: SecurityConfig      # Password strength rules
//! ```
//!
//! All configuration can be provided via CLI arguments or environment variables.
//! Use `--help` to see all available options.
//!
//! # Example
//!
//! ```bash
//! # Calibrate the balanced profile to 250ms
//! credhash calibrate --target-ms 250 --profile balanced
//!
//! # Or via environment variables
//! CALIBRATE_TARGET_MS=500 credhash calibrate
//! ```

mod command;

use std::process;

use clap::Parser;
pub use command::{BenchArgs, CalibrateArgs, Command};

use crate::TRACING_TARGET_CONFIG;

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "credhash")]
#[command(about = "Password hashing, verification and cost calibration")]
#[command(version)]
pub struct Cli {
    /// Emit logs as JSON lines instead of human readable text.
    #[arg(long, global = true, env = "LOG_JSON")]
    pub log_json: bool,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Loads environment variables from .env file (if enabled) and parses CLI arguments.
    ///
    /// This is the preferred way to initialize the CLI configuration as it ensures
    /// .env files are loaded before clap parses arguments, allowing environment
    /// variables from .env to be used as defaults.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    /// Loads environment variables from .env file if the dotenv feature is enabled.
    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    /// No-op when dotenv feature is disabled.
    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Logs build information and the selected command (no sensitive information).
    pub fn log(&self) {
        tracing::debug!(
            target: TRACING_TARGET_CONFIG,
            version = env!("CARGO_PKG_VERSION"),
            pid = process::id(),
            arch = std::env::consts::ARCH,
            os = std::env::consts::OS,
            features = ?Self::enabled_features(),
            "build information"
        );

        tracing::debug!(
            target: TRACING_TARGET_CONFIG,
            command = self.command.name(),
            "command selected"
        );
    }

    /// Returns a list of enabled compile-time features.
    fn enabled_features() -> Vec<&'static str> {
        [cfg!(feature = "dotenv").then_some("dotenv")]
            .into_iter()
            .flatten()
            .collect()
    }
}
