//! Subcommand definitions.

use clap::{Args, Subcommand};
use credhash_core::calibrate::{BENCHMARK_DEFAULT_LOOPS, CostProfile};
use credhash_core::config::SecurityConfig;

/// Subcommands supported by the `credhash` binary.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Searches the Argon2 time cost that hashes in the target duration.
    Calibrate(CalibrateArgs),
    /// Measures hash and verify latency of the named cost profiles.
    Bench(BenchArgs),
    /// Reads a password from stdin and prints its encoded hash.
    Hash(SecurityConfig),
    /// Reads a password from stdin and checks it against an encoded hash.
    Verify(VerifyArgs),
    /// Reads a password from stdin and checks it against the password policy.
    Check(SecurityConfig),
}

impl Command {
    /// Returns the subcommand name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Calibrate(_) => "calibrate",
            Self::Bench(_) => "bench",
            Self::Hash(_) => "hash",
            Self::Verify(_) => "verify",
            Self::Check(_) => "check",
        }
    }
}

/// Options of the `calibrate` subcommand.
#[derive(Debug, Clone, Args)]
pub struct CalibrateArgs {
    /// Target hash duration in milliseconds.
    #[arg(long, env = "CALIBRATE_TARGET_MS", default_value_t = 250)]
    pub target_ms: u64,

    /// Cost profile providing the seed time cost, memory cost and parallelism.
    #[arg(long, env = "CALIBRATE_PROFILE", default_value_t = CostProfile::Balanced)]
    pub profile: CostProfile,

    /// Accepted relative deviation from the target.
    #[arg(long, env = "CALIBRATE_TOLERANCE", default_value_t = 0.15)]
    pub tolerance: f64,

    /// Measurements per candidate (median is used).
    #[arg(long, env = "CALIBRATE_SAMPLES", default_value_t = 3)]
    pub samples: usize,

    /// Highest time cost the search may try.
    #[arg(long, env = "CALIBRATE_MAX_TIME_COST", default_value_t = 64)]
    pub max_time_cost: u32,

    /// Maximum number of candidates to measure.
    #[arg(long, env = "CALIBRATE_MAX_TRIALS", default_value_t = 24)]
    pub max_trials: usize,

    /// Print the report as JSON instead of environment lines.
    #[arg(long)]
    pub json: bool,
}

/// Options of the `bench` subcommand.
#[derive(Debug, Clone, Args)]
pub struct BenchArgs {
    /// Hash and verify calls per profile.
    #[arg(long, env = "BENCH_LOOPS", default_value_t = BENCHMARK_DEFAULT_LOOPS)]
    pub loops: u32,

    /// Profiles to measure (all profiles when omitted).
    #[arg(long, value_delimiter = ',')]
    pub profile: Vec<CostProfile>,

    /// Print the results as JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

/// Options of the `verify` subcommand.
#[derive(Debug, Clone, Args)]
pub struct VerifyArgs {
    /// Encoded hash to verify against.
    #[arg(long = "hash")]
    pub encoded: String,

    /// Hashing configuration.
    #[command(flatten)]
    pub security: SecurityConfig,
}
