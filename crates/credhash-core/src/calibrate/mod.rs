//! Cost calibration and benchmarking.
//!
//! An offline tool: the [`Calibrator`] searches the Argon2 time cost whose
//! median hashing latency is closest to a target duration, and the
//! [`BenchmarkRunner`] measures hash and verify latency for named
//! [`CostProfile`]s. Reports are meant to be transcribed into configuration
//! by an operator, never applied automatically.
//!
//! Both bypass the registry and factory and build hashers directly.

mod bench;
mod config;
mod probe;
mod profile;
mod report;
mod search;

pub use bench::{BENCHMARK_DEFAULT_LOOPS, BenchmarkResult, BenchmarkRunner};
pub use config::{
    CALIBRATION_DEFAULT_TARGET, CALIBRATION_MAX_SAMPLES, CalibrationConfig,
    CalibrationConfigBuilder,
};
pub use probe::{Argon2Probe, BENCHMARK_PASSWORD, CostProbe};
pub use profile::CostProfile;
pub use report::{CalibrationOutcome, CalibrationReport, Trial};
pub use search::Calibrator;
