use std::fmt::Write as _;
use std::time::Duration;

use serde::{Serialize, Serializer};
use strum::{AsRefStr, Display};

use crate::config::keys;
use crate::policy::Argon2Policy;
use crate::{Error, Result};

/// Serializes a duration as fractional milliseconds.
pub(crate) fn serialize_millis<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_f64(duration.as_nanos() as f64 / 1_000_000.0)
}

/// One measured candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Trial {
    /// Time cost that was measured.
    pub time_cost: u32,
    /// Median hash duration.
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
}

/// How a calibration run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Display, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CalibrationOutcome {
    /// A candidate landed within tolerance of the target.
    Converged,
    /// The bracket closed or trials ran out; the closest candidate is reported.
    BestEffort,
    /// Even time cost 1 exceeds the target; the minimum is reported.
    MinimumExceedsTarget,
}

/// Result of a calibration run.
///
/// Meant to be transcribed into configuration by an operator, never applied
/// automatically.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalibrationReport {
    /// Chosen time cost.
    pub time_cost: u32,
    /// Fixed memory cost in KiB.
    pub memory_cost: u32,
    /// Fixed number of lanes.
    pub parallelism: u32,
    /// Median duration measured for the chosen time cost.
    #[serde(rename = "measured_ms", serialize_with = "serialize_millis")]
    pub measured: Duration,
    /// Target duration.
    #[serde(rename = "target_ms", serialize_with = "serialize_millis")]
    pub target: Duration,
    /// Accepted relative deviation.
    pub tolerance: f64,
    /// How the search ended.
    pub outcome: CalibrationOutcome,
    /// Every measured candidate, in order.
    pub trials: Vec<Trial>,
}

impl CalibrationReport {
    /// Returns whether the chosen candidate lies within tolerance.
    pub fn is_within_tolerance(&self) -> bool {
        let target = self.target.as_secs_f64();
        (self.measured.as_secs_f64() - target).abs() <= target * self.tolerance
    }

    /// Renders the chosen parameters as configuration lines.
    pub fn to_env_lines(&self) -> String {
        let mut lines = String::new();
        let _ = writeln!(lines, "{}={}", keys::ARGON2_TIME_COST, self.time_cost);
        let _ = writeln!(lines, "{}={}", keys::ARGON2_MEMORY_COST, self.memory_cost);
        let _ = writeln!(lines, "{}={}", keys::ARGON2_PARALLELISM, self.parallelism);
        lines
    }

    /// Renders the report as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            Error::calibration()
                .with_message("failed to serialize calibration report")
                .with_source(e)
        })
    }

    /// Builds an Argon2 policy from the chosen parameters.
    pub fn to_policy(&self) -> Result<Argon2Policy> {
        Argon2Policy::new(self.time_cost, self.memory_cost, self.parallelism)
    }
}
