use std::time::Duration;

use derive_builder::Builder;

use super::CostProfile;
use crate::policy::Argon2Policy;
use crate::{Error, Result};

/// Default values for calibration options.
mod defaults {
    /// Accepted relative deviation from the target.
    pub const TOLERANCE: f64 = 0.15;
    /// Measurements per candidate.
    pub const SAMPLES: usize = 3;
    /// Starting time cost.
    pub const SEED_TIME_COST: u32 = 2;
    /// Fixed memory cost in KiB (64 MiB).
    pub const MEMORY_COST: u32 = 65_536;
    /// Fixed number of lanes.
    pub const PARALLELISM: u32 = 2;
    /// Largest time cost the search may try.
    pub const MAX_TIME_COST: u32 = 64;
    /// Largest number of candidates the search may measure.
    pub const MAX_TRIALS: usize = 24;
}

/// Upper bound on measurements per candidate.
pub const CALIBRATION_MAX_SAMPLES: usize = 15;

/// Default target latency per hash.
pub const CALIBRATION_DEFAULT_TARGET: Duration = Duration::from_millis(250);

/// Parameters of a calibration run.
///
/// Memory cost and parallelism are held fixed; only the time cost is
/// searched.
#[derive(Debug, Clone, PartialEq, Builder)]
#[builder(
    pattern = "owned",
    setter(prefix = "with"),
    build_fn(private, name = "build_unchecked")
)]
pub struct CalibrationConfig {
    /// Target wall-clock duration of one hash.
    #[builder(default = "CALIBRATION_DEFAULT_TARGET")]
    target: Duration,

    /// Accepted relative deviation from the target, in `(0, 1)`.
    #[builder(default = "defaults::TOLERANCE")]
    tolerance: f64,

    /// Measurements per candidate; the median is used.
    #[builder(default = "defaults::SAMPLES")]
    samples: usize,

    /// Time cost measured first.
    #[builder(default = "defaults::SEED_TIME_COST")]
    seed_time_cost: u32,

    /// Fixed memory cost in KiB.
    #[builder(default = "defaults::MEMORY_COST")]
    memory_cost: u32,

    /// Fixed number of lanes.
    #[builder(default = "defaults::PARALLELISM")]
    parallelism: u32,

    /// Largest time cost the search may try.
    #[builder(default = "defaults::MAX_TIME_COST")]
    max_time_cost: u32,

    /// Largest number of candidates the search may measure.
    #[builder(default = "defaults::MAX_TRIALS")]
    max_trials: usize,
}

impl CalibrationConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> CalibrationConfigBuilder {
        CalibrationConfigBuilder::default()
    }

    /// Returns the target duration.
    #[inline]
    pub fn target(&self) -> Duration {
        self.target
    }

    /// Returns the tolerance fraction.
    #[inline]
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Returns the number of measurements per candidate.
    #[inline]
    pub fn samples(&self) -> usize {
        self.samples
    }

    /// Returns the starting time cost.
    #[inline]
    pub fn seed_time_cost(&self) -> u32 {
        self.seed_time_cost
    }

    /// Returns the fixed memory cost in KiB.
    #[inline]
    pub fn memory_cost(&self) -> u32 {
        self.memory_cost
    }

    /// Returns the fixed number of lanes.
    #[inline]
    pub fn parallelism(&self) -> u32 {
        self.parallelism
    }

    /// Returns the time cost ceiling.
    #[inline]
    pub fn max_time_cost(&self) -> u32 {
        self.max_time_cost
    }

    /// Returns the trial budget.
    #[inline]
    pub fn max_trials(&self) -> usize {
        self.max_trials
    }

    /// Returns whether `measured` lies within tolerance of the target.
    pub fn is_within_tolerance(&self, measured: Duration) -> bool {
        let target = self.target.as_secs_f64();
        (measured.as_secs_f64() - target).abs() <= target * self.tolerance
    }

    fn validate(&self) -> Result<()> {
        let invalid = |message: &str| Err(Error::calibration().with_message(message.to_owned()));

        if self.target.is_zero() {
            return invalid("calibration target must be greater than zero");
        }
        if !(self.tolerance > 0.0 && self.tolerance < 1.0) {
            return invalid("calibration tolerance must be strictly between 0 and 1");
        }
        if !(1..=CALIBRATION_MAX_SAMPLES).contains(&self.samples) {
            return invalid("calibration samples must be between 1 and 15");
        }
        if self.seed_time_cost < 1 {
            return invalid("calibration seed time cost must be at least 1");
        }
        if self.seed_time_cost > self.max_time_cost {
            return invalid("calibration seed time cost exceeds the maximum time cost");
        }
        if self.max_trials < 1 {
            return invalid("calibration trial budget must be at least 1");
        }

        // The fixed memory and lane counts must form a usable policy.
        Argon2Policy::builder()
            .with_time_cost(self.seed_time_cost)
            .with_memory_cost(self.memory_cost)
            .with_parallelism(self.parallelism)
            .build_quiet()
            .map_err(|e| {
                Error::calibration()
                    .with_message("calibration memory cost and parallelism are not a valid argon2 policy")
                    .with_source(e)
            })?;

        Ok(())
    }
}

impl CalibrationConfigBuilder {
    /// Seeds time cost, memory cost and parallelism from a named profile.
    pub fn with_profile(self, profile: CostProfile) -> Self {
        self.with_seed_time_cost(profile.time_cost())
            .with_memory_cost(profile.memory_cost())
            .with_parallelism(profile.parallelism())
    }

    /// Sets the target duration in milliseconds.
    pub fn with_target_ms(self, target_ms: u64) -> Self {
        self.with_target(Duration::from_millis(target_ms))
    }

    /// Builds and validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns a `CalibrationError` if any option is out of range, including
    /// a zero target.
    pub fn build(self) -> Result<CalibrationConfig> {
        let config = self.build_unchecked().map_err(|e| {
            Error::calibration()
                .with_message("incomplete calibration configuration")
                .with_source(e)
        })?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            target: CALIBRATION_DEFAULT_TARGET,
            tolerance: defaults::TOLERANCE,
            samples: defaults::SAMPLES,
            seed_time_cost: defaults::SEED_TIME_COST,
            memory_cost: defaults::MEMORY_COST,
            parallelism: defaults::PARALLELISM,
            max_time_cost: defaults::MAX_TIME_COST,
            max_trials: defaults::MAX_TRIALS,
        }
    }
}
