//! Argon2id cost policy.
//!
//! Defaults are a reasonable baseline, but every deployment should benchmark
//! and calibrate for its own hardware (see [`crate::calibrate`]).
//!
//! Recommended baseline (OWASP):
//! - time cost tuned to roughly 250ms per hash
//! - memory cost of at least 64 MiB (65536 KiB)
//! - hash length of at least 32 bytes
//! - salt length of at least 16 bytes

use std::fmt;

use derive_builder::Builder;
use serde::Serialize;
use strum::AsRefStr;

use crate::{Error, Result, TRACING_TARGET_POLICY};

/// Default values for configuration options.
mod defaults {
    /// Default number of passes over memory.
    pub const TIME_COST: u32 = 6;
    /// Default memory cost in KiB (100 MiB).
    pub const MEMORY_COST: u32 = 102_400;
    /// Default number of lanes.
    pub const PARALLELISM: u32 = 4;
    /// Default digest length in bytes.
    pub const HASH_LENGTH: usize = 32;
    /// Default salt length in bytes.
    pub const SALT_LENGTH: usize = 16;
}

/// Minimum number of passes accepted by Argon2.
pub const ARGON2_MIN_TIME_COST: u32 = 1;
/// Time cost above which construction logs an advisory.
pub const ARGON2_WARN_TIME_COST: u32 = 20;
/// Largest accepted number of passes, for policies and stored hashes alike.
pub const ARGON2_MAX_TIME_COST: u32 = 1_024;

/// Memory blocks required per lane by Argon2.
pub const ARGON2_BLOCKS_PER_LANE: u32 = 8;
/// Recommended minimum memory cost in KiB (64 MiB).
pub const ARGON2_RECOMMENDED_MEMORY: u32 = 65_536;
/// OWASP baseline memory cost in KiB (128 MiB).
pub const ARGON2_BASELINE_MEMORY: u32 = 131_072;
/// Memory cost in KiB above which construction logs an advisory (1 GiB).
pub const ARGON2_WARN_MEMORY: u32 = 1_048_576;
/// Largest accepted memory cost in KiB (4 GiB).
pub const ARGON2_MAX_MEMORY: u32 = 4_194_304;

/// Minimum number of lanes.
pub const ARGON2_MIN_PARALLELISM: u32 = 1;
/// Lane count above which construction logs an advisory.
pub const ARGON2_WARN_PARALLELISM: u32 = 64;
/// Largest lane count accepted by Argon2.
pub const ARGON2_MAX_PARALLELISM: u32 = 0x00FF_FFFF;

/// Shortest accepted digest in bytes.
pub const ARGON2_MIN_HASH_LENGTH: usize = 16;
/// Digest length below which construction logs an advisory.
pub const ARGON2_WARN_HASH_LENGTH: usize = 32;
/// Longest digest a PHC string can carry.
pub const ARGON2_MAX_HASH_LENGTH: usize = 64;

/// Shortest accepted salt in bytes.
pub const ARGON2_MIN_SALT_LENGTH: usize = 16;
/// Longest salt a PHC string can carry.
pub const ARGON2_MAX_SALT_LENGTH: usize = 48;

/// Pepper length below which construction logs an advisory.
pub const PEPPER_RECOMMENDED_LENGTH: usize = 16;

/// Non-fatal observations about an Argon2 policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum Argon2Advisory {
    /// Memory cost is below 64 MiB.
    MemoryBelowRecommended,
    /// Memory cost is below the 128 MiB OWASP baseline.
    MemoryBelowBaseline,
    /// Memory cost is above 1 GiB.
    MemoryUnusuallyHigh,
    /// Digest is shorter than 32 bytes.
    HashLengthBelowBaseline,
    /// Time cost is above 20 passes.
    TimeCostUnusuallyHigh,
    /// More than 64 lanes.
    ParallelismUnusuallyHigh,
    /// Pepper is shorter than 16 characters.
    PepperTooShort,
}

/// Argon2id hashing configuration.
///
/// Immutable once built and safe to share across threads. Construct through
/// [`Argon2Policy::builder`]; invalid combinations fail at `build()` with an
/// `InvalidPolicyConfig` error, never at hash time.
#[derive(Clone, PartialEq, Eq, Serialize, Builder)]
#[builder(
    pattern = "owned",
    setter(prefix = "with"),
    build_fn(private, name = "build_unchecked")
)]
pub struct Argon2Policy {
    /// Number of passes over memory.
    #[builder(default = "defaults::TIME_COST")]
    time_cost: u32,

    /// Memory cost in KiB.
    #[builder(default = "defaults::MEMORY_COST")]
    memory_cost: u32,

    /// Number of lanes.
    #[builder(default = "defaults::PARALLELISM")]
    parallelism: u32,

    /// Digest length in bytes.
    #[builder(default = "defaults::HASH_LENGTH")]
    hash_length: usize,

    /// Salt length in bytes.
    #[builder(default = "defaults::SALT_LENGTH")]
    salt_length: usize,

    /// Application-wide secret appended to every password.
    #[builder(default, setter(into, strip_option))]
    #[serde(skip)]
    pepper: Option<String>,
}

impl Argon2Policy {
    /// Creates a new policy builder.
    pub fn builder() -> Argon2PolicyBuilder {
        Argon2PolicyBuilder::default()
    }

    /// Creates a policy from the three cost parameters, keeping length defaults.
    pub fn new(time_cost: u32, memory_cost: u32, parallelism: u32) -> Result<Self> {
        Self::builder()
            .with_time_cost(time_cost)
            .with_memory_cost(memory_cost)
            .with_parallelism(parallelism)
            .build()
    }

    /// Returns a builder pre-filled with this policy's values.
    pub fn to_builder(&self) -> Argon2PolicyBuilder {
        let builder = Self::builder()
            .with_time_cost(self.time_cost)
            .with_memory_cost(self.memory_cost)
            .with_parallelism(self.parallelism)
            .with_hash_length(self.hash_length)
            .with_salt_length(self.salt_length);

        match &self.pepper {
            Some(pepper) => builder.with_pepper(pepper.clone()),
            None => builder,
        }
    }

    /// Returns the number of passes over memory.
    #[inline]
    pub fn time_cost(&self) -> u32 {
        self.time_cost
    }

    /// Returns the memory cost in KiB.
    #[inline]
    pub fn memory_cost(&self) -> u32 {
        self.memory_cost
    }

    /// Returns the number of lanes.
    #[inline]
    pub fn parallelism(&self) -> u32 {
        self.parallelism
    }

    /// Returns the digest length in bytes.
    #[inline]
    pub fn hash_length(&self) -> usize {
        self.hash_length
    }

    /// Returns the salt length in bytes.
    #[inline]
    pub fn salt_length(&self) -> usize {
        self.salt_length
    }

    /// Returns the configured pepper, if any.
    #[inline]
    pub fn pepper(&self) -> Option<&str> {
        self.pepper.as_deref()
    }

    /// Checks the hard invariants.
    fn validate(&self) -> Result<()> {
        let invalid = |message: String| Err(Error::invalid_policy_config().with_message(message));

        if !(ARGON2_MIN_TIME_COST..=ARGON2_MAX_TIME_COST).contains(&self.time_cost) {
            return invalid(format!(
                "argon2 time_cost must be between {ARGON2_MIN_TIME_COST} and {ARGON2_MAX_TIME_COST}"
            ));
        }

        if !(ARGON2_MIN_PARALLELISM..=ARGON2_MAX_PARALLELISM).contains(&self.parallelism) {
            return invalid(format!(
                "argon2 parallelism must be between {ARGON2_MIN_PARALLELISM} and {ARGON2_MAX_PARALLELISM}"
            ));
        }

        let memory_floor = ARGON2_BLOCKS_PER_LANE * self.parallelism;
        if self.memory_cost < memory_floor {
            return invalid(format!(
                "argon2 memory_cost must be >= {memory_floor} KiB ({ARGON2_BLOCKS_PER_LANE} x parallelism)"
            ));
        }

        if self.memory_cost > ARGON2_MAX_MEMORY {
            return invalid(format!(
                "argon2 memory_cost must be <= {ARGON2_MAX_MEMORY} KiB"
            ));
        }

        if !(ARGON2_MIN_HASH_LENGTH..=ARGON2_MAX_HASH_LENGTH).contains(&self.hash_length) {
            return invalid(format!(
                "argon2 hash_length must be between {ARGON2_MIN_HASH_LENGTH} and {ARGON2_MAX_HASH_LENGTH} bytes"
            ));
        }

        if !(ARGON2_MIN_SALT_LENGTH..=ARGON2_MAX_SALT_LENGTH).contains(&self.salt_length) {
            return invalid(format!(
                "argon2 salt_length must be between {ARGON2_MIN_SALT_LENGTH} and {ARGON2_MAX_SALT_LENGTH} bytes"
            ));
        }

        if self.pepper.as_deref().is_some_and(str::is_empty) {
            return invalid("argon2 pepper must not be empty when provided".to_string());
        }

        Ok(())
    }

    /// Returns every non-fatal observation about this policy.
    pub fn advisories(&self) -> Vec<Argon2Advisory> {
        let mut advisories = Vec::new();

        if self.memory_cost < ARGON2_RECOMMENDED_MEMORY {
            advisories.push(Argon2Advisory::MemoryBelowRecommended);
        }
        if self.memory_cost < ARGON2_BASELINE_MEMORY {
            advisories.push(Argon2Advisory::MemoryBelowBaseline);
        }
        if self.memory_cost > ARGON2_WARN_MEMORY {
            advisories.push(Argon2Advisory::MemoryUnusuallyHigh);
        }
        if self.hash_length < ARGON2_WARN_HASH_LENGTH {
            advisories.push(Argon2Advisory::HashLengthBelowBaseline);
        }
        if self.time_cost > ARGON2_WARN_TIME_COST {
            advisories.push(Argon2Advisory::TimeCostUnusuallyHigh);
        }
        if self.parallelism > ARGON2_WARN_PARALLELISM {
            advisories.push(Argon2Advisory::ParallelismUnusuallyHigh);
        }
        if self
            .pepper
            .as_deref()
            .is_some_and(|p| p.chars().count() < PEPPER_RECOMMENDED_LENGTH)
        {
            advisories.push(Argon2Advisory::PepperTooShort);
        }

        advisories
    }

    /// Logs advisories for an already validated policy.
    fn log_advisories(&self) {
        for advisory in self.advisories() {
            tracing::warn!(
                target: TRACING_TARGET_POLICY,
                advisory = ?advisory,
                time_cost = self.time_cost,
                memory_cost = self.memory_cost,
                parallelism = self.parallelism,
                hash_length = self.hash_length,
                "argon2 policy advisory"
            );
        }

        if self.pepper.is_none() {
            tracing::info!(
                target: TRACING_TARGET_POLICY,
                "no pepper configured for argon2 (optional, but recommended)"
            );
        }
    }
}

impl Argon2PolicyBuilder {
    /// Builds and validates the policy, logging any advisories.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidPolicyConfig` error if any hard invariant is violated.
    pub fn build(self) -> Result<Argon2Policy> {
        let policy = self.build_quiet()?;
        policy.log_advisories();
        Ok(policy)
    }

    /// Builds and validates the policy without logging advisories.
    ///
    /// Used by the calibrator, which rebuilds the policy for every trial.
    pub(crate) fn build_quiet(self) -> Result<Argon2Policy> {
        let policy = self.build_unchecked().map_err(|e| {
            Error::invalid_policy_config()
                .with_message("incomplete argon2 policy")
                .with_source(e)
        })?;
        policy.validate()?;
        Ok(policy)
    }
}

impl Default for Argon2Policy {
    fn default() -> Self {
        Self {
            time_cost: defaults::TIME_COST,
            memory_cost: defaults::MEMORY_COST,
            parallelism: defaults::PARALLELISM,
            hash_length: defaults::HASH_LENGTH,
            salt_length: defaults::SALT_LENGTH,
            pepper: None,
        }
    }
}

impl fmt::Debug for Argon2Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Argon2Policy")
            .field("time_cost", &self.time_cost)
            .field("memory_cost", &self.memory_cost)
            .field("parallelism", &self.parallelism)
            .field("hash_length", &self.hash_length)
            .field("salt_length", &self.salt_length)
            .field("pepper", &self.pepper.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    fn kind_of(result: Result<Argon2Policy>) -> Option<ErrorKind> {
        result.err().map(|e| e.kind())
    }

    #[test]
    fn owasp_minimum_profile_is_valid() -> anyhow::Result<()> {
        let policy = Argon2Policy::new(2, 19_456, 1)?;
        assert_eq!(policy.time_cost(), 2);
        assert_eq!(policy.memory_cost(), 19_456);
        assert_eq!(policy.parallelism(), 1);
        assert_eq!(policy.hash_length(), 32);
        assert_eq!(policy.salt_length(), 16);
        Ok(())
    }

    #[test]
    fn happy_path_with_pepper() -> anyhow::Result<()> {
        let policy = Argon2Policy::builder()
            .with_time_cost(6)
            .with_memory_cost(65_536)
            .with_parallelism(4)
            .with_pepper("supersecretpepperthatislong")
            .build()?;
        assert_eq!(policy.pepper(), Some("supersecretpepperthatislong"));
        Ok(())
    }

    #[test]
    fn zero_parallelism_is_rejected() {
        let result = Argon2Policy::builder().with_parallelism(0).build();
        assert_eq!(kind_of(result), Some(ErrorKind::InvalidPolicyConfig));
    }

    #[test]
    fn zero_time_cost_is_rejected() {
        let result = Argon2Policy::builder().with_time_cost(0).build();
        assert_eq!(kind_of(result), Some(ErrorKind::InvalidPolicyConfig));
    }

    #[test]
    fn time_cost_above_ceiling_is_rejected() {
        let result = Argon2Policy::new(ARGON2_MAX_TIME_COST + 1, 1_024, 1);
        assert_eq!(kind_of(result), Some(ErrorKind::InvalidPolicyConfig));

        assert!(Argon2Policy::new(ARGON2_MAX_TIME_COST, 1_024, 1).is_ok());
    }

    #[test]
    fn memory_below_lane_floor_is_rejected() {
        let result = Argon2Policy::new(2, 31, 4);
        assert_eq!(kind_of(result), Some(ErrorKind::InvalidPolicyConfig));

        assert!(Argon2Policy::new(2, 32, 4).is_ok());
    }

    #[test]
    fn memory_above_ceiling_is_rejected() {
        let result = Argon2Policy::new(2, ARGON2_MAX_MEMORY + 1, 1);
        assert_eq!(kind_of(result), Some(ErrorKind::InvalidPolicyConfig));
    }

    #[test]
    fn short_hash_and_salt_are_rejected() {
        let hash = Argon2Policy::builder().with_hash_length(8).build();
        assert_eq!(kind_of(hash), Some(ErrorKind::InvalidPolicyConfig));

        let salt = Argon2Policy::builder().with_salt_length(8).build();
        assert_eq!(kind_of(salt), Some(ErrorKind::InvalidPolicyConfig));
    }

    #[test]
    fn oversized_hash_and_salt_are_rejected() {
        let hash = Argon2Policy::builder().with_hash_length(65).build();
        assert_eq!(kind_of(hash), Some(ErrorKind::InvalidPolicyConfig));

        let salt = Argon2Policy::builder().with_salt_length(49).build();
        assert_eq!(kind_of(salt), Some(ErrorKind::InvalidPolicyConfig));
    }

    #[test]
    fn empty_pepper_is_rejected() {
        let result = Argon2Policy::builder().with_pepper("").build();
        assert_eq!(kind_of(result), Some(ErrorKind::InvalidPolicyConfig));
    }

    #[test]
    fn low_memory_is_advisory_not_fatal() -> anyhow::Result<()> {
        let policy = Argon2Policy::new(2, 1_024, 1)?;
        let advisories = policy.advisories();
        assert!(advisories.contains(&Argon2Advisory::MemoryBelowRecommended));
        assert!(advisories.contains(&Argon2Advisory::MemoryBelowBaseline));
        Ok(())
    }

    #[test]
    fn baseline_gap_only_between_64_and_128_mib() -> anyhow::Result<()> {
        let policy = Argon2Policy::new(2, 70_000, 1)?;
        assert_eq!(policy.advisories(), vec![Argon2Advisory::MemoryBelowBaseline]);
        Ok(())
    }

    #[test]
    fn short_pepper_and_high_costs_are_advisories() -> anyhow::Result<()> {
        let policy = Argon2Policy::builder()
            .with_time_cost(21)
            .with_memory_cost(ARGON2_WARN_MEMORY + 1)
            .with_parallelism(65)
            .with_hash_length(16)
            .with_pepper("shortpepper")
            .build()?;

        let advisories = policy.advisories();
        assert!(advisories.contains(&Argon2Advisory::TimeCostUnusuallyHigh));
        assert!(advisories.contains(&Argon2Advisory::MemoryUnusuallyHigh));
        assert!(advisories.contains(&Argon2Advisory::ParallelismUnusuallyHigh));
        assert!(advisories.contains(&Argon2Advisory::HashLengthBelowBaseline));
        assert!(advisories.contains(&Argon2Advisory::PepperTooShort));
        Ok(())
    }

    #[test]
    fn debug_redacts_pepper() -> anyhow::Result<()> {
        let policy = Argon2Policy::builder()
            .with_memory_cost(1_024)
            .with_parallelism(1)
            .with_pepper("do-not-print-this-pepper")
            .build()?;
        let debug = format!("{policy:?}");
        assert!(!debug.contains("do-not-print-this-pepper"));
        assert!(debug.contains("[REDACTED]"));
        Ok(())
    }

    #[test]
    fn to_builder_preserves_values() -> anyhow::Result<()> {
        let policy = Argon2Policy::builder()
            .with_time_cost(3)
            .with_memory_cost(4_096)
            .with_parallelism(2)
            .with_pepper("a-sixteen-char-pepper")
            .build()?;
        let rebuilt = policy.to_builder().with_time_cost(5).build()?;
        assert_eq!(rebuilt.time_cost(), 5);
        assert_eq!(rebuilt.memory_cost(), 4_096);
        assert_eq!(rebuilt.pepper(), policy.pepper());
        Ok(())
    }

    #[test]
    fn default_policy_is_valid() -> anyhow::Result<()> {
        let built = Argon2Policy::builder().build()?;
        assert_eq!(built, Argon2Policy::default());
        Ok(())
    }
}
