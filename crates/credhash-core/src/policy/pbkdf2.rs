//! PBKDF2-HMAC-SHA256 cost policy.

use std::fmt;

use derive_builder::Builder;
use serde::Serialize;

use crate::{Error, Result, TRACING_TARGET_POLICY};

/// Default values for configuration options.
mod defaults {
    /// Default iteration count (OWASP 2023 guidance for HMAC-SHA256).
    pub const ITERATIONS: u32 = 600_000;
    /// Default derived key length in bytes.
    pub const HASH_LENGTH: usize = 32;
    /// Default salt length in bytes.
    pub const SALT_LENGTH: usize = 16;
}

/// Lowest accepted iteration count.
pub const PBKDF2_MIN_ITERATIONS: u32 = 1_000;
/// Iteration count below which construction logs an advisory.
pub const PBKDF2_RECOMMENDED_ITERATIONS: u32 = 600_000;
/// Largest accepted iteration count, for policies and stored hashes alike.
pub const PBKDF2_MAX_ITERATIONS: u32 = 10_000_000;

/// Shortest accepted derived key in bytes.
pub const PBKDF2_MIN_HASH_LENGTH: usize = 16;
/// Longest accepted derived key in bytes.
pub const PBKDF2_MAX_HASH_LENGTH: usize = 64;

/// Shortest accepted salt in bytes.
pub const PBKDF2_MIN_SALT_LENGTH: usize = 16;
/// Longest accepted salt in bytes.
pub const PBKDF2_MAX_SALT_LENGTH: usize = 64;

/// PBKDF2-HMAC-SHA256 hashing configuration.
#[derive(Clone, PartialEq, Eq, Serialize, Builder)]
#[builder(
    pattern = "owned",
    setter(prefix = "with"),
    build_fn(private, name = "build_unchecked")
)]
pub struct Pbkdf2Policy {
    /// Number of HMAC iterations.
    #[builder(default = "defaults::ITERATIONS")]
    iterations: u32,

    /// Derived key length in bytes.
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

impl Pbkdf2Policy {
    /// Creates a new policy builder.
    pub fn builder() -> Pbkdf2PolicyBuilder {
        Pbkdf2PolicyBuilder::default()
    }

    /// Creates a policy with the given iteration count and default lengths.
    pub fn new(iterations: u32) -> Result<Self> {
        Self::builder().with_iterations(iterations).build()
    }

    /// Returns the number of HMAC iterations.
    #[inline]
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Returns the derived key length in bytes.
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

    fn validate(&self) -> Result<()> {
        let invalid = |message: String| Err(Error::invalid_policy_config().with_message(message));

        if !(PBKDF2_MIN_ITERATIONS..=PBKDF2_MAX_ITERATIONS).contains(&self.iterations) {
            return invalid(format!(
                "pbkdf2 iterations must be between {PBKDF2_MIN_ITERATIONS} and {PBKDF2_MAX_ITERATIONS}"
            ));
        }

        if !(PBKDF2_MIN_HASH_LENGTH..=PBKDF2_MAX_HASH_LENGTH).contains(&self.hash_length) {
            return invalid(format!(
                "pbkdf2 hash_length must be between {PBKDF2_MIN_HASH_LENGTH} and {PBKDF2_MAX_HASH_LENGTH} bytes"
            ));
        }

        if !(PBKDF2_MIN_SALT_LENGTH..=PBKDF2_MAX_SALT_LENGTH).contains(&self.salt_length) {
            return invalid(format!(
                "pbkdf2 salt_length must be between {PBKDF2_MIN_SALT_LENGTH} and {PBKDF2_MAX_SALT_LENGTH} bytes"
            ));
        }

        if self.pepper.as_deref().is_some_and(str::is_empty) {
            return invalid("pbkdf2 pepper must not be empty when provided".to_string());
        }

        Ok(())
    }

    /// Returns whether the iteration count is below current guidance.
    pub fn is_below_recommended(&self) -> bool {
        self.iterations < PBKDF2_RECOMMENDED_ITERATIONS
    }
}

impl Pbkdf2PolicyBuilder {
    /// Builds and validates the policy.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidPolicyConfig` error if any hard invariant is violated.
    pub fn build(self) -> Result<Pbkdf2Policy> {
        let policy = self.build_unchecked().map_err(|e| {
            Error::invalid_policy_config()
                .with_message("incomplete pbkdf2 policy")
                .with_source(e)
        })?;
        policy.validate()?;

        if policy.is_below_recommended() {
            tracing::warn!(
                target: TRACING_TARGET_POLICY,
                iterations = policy.iterations,
                recommended = PBKDF2_RECOMMENDED_ITERATIONS,
                "pbkdf2 iteration count below recommended minimum"
            );
        }

        Ok(policy)
    }
}

impl Default for Pbkdf2Policy {
    fn default() -> Self {
        Self {
            iterations: defaults::ITERATIONS,
            hash_length: defaults::HASH_LENGTH,
            salt_length: defaults::SALT_LENGTH,
            pepper: None,
        }
    }
}

impl fmt::Debug for Pbkdf2Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pbkdf2Policy")
            .field("iterations", &self.iterations)
            .field("hash_length", &self.hash_length)
            .field("salt_length", &self.salt_length)
            .field("pepper", &self.pepper.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}
