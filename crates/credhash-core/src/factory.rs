//! Builds policies and hashers from a [`SecurityConfig`].

use std::sync::Arc;

use crate::algorithm::{ARGON2_ALGORITHM_NAME, PBKDF2_ALGORITHM_NAME};
use crate::config::SecurityConfig;
use crate::hasher::Hasher;
use crate::policy::{AlgorithmPolicy, Argon2Policy, PasswordPolicy, Pbkdf2Policy};
use crate::registry::HasherRegistry;
use crate::{Result, TRACING_TARGET_FACTORY};

/// Resolves configuration into ready-to-use policies and hashers.
///
/// Holds a shared, read-only registry; cheap to clone.
#[derive(Debug, Clone)]
pub struct SecurityFactory {
    registry: Arc<HasherRegistry>,
}

impl SecurityFactory {
    /// Creates a factory over the given registry.
    pub fn new(registry: Arc<HasherRegistry>) -> Self {
        Self { registry }
    }

    /// Returns the underlying registry.
    #[inline]
    pub fn registry(&self) -> &HasherRegistry {
        &self.registry
    }

    /// Builds the Argon2 policy, applying defaults for absent keys.
    pub fn build_argon2_policy(&self, config: &SecurityConfig) -> Result<Argon2Policy> {
        let mut builder = Argon2Policy::builder();

        if let Some(time_cost) = config.argon2_time_cost {
            builder = builder.with_time_cost(time_cost);
        }
        if let Some(memory_cost) = config.argon2_memory_cost {
            builder = builder.with_memory_cost(memory_cost);
        }
        if let Some(parallelism) = config.argon2_parallelism {
            builder = builder.with_parallelism(parallelism);
        }
        if let Some(hash_length) = config.argon2_hash_length {
            builder = builder.with_hash_length(hash_length);
        }
        if let Some(salt_length) = config.argon2_salt_length {
            builder = builder.with_salt_length(salt_length);
        }
        if let Some(pepper) = non_empty(&config.argon2_pepper) {
            builder = builder.with_pepper(pepper);
        }

        builder.build()
    }

    /// Builds the PBKDF2 policy, applying defaults for absent keys.
    pub fn build_pbkdf2_policy(&self, config: &SecurityConfig) -> Result<Pbkdf2Policy> {
        let mut builder = Pbkdf2Policy::builder();

        if let Some(iterations) = config.pbkdf2_iterations {
            builder = builder.with_iterations(iterations);
        }
        if let Some(hash_length) = config.pbkdf2_hash_length {
            builder = builder.with_hash_length(hash_length);
        }
        if let Some(salt_length) = config.pbkdf2_salt_length {
            builder = builder.with_salt_length(salt_length);
        }
        if let Some(pepper) = non_empty(&config.pbkdf2_pepper) {
            builder = builder.with_pepper(pepper);
        }

        builder.build()
    }

    /// Builds the password strength policy, applying defaults for absent keys.
    pub fn build_password_policy(&self, config: &SecurityConfig) -> Result<PasswordPolicy> {
        let defaults = PasswordPolicy::default();

        PasswordPolicy::new(
            config.password_min_length.unwrap_or(defaults.min_length()),
            config
                .password_require_upper
                .unwrap_or(defaults.require_upper()),
            config
                .password_require_lower
                .unwrap_or(defaults.require_lower()),
            config
                .password_require_digit
                .unwrap_or(defaults.require_digit()),
            config
                .password_require_special
                .unwrap_or(defaults.require_special()),
        )
    }

    /// Builds the policy handed to the constructor of the configured variant.
    ///
    /// Variants without a dedicated policy receive
    /// [`AlgorithmPolicy::Unspecified`].
    pub fn build_algorithm_policy(&self, config: &SecurityConfig) -> Result<AlgorithmPolicy> {
        let variant = config.variant().to_lowercase();
        let policy = match variant.as_str() {
            ARGON2_ALGORITHM_NAME => self.build_argon2_policy(config)?.into(),
            PBKDF2_ALGORITHM_NAME => self.build_pbkdf2_policy(config)?.into(),
            _ => AlgorithmPolicy::Unspecified,
        };

        Ok(policy)
    }

    /// Resolves the configured variant into a ready-to-use hasher.
    ///
    /// # Errors
    ///
    /// Returns an `UnknownAlgorithm` error for an unregistered variant, or an
    /// `InvalidPolicyConfig` error when the configured policy is invalid.
    pub fn build_hasher(&self, config: &SecurityConfig) -> Result<Hasher> {
        let variant = config.variant();
        let policy = self.build_algorithm_policy(config)?;
        let hasher = Hasher::new(&self.registry, variant, policy)?;

        tracing::info!(
            target: TRACING_TARGET_FACTORY,
            variant = hasher.variant(),
            "password hasher configured"
        );

        Ok(hasher)
    }
}

impl Default for SecurityFactory {
    fn default() -> Self {
        Self::new(Arc::new(HasherRegistry::with_defaults()))
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_deref().filter(|v| !v.is_empty()).map(str::to_owned)
}
