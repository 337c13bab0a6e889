use std::sync::Arc;

use rand::Rng;
use rand::distr::Alphanumeric;

use super::PasswordHashAlgorithm;
use crate::policy::AlgorithmPolicy;
use crate::registry::HasherRegistry;
use crate::{Result, TRACING_TARGET_HASHER};

/// Resolved password hasher.
///
/// Wraps the algorithm selected by name from a [`HasherRegistry`] and exposes
/// the hashing contract uniformly, regardless of which algorithm backs it.
/// Cheap to clone and safe to share across threads.
#[derive(Debug, Clone)]
pub struct Hasher {
    variant: String,
    inner: Arc<dyn PasswordHashAlgorithm>,
}

impl Hasher {
    /// Resolves `variant` in the registry and constructs it with `policy`.
    ///
    /// # Errors
    ///
    /// Returns an `UnknownAlgorithm` error if the variant is not registered,
    /// or whatever error the algorithm constructor reports for the policy.
    pub fn new(
        registry: &HasherRegistry,
        variant: &str,
        policy: impl Into<AlgorithmPolicy>,
    ) -> Result<Self> {
        let constructor = registry.resolve(variant)?;
        let inner = constructor(policy.into())?;

        tracing::debug!(
            target: TRACING_TARGET_HASHER,
            variant = %variant,
            algorithm = inner.name(),
            "password hasher resolved"
        );

        Ok(Self {
            variant: variant.trim().to_lowercase(),
            inner,
        })
    }

    /// Returns the variant name this hasher was resolved from.
    #[inline]
    pub fn variant(&self) -> &str {
        &self.variant
    }

    /// Returns the underlying algorithm.
    #[inline]
    pub fn algorithm(&self) -> &Arc<dyn PasswordHashAlgorithm> {
        &self.inner
    }

    /// Hashes a password with a fresh random salt.
    pub fn hash(&self, password: &str) -> Result<String> {
        self.inner.hash(password)
    }

    /// Verifies a password against an encoded hash.
    pub fn verify(&self, encoded: &str, password: &str) -> Result<bool> {
        self.inner.verify(encoded, password)
    }

    /// Returns whether an encoded hash should be upgraded to the active policy.
    pub fn needs_rehash(&self, encoded: &str) -> Result<bool> {
        self.inner.needs_rehash(encoded)
    }

    /// Performs a dummy verification to keep timing consistent.
    ///
    /// Used when an account does not exist, so that login latency does not
    /// reveal which accounts exist. Hashes a random throwaway password and
    /// verifies `password` against it. Always returns `false`.
    pub fn verify_dummy(&self, password: &str) -> bool {
        let mut rng = rand::rng();
        let length = rng.random_range(16..32);
        let dummy: String = (0..length)
            .map(|_| rng.sample(Alphanumeric) as char)
            .collect();

        if let Ok(dummy_hash) = self.inner.hash(&dummy) {
            let _ = self.inner.verify(&dummy_hash, password);
        }

        false
    }
}
