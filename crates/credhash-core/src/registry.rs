//! Named registry of password hashing algorithms.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::algorithm::{ARGON2_ALGORITHM_NAME, Argon2Hasher, PBKDF2_ALGORITHM_NAME, Pbkdf2Hasher};
use crate::hasher::PasswordHashAlgorithm;
use crate::policy::AlgorithmPolicy;
use crate::{Error, Result, TRACING_TARGET_REGISTRY};

/// Constructor producing a ready-to-use algorithm from a policy.
pub type HasherConstructor =
    Arc<dyn Fn(AlgorithmPolicy) -> Result<Arc<dyn PasswordHashAlgorithm>> + Send + Sync>;

/// Mapping from algorithm name to constructor.
///
/// Names are trimmed and compared case-insensitively. The registry is
/// populated during startup through `&mut self` and afterwards shared
/// read-only, typically behind an `Arc`.
#[derive(Clone, Default)]
pub struct HasherRegistry {
    constructors: HashMap<String, HasherConstructor>,
}

impl HasherRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the built-in `argon2` and `pbkdf2` algorithms.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        let argon2: HasherConstructor = Arc::new(
            |policy: AlgorithmPolicy| -> Result<Arc<dyn PasswordHashAlgorithm>> {
                Ok(Arc::new(Argon2Hasher::from_policy(policy)?))
            },
        );
        let pbkdf2: HasherConstructor = Arc::new(
            |policy: AlgorithmPolicy| -> Result<Arc<dyn PasswordHashAlgorithm>> {
                Ok(Arc::new(Pbkdf2Hasher::from_policy(policy)?))
            },
        );

        registry
            .constructors
            .insert(ARGON2_ALGORITHM_NAME.to_owned(), argon2);
        registry
            .constructors
            .insert(PBKDF2_ALGORITHM_NAME.to_owned(), pbkdf2);

        registry
    }

    /// Normalizes an algorithm name for lookup.
    fn normalize(name: &str) -> String {
        name.trim().to_lowercase()
    }

    /// Registers a constructor under the given name.
    ///
    /// # Errors
    ///
    /// Returns a `DuplicateRegistration` error if the name is already taken,
    /// or an `InvalidPolicyConfig` error if the name is empty.
    pub fn register<F>(&mut self, name: &str, constructor: F) -> Result<()>
    where
        F: Fn(AlgorithmPolicy) -> Result<Arc<dyn PasswordHashAlgorithm>> + Send + Sync + 'static,
    {
        let key = Self::normalize(name);
        if key.is_empty() {
            return Err(
                Error::invalid_policy_config().with_message("algorithm name must not be empty")
            );
        }

        if self.constructors.contains_key(&key) {
            tracing::warn!(
                target: TRACING_TARGET_REGISTRY,
                algorithm = %key,
                "algorithm already registered"
            );

            return Err(Error::duplicate_registration()
                .with_message(format!("algorithm '{key}' is already registered")));
        }

        tracing::debug!(
            target: TRACING_TARGET_REGISTRY,
            algorithm = %key,
            "registered password hashing algorithm"
        );

        self.constructors.insert(key, Arc::new(constructor));
        Ok(())
    }

    /// Looks up the constructor registered under the given name.
    ///
    /// # Errors
    ///
    /// Returns an `UnknownAlgorithm` error if nothing is registered under it.
    pub fn resolve(&self, name: &str) -> Result<HasherConstructor> {
        let key = Self::normalize(name);
        self.constructors.get(&key).cloned().ok_or_else(|| {
            Error::unknown_algorithm().with_message(format!(
                "no password hashing algorithm registered as '{key}' (available: {})",
                self.names().join(", ")
            ))
        })
    }

    /// Returns whether a constructor is registered under the given name.
    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(&Self::normalize(name))
    }

    /// Returns the registered names in sorted order.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.constructors.keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Returns the number of registered algorithms.
    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    /// Returns whether no algorithm is registered.
    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }
}

impl fmt::Debug for HasherRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HasherRegistry")
            .field("names", &self.names())
            .finish()
    }
}
