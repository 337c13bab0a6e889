//! The password hashing contract and its resolver.
//!
//! Application code depends on [`Hasher`] only; concrete algorithms implement
//! [`PasswordHashAlgorithm`] and are made available through a
//! [`HasherRegistry`](crate::registry::HasherRegistry).

use std::fmt;

use crate::Result;

mod resolver;

pub use resolver::Hasher;

/// Capability contract every hashing algorithm provides.
///
/// Implementations are immutable after construction and are shared across
/// threads behind an `Arc`. Both `hash` and `verify` block the caller for the
/// configured cost.
pub trait PasswordHashAlgorithm: Send + Sync + fmt::Debug {
    /// Returns the registry name of this algorithm.
    fn name(&self) -> &'static str;

    /// Hashes a password with a fresh random salt.
    ///
    /// The returned string is self-describing: it embeds the algorithm
    /// identifier, the cost parameters and the salt, never the pepper.
    ///
    /// # Errors
    ///
    /// Returns a `HashingError` for an empty password or when the underlying
    /// primitive fails.
    fn hash(&self, password: &str) -> Result<String>;

    /// Verifies a password against an encoded hash.
    ///
    /// Only the parameters embedded in `encoded` are used, so hashes remain
    /// verifiable after the active policy changes.
    ///
    /// # Errors
    ///
    /// Returns a `HashingError` when `encoded` is malformed or was produced by
    /// another algorithm. A wrong password is `Ok(false)`.
    fn verify(&self, encoded: &str, password: &str) -> Result<bool>;

    /// Returns whether an encoded hash was produced under different
    /// parameters than the active policy.
    ///
    /// # Errors
    ///
    /// Returns a `HashingError` when `encoded` is malformed or was produced by
    /// another algorithm.
    fn needs_rehash(&self, encoded: &str) -> Result<bool>;
}
