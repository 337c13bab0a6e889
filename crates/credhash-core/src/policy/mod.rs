//! Validated configuration values for password strength and hashing cost.
//!
//! All policies are immutable once constructed. Hard invariants are checked
//! at construction and fail with [`ErrorKind::InvalidPolicyConfig`], while
//! advisory thresholds are logged and never fatal.
//!
//! [`ErrorKind::InvalidPolicyConfig`]: crate::ErrorKind::InvalidPolicyConfig

mod argon2;
mod password;
mod pbkdf2;

pub use self::argon2::*;
pub use self::password::*;
pub use self::pbkdf2::*;

/// Cost policy handed to an algorithm constructor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AlgorithmPolicy {
    /// Argon2id cost parameters.
    Argon2(Argon2Policy),
    /// PBKDF2-HMAC-SHA256 cost parameters.
    Pbkdf2(Pbkdf2Policy),
    /// No explicit policy; the algorithm uses its own defaults.
    #[default]
    Unspecified,
}

impl AlgorithmPolicy {
    /// Returns a short name for the policy family, used in error messages.
    pub fn family(&self) -> &'static str {
        match self {
            Self::Argon2(_) => "argon2",
            Self::Pbkdf2(_) => "pbkdf2",
            Self::Unspecified => "unspecified",
        }
    }
}

impl From<Argon2Policy> for AlgorithmPolicy {
    fn from(policy: Argon2Policy) -> Self {
        Self::Argon2(policy)
    }
}

impl From<Pbkdf2Policy> for AlgorithmPolicy {
    fn from(policy: Pbkdf2Policy) -> Self {
        Self::Pbkdf2(policy)
    }
}
