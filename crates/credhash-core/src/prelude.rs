//! Convenient re-exports for common use.

pub use crate::config::SecurityConfig;
pub use crate::error::{BoxedError, Error, ErrorKind, Result};
pub use crate::factory::SecurityFactory;
pub use crate::hasher::{Hasher, PasswordHashAlgorithm};
pub use crate::policy::{AlgorithmPolicy, Argon2Policy, PasswordPolicy, Pbkdf2Policy};
pub use crate::registry::{HasherConstructor, HasherRegistry};
