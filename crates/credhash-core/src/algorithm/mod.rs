//! Concrete [`PasswordHashAlgorithm`] implementations.
//!
//! [`PasswordHashAlgorithm`]: crate::hasher::PasswordHashAlgorithm

use std::borrow::Cow;

mod argon2;
mod pbkdf2;

pub use self::argon2::{ARGON2_ALGORITHM_NAME, Argon2Hasher};
pub use self::pbkdf2::{PBKDF2_ALGORITHM_NAME, Pbkdf2Hasher};

/// Appends the pepper to the password, borrowing when there is none.
fn apply_pepper<'a>(password: &'a str, pepper: Option<&str>) -> Cow<'a, str> {
    match pepper {
        Some(pepper) => Cow::Owned(format!("{password}{pepper}")),
        None => Cow::Borrowed(password),
    }
}
