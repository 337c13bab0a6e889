//! Common error type definitions.

use strum::{AsRefStr, IntoStaticStr};
use thiserror::Error;

/// Type alias for boxed dynamic errors that can be sent across threads.
///
/// Used as the source of a structured [`Error`] so the underlying primitive
/// failure stays inspectable without leaking into the display message.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Type alias for Results with our custom Error type.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Categories of errors that can occur in credhash-core operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// Cost, length or strength parameters are nonsensical.
    ///
    /// Raised at construction time, before any hashing is attempted.
    InvalidPolicyConfig,
    /// A candidate password fails the configured strength rules.
    PolicyViolation,
    /// No algorithm is registered under the requested name.
    UnknownAlgorithm,
    /// An algorithm name was registered twice.
    DuplicateRegistration,
    /// The hashing primitive failed or an encoded hash is malformed.
    HashingError,
    /// The calibration search could not produce a result.
    CalibrationError,
}

impl ErrorKind {
    /// Creates a new [`Error`] of this kind with the given message.
    pub fn with_message(self, message: impl Into<String>) -> Error {
        Error::new(self).with_message(message)
    }
}

/// A structured error type for credhash-core operations.
#[derive(Debug, Error)]
#[error("{kind:?}{}", message.as_ref().map(|m| format!(": {}", m)).unwrap_or_default())]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional error message.
    pub message: Option<String>,
    /// Optional source error.
    #[source]
    pub source: Option<BoxedError>,
}

impl Error {
    /// Creates a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            source: None,
        }
    }

    /// Adds a message to this error.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Adds a source error to this error.
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Creates a new invalid policy configuration error.
    pub fn invalid_policy_config() -> Self {
        Self::new(ErrorKind::InvalidPolicyConfig)
    }

    /// Creates a new policy violation error.
    pub fn policy_violation() -> Self {
        Self::new(ErrorKind::PolicyViolation)
    }

    /// Creates a new unknown algorithm error.
    pub fn unknown_algorithm() -> Self {
        Self::new(ErrorKind::UnknownAlgorithm)
    }

    /// Creates a new duplicate registration error.
    pub fn duplicate_registration() -> Self {
        Self::new(ErrorKind::DuplicateRegistration)
    }

    /// Creates a new hashing error.
    pub fn hashing() -> Self {
        Self::new(ErrorKind::HashingError)
    }

    /// Creates a new calibration error.
    pub fn calibration() -> Self {
        Self::new(ErrorKind::CalibrationError)
    }

    /// Returns the error kind.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the error kind as a string.
    pub fn kind_str(&self) -> &'static str {
        self.kind.into()
    }

    /// Returns whether the caller can recover from this error.
    ///
    /// Only strength-rule violations are recoverable: the end user can pick
    /// another password. Everything else is fatal to the operation that
    /// raised it.
    pub fn is_recoverable(&self) -> bool {
        matches!(self.kind, ErrorKind::PolicyViolation)
    }

    /// Returns whether the message is safe to show to an end user.
    pub fn is_user_facing(&self) -> bool {
        self.is_recoverable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_kind_and_message() {
        let error = Error::policy_violation().with_message("too short");
        assert_eq!(error.to_string(), "PolicyViolation: too short");
    }

    #[test]
    fn display_without_message() {
        let error = Error::unknown_algorithm();
        assert_eq!(error.to_string(), "UnknownAlgorithm");
        assert_eq!(error.kind_str(), "unknown_algorithm");
    }

    #[test]
    fn source_is_preserved() {
        let io = std::io::Error::other("allocation failed");
        let error = Error::hashing().with_source(io);
        let source = std::error::Error::source(&error);
        assert!(source.is_some_and(|s| s.to_string() == "allocation failed"));
    }

    #[test]
    fn only_policy_violations_are_recoverable() {
        assert!(Error::policy_violation().is_recoverable());
        assert!(Error::policy_violation().is_user_facing());
        assert!(!Error::hashing().is_recoverable());
        assert!(!Error::invalid_policy_config().is_recoverable());
        assert!(!Error::calibration().is_user_facing());
    }

    #[test]
    fn kind_with_message_builds_error() {
        let error = ErrorKind::CalibrationError.with_message("no bracket");
        assert_eq!(error.kind(), ErrorKind::CalibrationError);
        assert_eq!(error.message.as_deref(), Some("no bracket"));
    }
}
