//! Password strength rules.
//!
//! This module provides the [`PasswordPolicy`] used to reject weak candidate
//! passwords before they ever reach a hasher.

use std::fmt;

use serde::Serialize;
use strum::AsRefStr;

use crate::{Error, Result, TRACING_TARGET_POLICY};

/// Lowest accepted minimum length.
pub const PASSWORD_MIN_LENGTH_FLOOR: usize = 1;

/// Minimum length below which construction logs an advisory.
pub const PASSWORD_MIN_LENGTH_RECOMMENDED: usize = 12;

/// Minimum length above which construction logs an advisory.
pub const PASSWORD_MIN_LENGTH_UNUSUAL: usize = 128;

/// A single strength rule a candidate password failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Serialize)]
#[strum(serialize_all = "snake_case")]
pub enum PasswordViolation {
    /// Fewer characters than the configured minimum.
    TooShort {
        /// Configured minimum length.
        min_length: usize,
        /// Actual length of the candidate.
        actual: usize,
    },
    /// No ASCII uppercase letter.
    MissingUppercase,
    /// No ASCII lowercase letter.
    MissingLowercase,
    /// No ASCII digit.
    MissingDigit,
    /// No character outside `[A-Za-z0-9]`.
    MissingSpecial,
}

impl fmt::Display for PasswordViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooShort { min_length, .. } => {
                write!(f, "password must be at least {min_length} characters long")
            }
            Self::MissingUppercase => f.write_str("password must contain an uppercase letter"),
            Self::MissingLowercase => f.write_str("password must contain a lowercase letter"),
            Self::MissingDigit => f.write_str("password must contain a digit"),
            Self::MissingSpecial => f.write_str("password must contain a special character"),
        }
    }
}

/// Non-fatal observations about a password policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum PasswordPolicyAdvisory {
    /// Minimum length is below [`PASSWORD_MIN_LENGTH_RECOMMENDED`].
    MinLengthBelowRecommended,
    /// Minimum length is above [`PASSWORD_MIN_LENGTH_UNUSUAL`].
    MinLengthUnusuallyHigh,
}

/// Password complexity requirements.
///
/// Immutable once constructed. Every rule is checked independently so a
/// caller can report all failures at once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PasswordPolicy {
    min_length: usize,
    require_upper: bool,
    require_lower: bool,
    require_digit: bool,
    require_special: bool,
}

impl PasswordPolicy {
    /// Creates a new policy, failing when `min_length` is zero.
    pub fn new(
        min_length: usize,
        require_upper: bool,
        require_lower: bool,
        require_digit: bool,
        require_special: bool,
    ) -> Result<Self> {
        if min_length < PASSWORD_MIN_LENGTH_FLOOR {
            return Err(Error::invalid_policy_config().with_message(format!(
                "password min_length must be at least {PASSWORD_MIN_LENGTH_FLOOR}"
            )));
        }

        let policy = Self {
            min_length,
            require_upper,
            require_lower,
            require_digit,
            require_special,
        };

        for advisory in policy.advisories() {
            tracing::warn!(
                target: TRACING_TARGET_POLICY,
                advisory = ?advisory,
                min_length,
                "password policy advisory"
            );
        }

        Ok(policy)
    }

    /// Creates a policy that only enforces a minimum length.
    pub fn with_min_length(min_length: usize) -> Result<Self> {
        Self::new(min_length, false, false, false, false)
    }

    /// Returns the configured minimum length.
    #[inline]
    pub fn min_length(&self) -> usize {
        self.min_length
    }

    /// Returns whether an uppercase letter is required.
    #[inline]
    pub fn require_upper(&self) -> bool {
        self.require_upper
    }

    /// Returns whether a lowercase letter is required.
    #[inline]
    pub fn require_lower(&self) -> bool {
        self.require_lower
    }

    /// Returns whether a digit is required.
    #[inline]
    pub fn require_digit(&self) -> bool {
        self.require_digit
    }

    /// Returns whether a special character is required.
    #[inline]
    pub fn require_special(&self) -> bool {
        self.require_special
    }

    /// Returns every non-fatal observation about this policy.
    pub fn advisories(&self) -> Vec<PasswordPolicyAdvisory> {
        let mut advisories = Vec::new();
        if self.min_length < PASSWORD_MIN_LENGTH_RECOMMENDED {
            advisories.push(PasswordPolicyAdvisory::MinLengthBelowRecommended);
        }
        if self.min_length > PASSWORD_MIN_LENGTH_UNUSUAL {
            advisories.push(PasswordPolicyAdvisory::MinLengthUnusuallyHigh);
        }
        advisories
    }

    /// Returns every rule the candidate fails, in a fixed order.
    ///
    /// Length is counted in Unicode scalar values, character classes are ASCII.
    pub fn violations(&self, candidate: &str) -> Vec<PasswordViolation> {
        let mut violations = Vec::new();

        let actual = candidate.chars().count();
        if actual < self.min_length {
            violations.push(PasswordViolation::TooShort {
                min_length: self.min_length,
                actual,
            });
        }

        if self.require_upper && !candidate.chars().any(|c| c.is_ascii_uppercase()) {
            violations.push(PasswordViolation::MissingUppercase);
        }
        if self.require_lower && !candidate.chars().any(|c| c.is_ascii_lowercase()) {
            violations.push(PasswordViolation::MissingLowercase);
        }
        if self.require_digit && !candidate.chars().any(|c| c.is_ascii_digit()) {
            violations.push(PasswordViolation::MissingDigit);
        }
        if self.require_special && !candidate.chars().any(|c| !c.is_ascii_alphanumeric()) {
            violations.push(PasswordViolation::MissingSpecial);
        }

        violations
    }

    /// Validates a candidate password against every rule.
    ///
    /// # Errors
    ///
    /// Returns a `PolicyViolation` error listing every failed rule.
    pub fn validate(&self, candidate: &str) -> Result<()> {
        let violations = self.violations(candidate);
        if violations.is_empty() {
            return Ok(());
        }

        tracing::debug!(
            target: TRACING_TARGET_POLICY,
            violations = ?violations,
            "password rejected by policy"
        );

        let message = violations
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");

        Err(Error::policy_violation().with_message(message))
    }

    /// Checks whether a candidate passes every rule (non-error version).
    pub fn meets_requirements(&self, candidate: &str) -> bool {
        self.violations(candidate).is_empty()
    }
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 8,
            require_upper: true,
            require_lower: true,
            require_digit: true,
            require_special: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn default_policy_accepts_strong_password() -> anyhow::Result<()> {
        let policy = PasswordPolicy::default();
        policy.validate("Valid1Pass!")?;
        Ok(())
    }

    #[test]
    fn digit_requirement_rejects_all_lowercase() -> anyhow::Result<()> {
        let policy = PasswordPolicy::new(8, false, false, true, false)?;
        let error = policy.validate("alllower").unwrap_err();
        assert_eq!(error.kind(), ErrorKind::PolicyViolation);
        assert_eq!(policy.violations("alllower"), vec![PasswordViolation::MissingDigit]);
        Ok(())
    }

    #[test]
    fn zero_min_length_is_invalid_config() {
        let error = PasswordPolicy::with_min_length(0).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidPolicyConfig);
    }

    #[test]
    fn each_rule_can_fail_independently() {
        let policy = PasswordPolicy::default();

        assert_eq!(
            policy.violations("Sh0rt!"),
            vec![PasswordViolation::TooShort {
                min_length: 8,
                actual: 6
            }]
        );
        assert_eq!(
            policy.violations("lower1case!"),
            vec![PasswordViolation::MissingUppercase]
        );
        assert_eq!(
            policy.violations("UPPER1CASE!"),
            vec![PasswordViolation::MissingLowercase]
        );
        assert_eq!(
            policy.violations("NoDigitsHere!"),
            vec![PasswordViolation::MissingDigit]
        );
        assert_eq!(
            policy.violations("NoSpecial123"),
            vec![PasswordViolation::MissingSpecial]
        );
    }

    #[test]
    fn error_message_lists_all_violations() {
        let policy = PasswordPolicy::default();
        let error = policy.validate("abc").unwrap_err();
        let message = error.message.unwrap_or_default();
        assert!(message.contains("at least 8 characters"));
        assert!(message.contains("uppercase"));
        assert!(message.contains("digit"));
        assert!(message.contains("special"));
    }

    #[test]
    fn length_counts_characters_not_bytes() -> anyhow::Result<()> {
        let policy = PasswordPolicy::with_min_length(4)?;
        assert!(policy.meets_requirements("ééé\u{1F600}"));
        assert!(!policy.meets_requirements("éé"));
        Ok(())
    }

    #[test]
    fn non_ascii_counts_as_special() -> anyhow::Result<()> {
        let policy = PasswordPolicy::new(1, false, false, false, true)?;
        assert!(policy.meets_requirements("abcé"));
        assert!(!policy.meets_requirements("abc123"));
        Ok(())
    }

    #[test]
    fn advisories_flag_short_and_huge_minimums() -> anyhow::Result<()> {
        let short = PasswordPolicy::with_min_length(6)?;
        assert_eq!(
            short.advisories(),
            vec![PasswordPolicyAdvisory::MinLengthBelowRecommended]
        );

        let huge = PasswordPolicy::with_min_length(200)?;
        assert_eq!(
            huge.advisories(),
            vec![PasswordPolicyAdvisory::MinLengthUnusuallyHigh]
        );

        let sensible = PasswordPolicy::with_min_length(16)?;
        assert!(sensible.advisories().is_empty());
        Ok(())
    }
}
