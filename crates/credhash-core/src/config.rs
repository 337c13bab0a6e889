//! Explicit configuration surface for the security factory.

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "config")]
use clap::Args;
use serde::Deserialize;

use crate::{Error, Result};

/// Recognized configuration keys (also the environment variable names).
pub mod keys {
    /// Registry name of the hashing algorithm.
    pub const HASH_VARIANT: &str = "HASH_VARIANT";
    /// Argon2 number of passes.
    pub const ARGON2_TIME_COST: &str = "ARGON2_TIME_COST";
    /// Argon2 memory cost in KiB.
    pub const ARGON2_MEMORY_COST: &str = "ARGON2_MEMORY_COST";
    /// Argon2 number of lanes.
    pub const ARGON2_PARALLELISM: &str = "ARGON2_PARALLELISM";
    /// Argon2 digest length in bytes.
    pub const ARGON2_HASH_LENGTH: &str = "ARGON2_HASH_LENGTH";
    /// Argon2 salt length in bytes.
    pub const ARGON2_SALT_LENGTH: &str = "ARGON2_SALT_LENGTH";
    /// Argon2 pepper.
    pub const ARGON2_PEPPER: &str = "ARGON2_PEPPER";
    /// PBKDF2 iteration count.
    pub const PBKDF2_ITERATIONS: &str = "PBKDF2_ITERATIONS";
    /// PBKDF2 derived key length in bytes.
    pub const PBKDF2_HASH_LENGTH: &str = "PBKDF2_HASH_LENGTH";
    /// PBKDF2 salt length in bytes.
    pub const PBKDF2_SALT_LENGTH: &str = "PBKDF2_SALT_LENGTH";
    /// PBKDF2 pepper.
    pub const PBKDF2_PEPPER: &str = "PBKDF2_PEPPER";
    /// Minimum password length.
    pub const PASSWORD_MIN_LENGTH: &str = "PASSWORD_MIN_LENGTH";
    /// Whether passwords need an uppercase letter.
    pub const PASSWORD_REQUIRE_UPPER: &str = "PASSWORD_REQUIRE_UPPER";
    /// Whether passwords need a lowercase letter.
    pub const PASSWORD_REQUIRE_LOWER: &str = "PASSWORD_REQUIRE_LOWER";
    /// Whether passwords need a digit.
    pub const PASSWORD_REQUIRE_DIGIT: &str = "PASSWORD_REQUIRE_DIGIT";
    /// Whether passwords need a special character.
    pub const PASSWORD_REQUIRE_SPECIAL: &str = "PASSWORD_REQUIRE_SPECIAL";
}

/// Default hashing algorithm.
pub const DEFAULT_HASH_VARIANT: &str = "argon2";

/// Raw security configuration.
///
/// Every field is optional: `None` means the key was absent and the policy
/// default applies. Values are checked when the factory builds policies from
/// them.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[serde(default)]
pub struct SecurityConfig {
    /// Registry name of the hashing algorithm.
    #[cfg_attr(feature = "config", arg(long, env = "HASH_VARIANT"))]
    pub hash_variant: Option<String>,

    /// Argon2 number of passes over memory.
    #[cfg_attr(feature = "config", arg(long, env = "ARGON2_TIME_COST"))]
    pub argon2_time_cost: Option<u32>,

    /// Argon2 memory cost in KiB.
    #[cfg_attr(feature = "config", arg(long, env = "ARGON2_MEMORY_COST"))]
    pub argon2_memory_cost: Option<u32>,

    /// Argon2 number of lanes.
    #[cfg_attr(feature = "config", arg(long, env = "ARGON2_PARALLELISM"))]
    pub argon2_parallelism: Option<u32>,

    /// Argon2 digest length in bytes.
    #[cfg_attr(feature = "config", arg(long, env = "ARGON2_HASH_LENGTH"))]
    pub argon2_hash_length: Option<usize>,

    /// Argon2 salt length in bytes.
    #[cfg_attr(feature = "config", arg(long, env = "ARGON2_SALT_LENGTH"))]
    pub argon2_salt_length: Option<usize>,

    /// Argon2 pepper appended to every password.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "ARGON2_PEPPER", hide_env_values = true)
    )]
    pub argon2_pepper: Option<String>,

    /// PBKDF2 iteration count.
    #[cfg_attr(feature = "config", arg(long, env = "PBKDF2_ITERATIONS"))]
    pub pbkdf2_iterations: Option<u32>,

    /// PBKDF2 derived key length in bytes.
    #[cfg_attr(feature = "config", arg(long, env = "PBKDF2_HASH_LENGTH"))]
    pub pbkdf2_hash_length: Option<usize>,

    /// PBKDF2 salt length in bytes.
    #[cfg_attr(feature = "config", arg(long, env = "PBKDF2_SALT_LENGTH"))]
    pub pbkdf2_salt_length: Option<usize>,

    /// PBKDF2 pepper appended to every password.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "PBKDF2_PEPPER", hide_env_values = true)
    )]
    pub pbkdf2_pepper: Option<String>,

    /// Minimum password length in characters.
    #[cfg_attr(feature = "config", arg(long, env = "PASSWORD_MIN_LENGTH"))]
    pub password_min_length: Option<usize>,

    /// Whether passwords need an uppercase letter.
    #[cfg_attr(
        feature = "config",
        arg(
            long,
            env = "PASSWORD_REQUIRE_UPPER",
            value_parser = clap::builder::BoolishValueParser::new()
        )
    )]
    pub password_require_upper: Option<bool>,

    /// Whether passwords need a lowercase letter.
    #[cfg_attr(
        feature = "config",
        arg(
            long,
            env = "PASSWORD_REQUIRE_LOWER",
            value_parser = clap::builder::BoolishValueParser::new()
        )
    )]
    pub password_require_lower: Option<bool>,

    /// Whether passwords need a digit.
    #[cfg_attr(
        feature = "config",
        arg(
            long,
            env = "PASSWORD_REQUIRE_DIGIT",
            value_parser = clap::builder::BoolishValueParser::new()
        )
    )]
    pub password_require_digit: Option<bool>,

    /// Whether passwords need a special character.
    #[cfg_attr(
        feature = "config",
        arg(
            long,
            env = "PASSWORD_REQUIRE_SPECIAL",
            value_parser = clap::builder::BoolishValueParser::new()
        )
    )]
    pub password_require_special: Option<bool>,
}

impl SecurityConfig {
    /// Reads every recognized key through `lookup`.
    ///
    /// Absent keys stay `None`. Empty peppers count as absent.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidPolicyConfig` error naming the key when a present
    /// value cannot be parsed (empty, non-numeric, negative or overflowing
    /// numbers, unrecognized booleans, empty variant).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let hash_variant = match lookup(keys::HASH_VARIANT) {
            Some(variant) if variant.trim().is_empty() => {
                return Err(invalid_value(keys::HASH_VARIANT, "value must not be empty"));
            }
            other => other,
        };

        Ok(Self {
            hash_variant,
            argon2_time_cost: parse_number(&lookup, keys::ARGON2_TIME_COST)?,
            argon2_memory_cost: parse_number(&lookup, keys::ARGON2_MEMORY_COST)?,
            argon2_parallelism: parse_number(&lookup, keys::ARGON2_PARALLELISM)?,
            argon2_hash_length: parse_number(&lookup, keys::ARGON2_HASH_LENGTH)?,
            argon2_salt_length: parse_number(&lookup, keys::ARGON2_SALT_LENGTH)?,
            argon2_pepper: lookup(keys::ARGON2_PEPPER).filter(|p| !p.is_empty()),
            pbkdf2_iterations: parse_number(&lookup, keys::PBKDF2_ITERATIONS)?,
            pbkdf2_hash_length: parse_number(&lookup, keys::PBKDF2_HASH_LENGTH)?,
            pbkdf2_salt_length: parse_number(&lookup, keys::PBKDF2_SALT_LENGTH)?,
            pbkdf2_pepper: lookup(keys::PBKDF2_PEPPER).filter(|p| !p.is_empty()),
            password_min_length: parse_number(&lookup, keys::PASSWORD_MIN_LENGTH)?,
            password_require_upper: parse_bool(&lookup, keys::PASSWORD_REQUIRE_UPPER)?,
            password_require_lower: parse_bool(&lookup, keys::PASSWORD_REQUIRE_LOWER)?,
            password_require_digit: parse_bool(&lookup, keys::PASSWORD_REQUIRE_DIGIT)?,
            password_require_special: parse_bool(&lookup, keys::PASSWORD_REQUIRE_SPECIAL)?,
        })
    }

    /// Reads every recognized key from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Returns the configured variant, or the default `argon2`.
    pub fn variant(&self) -> &str {
        self.hash_variant
            .as_deref()
            .map(str::trim)
            .unwrap_or(DEFAULT_HASH_VARIANT)
    }
}

fn invalid_value(key: &str, reason: impl fmt::Display) -> Error {
    Error::invalid_policy_config().with_message(format!("invalid value for {key}: {reason}"))
}

fn parse_number<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(invalid_value(key, "value must not be empty"));
    }

    trimmed
        .parse::<T>()
        .map(Some)
        .map_err(|e| invalid_value(key, e))
}

fn parse_bool<F>(lookup: &F, key: &str) -> Result<Option<bool>>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };

    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(Some(true)),
        "false" | "0" | "no" | "off" => Ok(Some(false)),
        _ => Err(invalid_value(
            key,
            "expected one of true/false/1/0/yes/no/on/off",
        )),
    }
}

impl fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |pepper: &Option<String>| pepper.as_ref().map(|_| "[REDACTED]");

        f.debug_struct("SecurityConfig")
            .field("hash_variant", &self.hash_variant)
            .field("argon2_time_cost", &self.argon2_time_cost)
            .field("argon2_memory_cost", &self.argon2_memory_cost)
            .field("argon2_parallelism", &self.argon2_parallelism)
            .field("argon2_hash_length", &self.argon2_hash_length)
            .field("argon2_salt_length", &self.argon2_salt_length)
            .field("argon2_pepper", &redact(&self.argon2_pepper))
            .field("pbkdf2_iterations", &self.pbkdf2_iterations)
            .field("pbkdf2_hash_length", &self.pbkdf2_hash_length)
            .field("pbkdf2_salt_length", &self.pbkdf2_salt_length)
            .field("pbkdf2_pepper", &redact(&self.pbkdf2_pepper))
            .field("password_min_length", &self.password_min_length)
            .field("password_require_upper", &self.password_require_upper)
            .field("password_require_lower", &self.password_require_lower)
            .field("password_require_digit", &self.password_require_digit)
            .field("password_require_special", &self.password_require_special)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::ErrorKind;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn absent_keys_stay_none() -> anyhow::Result<()> {
        let config = SecurityConfig::from_lookup(|_| None)?;
        assert_eq!(config, SecurityConfig::default());
        assert_eq!(config.variant(), "argon2");
        Ok(())
    }

    #[test]
    fn present_keys_are_parsed() -> anyhow::Result<()> {
        let config = SecurityConfig::from_lookup(lookup_from(&[
            ("HASH_VARIANT", "pbkdf2"),
            ("ARGON2_TIME_COST", "3"),
            ("ARGON2_MEMORY_COST", " 65536 "),
            ("PBKDF2_ITERATIONS", "700000"),
            ("PASSWORD_MIN_LENGTH", "12"),
            ("PASSWORD_REQUIRE_SPECIAL", "off"),
            ("PASSWORD_REQUIRE_DIGIT", "YES"),
        ]))?;

        assert_eq!(config.variant(), "pbkdf2");
        assert_eq!(config.argon2_time_cost, Some(3));
        assert_eq!(config.argon2_memory_cost, Some(65_536));
        assert_eq!(config.pbkdf2_iterations, Some(700_000));
        assert_eq!(config.password_min_length, Some(12));
        assert_eq!(config.password_require_special, Some(false));
        assert_eq!(config.password_require_digit, Some(true));
        assert_eq!(config.password_require_upper, None);
        Ok(())
    }

    #[test]
    fn non_numeric_value_is_rejected() {
        let error =
            SecurityConfig::from_lookup(lookup_from(&[("ARGON2_TIME_COST", "six")])).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidPolicyConfig);
        assert!(error.to_string().contains("ARGON2_TIME_COST"));
    }

    #[test]
    fn negative_and_overflowing_values_are_rejected() {
        for value in ["-1", "4294967296", ""] {
            let result = SecurityConfig::from_lookup(lookup_from(&[("ARGON2_PARALLELISM", value)]));
            assert_eq!(
                result.err().map(|e| e.kind()),
                Some(ErrorKind::InvalidPolicyConfig),
                "{value:?}"
            );
        }
    }

    #[test]
    fn unknown_boolean_is_rejected() {
        let error =
            SecurityConfig::from_lookup(lookup_from(&[("PASSWORD_REQUIRE_UPPER", "maybe")]))
                .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidPolicyConfig);
    }

    #[test]
    fn empty_variant_is_rejected() {
        let error = SecurityConfig::from_lookup(lookup_from(&[("HASH_VARIANT", " ")])).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidPolicyConfig);
    }

    #[test]
    fn empty_pepper_means_no_pepper() -> anyhow::Result<()> {
        let config = SecurityConfig::from_lookup(lookup_from(&[
            ("ARGON2_PEPPER", ""),
            ("PBKDF2_PEPPER", "a-long-enough-pepper"),
        ]))?;
        assert_eq!(config.argon2_pepper, None);
        assert_eq!(config.pbkdf2_pepper.as_deref(), Some("a-long-enough-pepper"));
        Ok(())
    }

    #[test]
    fn debug_redacts_peppers() -> anyhow::Result<()> {
        let config = SecurityConfig::from_lookup(lookup_from(&[(
            "ARGON2_PEPPER",
            "do-not-print-this-pepper",
        )]))?;
        assert!(!format!("{config:?}").contains("do-not-print-this-pepper"));
        Ok(())
    }

    #[test]
    fn from_env_reads_the_process_environment() -> anyhow::Result<()> {
        let expected = SecurityConfig::from_lookup(|key| std::env::var(key).ok());
        match (SecurityConfig::from_env(), expected) {
            (Ok(actual), Ok(expected)) => assert_eq!(actual, expected),
            (Err(actual), Err(expected)) => assert_eq!(actual.kind(), expected.kind()),
            (actual, expected) => anyhow::bail!("{actual:?} differs from {expected:?}"),
        }
        Ok(())
    }

    #[test]
    fn deserializes_from_json() -> anyhow::Result<()> {
        let config: SecurityConfig = serde_json::from_str(
            r#"{"hash_variant": "pbkdf2", "pbkdf2_iterations": 1000, "password_require_special": false}"#,
        )?;
        assert_eq!(config.variant(), "pbkdf2");
        assert_eq!(config.pbkdf2_iterations, Some(1_000));
        assert_eq!(config.password_require_special, Some(false));
        assert_eq!(config.argon2_time_cost, None);

        let empty: SecurityConfig = serde_json::from_str("{}")?;
        assert_eq!(empty, SecurityConfig::default());
        Ok(())
    }

    #[cfg(feature = "config")]
    #[test]
    fn clap_flags_populate_config() -> anyhow::Result<()> {
        use clap::Parser;

        #[derive(Parser)]
        struct Cli {
            #[command(flatten)]
            security: SecurityConfig,
        }

        let cli = Cli::try_parse_from([
            "credhash",
            "--hash-variant",
            "pbkdf2",
            "--pbkdf2-iterations",
            "1000",
            "--password-require-upper",
            "no",
        ])?;
        assert_eq!(cli.security.variant(), "pbkdf2");
        assert_eq!(cli.security.pbkdf2_iterations, Some(1_000));
        assert_eq!(cli.security.password_require_upper, Some(false));
        Ok(())
    }
}
