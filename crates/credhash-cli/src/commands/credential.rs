use std::io::{BufRead, Write};

use anyhow::Context;
use credhash_core::config::SecurityConfig;
use credhash_core::factory::SecurityFactory;

use super::{Outcome, read_password};
use crate::TRACING_TARGET_COMMAND;

/// Hashes the password read from `input` with the configured hasher.
pub fn hash(
    security: &SecurityConfig,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> anyhow::Result<Outcome> {
    let hasher = SecurityFactory::default()
        .build_hasher(security)
        .context("failed to configure password hasher")?;
    let password = read_password(input)?;

    let encoded = hasher.hash(&password).context("failed to hash password")?;
    writeln!(out, "{encoded}")?;
    Ok(Outcome::Success)
}

/// Verifies the password read from `input` against `encoded`.
pub fn verify(
    security: &SecurityConfig,
    encoded: &str,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> anyhow::Result<Outcome> {
    let hasher = SecurityFactory::default()
        .build_hasher(security)
        .context("failed to configure password hasher")?;
    let password = read_password(input)?;

    let matched = hasher
        .verify(encoded, &password)
        .context("failed to verify password")?;
    if !matched {
        tracing::info!(target: TRACING_TARGET_COMMAND, "password does not match");
        writeln!(out, "mismatch")?;
        return Ok(Outcome::Rejected);
    }

    writeln!(out, "match")?;
    report_rehash(hasher.needs_rehash(encoded));
    Ok(Outcome::Success)
}

/// Logs the rehash check result, returning whether a rehash is recommended.
fn report_rehash(check: credhash_core::Result<bool>) -> bool {
    match check {
        Ok(true) => {
            tracing::warn!(
                target: TRACING_TARGET_COMMAND,
                "hash parameters differ from the configured policy, rehash recommended"
            );
            true
        }
        Ok(false) => false,
        Err(error) => {
            tracing::warn!(
                target: TRACING_TARGET_COMMAND,
                error = %error,
                "could not check whether the hash needs a rehash"
            );
            false
        }
    }
}

/// Checks the password read from `input` against the configured strength rules.
pub fn check(
    security: &SecurityConfig,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> anyhow::Result<Outcome> {
    let policy = SecurityFactory::default()
        .build_password_policy(security)
        .context("failed to configure password policy")?;
    let password = read_password(input)?;

    let violations = policy.violations(&password);
    if violations.is_empty() {
        writeln!(out, "ok")?;
        return Ok(Outcome::Success);
    }

    for violation in &violations {
        writeln!(out, "{violation}")?;
    }
    Ok(Outcome::Rejected)
}
