use std::time::{Duration, Instant};

use serde::Serialize;

use super::probe::BENCHMARK_PASSWORD;
use super::report::serialize_millis;
use super::CostProfile;
use crate::algorithm::Argon2Hasher;
use crate::hasher::PasswordHashAlgorithm;
use crate::{Error, Result, TRACING_TARGET_CALIBRATE};

/// Default number of hash and verify calls per benchmark.
pub const BENCHMARK_DEFAULT_LOOPS: u32 = 3;

/// Mean latencies measured for one hasher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BenchmarkResult {
    /// Human readable label of the measured configuration.
    pub label: String,
    /// Mean duration of one hash.
    #[serde(rename = "hash_ms", serialize_with = "serialize_millis")]
    pub hash: Duration,
    /// Mean duration of one verification.
    #[serde(rename = "verify_ms", serialize_with = "serialize_millis")]
    pub verify: Duration,
}

/// Measures mean hash and verify latency over a fixed number of loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BenchmarkRunner {
    loops: u32,
}

impl BenchmarkRunner {
    /// Creates a runner performing `loops` hashes and verifications per hasher.
    ///
    /// # Errors
    ///
    /// Returns a `CalibrationError` when `loops` is zero.
    pub fn new(loops: u32) -> Result<Self> {
        if loops == 0 {
            return Err(Error::calibration().with_message("benchmark loops must be at least 1"));
        }
        Ok(Self { loops })
    }

    /// Returns the number of loops per hasher.
    #[inline]
    pub fn loops(&self) -> u32 {
        self.loops
    }

    /// Benchmarks every given Argon2 cost profile in order.
    pub fn run_profiles(&self, profiles: &[CostProfile]) -> Result<Vec<BenchmarkResult>> {
        profiles
            .iter()
            .map(|profile| {
                let hasher = Argon2Hasher::new(profile.policy()?)?;
                self.run(&profile.label(), &hasher)
            })
            .collect()
    }

    /// Benchmarks a single hasher.
    ///
    /// # Errors
    ///
    /// Returns a `CalibrationError` if any produced hash fails to verify, or
    /// the hasher's own error if hashing fails.
    pub fn run(&self, label: &str, hasher: &dyn PasswordHashAlgorithm) -> Result<BenchmarkResult> {
        let started = Instant::now();
        for _ in 0..self.loops {
            hasher.hash(BENCHMARK_PASSWORD)?;
        }
        let hash = self.mean(started.elapsed());

        let hashes = (0..self.loops)
            .map(|_| hasher.hash(BENCHMARK_PASSWORD))
            .collect::<Result<Vec<_>>>()?;

        let started = Instant::now();
        let mut verified = true;
        for encoded in &hashes {
            verified &= hasher.verify(encoded, BENCHMARK_PASSWORD)?;
        }
        let verify = self.mean(started.elapsed());

        if !verified {
            return Err(Error::calibration().with_message(format!("verification failed for {label}")));
        }

        tracing::info!(
            target: TRACING_TARGET_CALIBRATE,
            label,
            hash_ms = hash.as_secs_f64() * 1_000.0,
            verify_ms = verify.as_secs_f64() * 1_000.0,
            "benchmark completed"
        );

        Ok(BenchmarkResult {
            label: label.to_owned(),
            hash,
            verify,
        })
    }

    /// Spreads a total duration over the loop count.
    fn mean(&self, total: Duration) -> Duration {
        total / self.loops
    }
}

impl Default for BenchmarkRunner {
    fn default() -> Self {
        Self {
            loops: BENCHMARK_DEFAULT_LOOPS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use crate::algorithm::Pbkdf2Hasher;
    use crate::policy::{Argon2Policy, Pbkdf2Policy};

    /// Hasher whose verification never succeeds.
    #[derive(Debug)]
    struct Broken;

    impl PasswordHashAlgorithm for Broken {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn hash(&self, _: &str) -> Result<String> {
            Ok("$broken$".to_owned())
        }

        fn verify(&self, _: &str, _: &str) -> Result<bool> {
            Ok(false)
        }

        fn needs_rehash(&self, _: &str) -> Result<bool> {
            Ok(false)
        }
    }

    #[test]
    fn zero_loops_are_rejected() {
        let error = BenchmarkRunner::new(0).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::CalibrationError);
    }

    #[test]
    fn mean_divides_by_the_full_loop_count() -> anyhow::Result<()> {
        let runner = BenchmarkRunner::new(u32::MAX)?;
        assert_eq!(runner.loops(), u32::MAX);
        assert_eq!(
            runner.mean(Duration::from_secs(u64::from(u32::MAX))),
            Duration::from_secs(1)
        );

        let runner = BenchmarkRunner::new(4)?;
        assert_eq!(runner.mean(Duration::from_millis(100)), Duration::from_millis(25));
        Ok(())
    }

    #[test]
    fn benchmarks_any_algorithm() -> anyhow::Result<()> {
        let runner = BenchmarkRunner::new(2)?;

        let argon2 = Argon2Hasher::new(Argon2Policy::new(1, 64, 1)?)?;
        let result = runner.run("argon2 cheap", &argon2)?;
        assert_eq!(result.label, "argon2 cheap");

        let pbkdf2 = Pbkdf2Hasher::new(Pbkdf2Policy::new(1_000)?);
        let result = runner.run("pbkdf2 cheap", &pbkdf2)?;
        assert!(result.hash > Duration::ZERO);
        Ok(())
    }

    #[test]
    fn failed_verification_is_reported() -> anyhow::Result<()> {
        let runner = BenchmarkRunner::new(1)?;
        let error = runner.run("broken", &Broken).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::CalibrationError);
        assert!(error.to_string().contains("broken"));
        Ok(())
    }

    #[test]
    fn result_serializes_milliseconds() -> anyhow::Result<()> {
        let result = BenchmarkResult {
            label: "balanced".to_owned(),
            hash: Duration::from_millis(120),
            verify: Duration::from_millis(118),
        };
        let json = serde_json::to_value(&result)?;
        assert_eq!(json["hash_ms"], 120.0);
        assert_eq!(json["verify_ms"], 118.0);
        Ok(())
    }
}
