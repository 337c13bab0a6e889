use std::time::{Duration, Instant};

use crate::algorithm::Argon2Hasher;
use crate::hasher::PasswordHashAlgorithm;
use crate::policy::Argon2Policy;
use crate::{Error, Result};

/// Password hashed by probes and benchmarks.
pub const BENCHMARK_PASSWORD: &str = "abc123";

/// Measures the latency of one hash at a given time cost.
///
/// The calibrator calls [`measure`](CostProbe::measure) repeatedly for each
/// candidate and keeps the median.
pub trait CostProbe {
    /// Performs one timed hash at `time_cost`.
    fn measure(&mut self, time_cost: u32) -> Result<Duration>;
}

impl<F> CostProbe for F
where
    F: FnMut(u32) -> Result<Duration>,
{
    fn measure(&mut self, time_cost: u32) -> Result<Duration> {
        self(time_cost)
    }
}

/// Times Argon2id hashes with fixed memory cost and parallelism.
///
/// Builds an [`Argon2Hasher`] directly for each measurement, bypassing the
/// registry and factory.
#[derive(Debug, Clone)]
pub struct Argon2Probe {
    memory_cost: u32,
    parallelism: u32,
}

impl Argon2Probe {
    /// Creates a probe with the given fixed memory cost and parallelism.
    pub fn new(memory_cost: u32, parallelism: u32) -> Self {
        Self {
            memory_cost,
            parallelism,
        }
    }
}

impl CostProbe for Argon2Probe {
    fn measure(&mut self, time_cost: u32) -> Result<Duration> {
        let policy = Argon2Policy::builder()
            .with_time_cost(time_cost)
            .with_memory_cost(self.memory_cost)
            .with_parallelism(self.parallelism)
            .build_quiet()
            .map_err(|e| {
                Error::calibration()
                    .with_message(format!("time cost {time_cost} is not a valid argon2 policy"))
                    .with_source(e)
            })?;
        let hasher = Argon2Hasher::new(policy).map_err(|e| {
            Error::calibration()
                .with_message("failed to construct argon2 hasher")
                .with_source(e)
        })?;

        let started = Instant::now();
        hasher.hash(BENCHMARK_PASSWORD).map_err(|e| {
            Error::calibration()
                .with_message("argon2 hash failed during calibration")
                .with_source(e)
        })?;
        Ok(started.elapsed())
    }
}

/// Returns the median of the given samples, averaging the two middle values
/// for an even count.
pub(crate) fn median(samples: &mut [Duration]) -> Option<Duration> {
    if samples.is_empty() {
        return None;
    }

    samples.sort_unstable();
    let mid = samples.len() / 2;
    if samples.len() % 2 == 1 {
        Some(samples[mid])
    } else {
        Some((samples[mid - 1] + samples[mid]) / 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_of_odd_and_even_counts() {
        let ms = Duration::from_millis;

        assert_eq!(median(&mut []), None);
        assert_eq!(median(&mut [ms(5)]), Some(ms(5)));
        assert_eq!(median(&mut [ms(9), ms(1), ms(5)]), Some(ms(5)));
        assert_eq!(median(&mut [ms(4), ms(1), ms(2), ms(3)]), Some(Duration::from_micros(2_500)));
    }

    #[test]
    fn argon2_probe_times_a_hash() -> anyhow::Result<()> {
        let mut probe = Argon2Probe::new(1_024, 1);
        let elapsed = probe.measure(1)?;
        assert!(elapsed > Duration::ZERO);
        Ok(())
    }

    #[test]
    fn argon2_probe_rejects_zero_time_cost() {
        let mut probe = Argon2Probe::new(1_024, 1);
        let error = probe.measure(0).unwrap_err();
        assert_eq!(error.kind(), crate::ErrorKind::CalibrationError);
    }

    #[test]
    fn closures_are_probes() -> anyhow::Result<()> {
        let mut probe =
            |cost: u32| -> Result<Duration> { Ok(Duration::from_millis(u64::from(cost) * 10)) };
        assert_eq!(probe.measure(3)?, Duration::from_millis(30));
        Ok(())
    }
}
