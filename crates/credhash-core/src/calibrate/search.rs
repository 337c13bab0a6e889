use std::time::Duration;

use super::probe::{Argon2Probe, CostProbe, median};
use super::{CalibrationConfig, CalibrationOutcome, CalibrationReport, Trial};
use crate::{Error, Result, TRACING_TARGET_CALIBRATE};

/// Searches the Argon2 time cost for a target hashing latency.
///
/// Memory cost and parallelism stay fixed. The search first measures the
/// seed, then doubles (or halves) the time cost until the target is
/// bracketed, and finally bisects the bracket. Each candidate is measured
/// `samples` times and the median is kept.
#[derive(Debug)]
pub struct Calibrator<P> {
    config: CalibrationConfig,
    probe: P,
    trials: Vec<Trial>,
}

impl Calibrator<Argon2Probe> {
    /// Creates a calibrator that times real Argon2id hashes.
    pub fn argon2(config: CalibrationConfig) -> Self {
        let probe = Argon2Probe::new(config.memory_cost(), config.parallelism());
        Self::new(config, probe)
    }
}

impl<P: CostProbe> Calibrator<P> {
    /// Creates a calibrator with a custom probe.
    pub fn new(config: CalibrationConfig, probe: P) -> Self {
        Self {
            config,
            probe,
            trials: Vec::new(),
        }
    }

    /// Runs the search and reports the best candidate.
    ///
    /// # Errors
    ///
    /// Returns a `CalibrationError` when no bracket can be found below the
    /// time cost ceiling or within the trial budget, or when the probe fails.
    pub fn run(mut self) -> Result<CalibrationReport> {
        let target = self.config.target();
        let seed = self.config.seed_time_cost();

        tracing::info!(
            target: TRACING_TARGET_CALIBRATE,
            target_ms = target.as_millis() as u64,
            seed,
            memory_cost = self.config.memory_cost(),
            parallelism = self.config.parallelism(),
            "starting calibration"
        );

        let elapsed = self.trial(seed)?;
        if self.config.is_within_tolerance(elapsed) {
            return Ok(self.report(CalibrationOutcome::Converged));
        }

        let (mut low, mut high) = if elapsed > target {
            match self.bracket_down(seed)? {
                Some(bracket) => bracket,
                None => return Ok(self.finish()),
            }
        } else {
            match self.bracket_up(seed)? {
                Some(bracket) => bracket,
                None => return Ok(self.finish()),
            }
        };

        while high - low > 1 {
            if self.budget_exhausted() {
                tracing::warn!(
                    target: TRACING_TARGET_CALIBRATE,
                    low,
                    high,
                    "trial budget exhausted before converging"
                );
                return Ok(self.report(CalibrationOutcome::BestEffort));
            }

            let mid = low + (high - low) / 2;
            let elapsed = self.trial(mid)?;
            if self.config.is_within_tolerance(elapsed) {
                return Ok(self.report(CalibrationOutcome::Converged));
            }

            if elapsed < target {
                low = mid;
            } else {
                high = mid;
            }
        }

        Ok(self.report(CalibrationOutcome::BestEffort))
    }

    /// Halves the time cost until a candidate falls below the target.
    ///
    /// Returns `None` when a candidate converged or cost 1 still exceeds the
    /// target; the caller reports from the recorded trials.
    fn bracket_down(&mut self, seed: u32) -> Result<Option<(u32, u32)>> {
        let target = self.config.target();
        let mut high = seed;

        while high > 1 {
            if self.budget_exhausted() {
                return Err(Error::calibration()
                    .with_message("trial budget exhausted before the target was bracketed"));
            }

            let cost = (high / 2).max(1);
            let elapsed = self.trial(cost)?;
            if self.config.is_within_tolerance(elapsed) {
                return Ok(None);
            }
            if elapsed < target {
                return Ok(Some((cost, high)));
            }
            high = cost;
        }

        Ok(None)
    }

    /// Doubles the time cost until a candidate exceeds the target.
    fn bracket_up(&mut self, seed: u32) -> Result<Option<(u32, u32)>> {
        let target = self.config.target();
        let ceiling = self.config.max_time_cost();
        let mut low = seed;

        loop {
            if low >= ceiling {
                return Err(Error::calibration().with_message(format!(
                    "target of {}ms not reached at the maximum time cost {ceiling}",
                    target.as_millis()
                )));
            }
            if self.budget_exhausted() {
                return Err(Error::calibration()
                    .with_message("trial budget exhausted before the target was bracketed"));
            }

            let cost = low.saturating_mul(2).min(ceiling);
            let elapsed = self.trial(cost)?;
            if self.config.is_within_tolerance(elapsed) {
                return Ok(None);
            }
            if elapsed > target {
                return Ok(Some((low, cost)));
            }
            low = cost;
        }
    }

    /// Measures one candidate and records the median.
    fn trial(&mut self, time_cost: u32) -> Result<Duration> {
        let mut samples = Vec::with_capacity(self.config.samples());
        for _ in 0..self.config.samples() {
            samples.push(self.probe.measure(time_cost)?);
        }

        let elapsed = median(&mut samples)
            .ok_or_else(|| Error::calibration().with_message("no samples were measured"))?;

        tracing::debug!(
            target: TRACING_TARGET_CALIBRATE,
            time_cost,
            elapsed_ms = elapsed.as_secs_f64() * 1_000.0,
            trial = self.trials.len() + 1,
            "calibration trial"
        );

        self.trials.push(Trial { time_cost, elapsed });
        Ok(elapsed)
    }

    fn budget_exhausted(&self) -> bool {
        self.trials.len() >= self.config.max_trials()
    }

    /// Reports after an early stop in the bracketing phase.
    fn finish(self) -> CalibrationReport {
        let converged = self
            .trials
            .last()
            .is_some_and(|trial| self.config.is_within_tolerance(trial.elapsed));

        if converged {
            self.report(CalibrationOutcome::Converged)
        } else {
            self.report(CalibrationOutcome::MinimumExceedsTarget)
        }
    }

    fn report(self, outcome: CalibrationOutcome) -> CalibrationReport {
        let target = self.config.target();

        let chosen = match outcome {
            CalibrationOutcome::MinimumExceedsTarget => {
                self.trials.iter().min_by_key(|trial| trial.time_cost)
            }
            CalibrationOutcome::Converged | CalibrationOutcome::BestEffort => self
                .trials
                .iter()
                .min_by_key(|trial| (trial.elapsed.abs_diff(target), trial.time_cost)),
        }
        .copied()
        .unwrap_or(Trial {
            time_cost: self.config.seed_time_cost(),
            elapsed: Duration::ZERO,
        });

        tracing::info!(
            target: TRACING_TARGET_CALIBRATE,
            outcome = %outcome,
            time_cost = chosen.time_cost,
            measured_ms = chosen.elapsed.as_secs_f64() * 1_000.0,
            trials = self.trials.len(),
            "calibration finished"
        );

        CalibrationReport {
            time_cost: chosen.time_cost,
            memory_cost: self.config.memory_cost(),
            parallelism: self.config.parallelism(),
            measured: chosen.elapsed,
            target,
            tolerance: self.config.tolerance(),
            outcome,
            trials: self.trials,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    /// Deterministic probe: latency grows linearly with time cost.
    fn linear(per_cost_ms: u64) -> impl FnMut(u32) -> Result<Duration> {
        move |cost| Ok(Duration::from_millis(u64::from(cost) * per_cost_ms))
    }

    fn config(target_ms: u64, seed: u32) -> anyhow::Result<CalibrationConfig> {
        Ok(CalibrationConfig::builder()
            .with_target_ms(target_ms)
            .with_seed_time_cost(seed)
            .with_memory_cost(1_024)
            .with_parallelism(1)
            .build()?)
    }

    #[test]
    fn seed_within_tolerance_converges_immediately() -> anyhow::Result<()> {
        let report = Calibrator::new(config(250, 8)?, linear(30)).run()?;
        assert_eq!(report.outcome, CalibrationOutcome::Converged);
        assert_eq!(report.time_cost, 8);
        assert_eq!(report.trials.len(), 1);
        Ok(())
    }

    #[test]
    fn doubles_then_bisects_toward_target() -> anyhow::Result<()> {
        let report = Calibrator::new(config(250, 2)?, linear(30)).run()?;

        assert_eq!(report.outcome, CalibrationOutcome::Converged);
        assert!(report.is_within_tolerance());
        assert!((7..=9).contains(&report.time_cost), "{}", report.time_cost);
        assert!(report.trials.len() <= 8);

        let costs: Vec<_> = report.trials.iter().map(|t| t.time_cost).collect();
        assert_eq!(&costs[..3], &[2, 4, 8]);
        Ok(())
    }

    #[test]
    fn halves_from_an_expensive_seed() -> anyhow::Result<()> {
        let report = Calibrator::new(config(250, 64)?, linear(30)).run()?;
        assert_eq!(report.outcome, CalibrationOutcome::Converged);
        assert!(report.is_within_tolerance());
        Ok(())
    }

    #[test]
    fn slow_hardware_reports_the_minimum() -> anyhow::Result<()> {
        let report = Calibrator::new(config(250, 4)?, linear(1_000)).run()?;
        assert_eq!(report.outcome, CalibrationOutcome::MinimumExceedsTarget);
        assert_eq!(report.time_cost, 1);
        assert_eq!(report.measured, Duration::from_secs(1));
        Ok(())
    }

    #[test]
    fn unreachable_target_fails_at_ceiling() -> anyhow::Result<()> {
        let config = CalibrationConfig::builder()
            .with_target_ms(10_000)
            .with_seed_time_cost(1)
            .with_max_time_cost(16)
            .with_memory_cost(1_024)
            .with_parallelism(1)
            .build()?;

        let error = Calibrator::new(config, linear(1)).run().unwrap_err();
        assert_eq!(error.kind(), ErrorKind::CalibrationError);
        Ok(())
    }

    #[test]
    fn zero_target_is_a_calibration_error() {
        let error = config(0, 2).unwrap_err();
        let error = error.downcast::<Error>().map(|e| e.kind()).ok();
        assert_eq!(error, Some(ErrorKind::CalibrationError));
    }

    #[test]
    fn exhausted_budget_during_bisection_is_best_effort() -> anyhow::Result<()> {
        let config = CalibrationConfig::builder()
            .with_target_ms(250)
            .with_tolerance(0.01)
            .with_seed_time_cost(2)
            .with_max_trials(4)
            .with_memory_cost(1_024)
            .with_parallelism(1)
            .build()?;

        // 2, 4, 8, 16 brackets the target, then the budget is gone.
        let report = Calibrator::new(config, linear(30)).run()?;
        assert_eq!(report.outcome, CalibrationOutcome::BestEffort);
        assert_eq!(report.trials.len(), 4);
        assert_eq!(report.time_cost, 8);
        Ok(())
    }

    #[test]
    fn closed_bracket_without_tolerance_is_best_effort() -> anyhow::Result<()> {
        let config = CalibrationConfig::builder()
            .with_target_ms(250)
            .with_tolerance(0.01)
            .with_seed_time_cost(2)
            .with_memory_cost(1_024)
            .with_parallelism(1)
            .build()?;

        // 240ms at cost 8 and 270ms at cost 9 both miss a 1% window.
        let report = Calibrator::new(config, linear(30)).run()?;
        assert_eq!(report.outcome, CalibrationOutcome::BestEffort);
        assert_eq!(report.time_cost, 8);
        Ok(())
    }

    #[test]
    fn median_dampens_outliers() -> anyhow::Result<()> {
        let mut calls = 0u32;
        let noisy = move |cost: u32| -> Result<Duration> {
            calls += 1;
            let base = u64::from(cost) * 30;
            // Every third sample is a 10x outlier.
            let ms = if calls % 3 == 0 { base * 10 } else { base };
            Ok(Duration::from_millis(ms))
        };

        let report = Calibrator::new(config(250, 8)?, noisy).run()?;
        assert_eq!(report.outcome, CalibrationOutcome::Converged);
        assert_eq!(report.measured, Duration::from_millis(240));
        Ok(())
    }

    #[test]
    fn probe_failure_is_propagated() -> anyhow::Result<()> {
        let failing =
            |_: u32| -> Result<Duration> { Err(Error::calibration().with_message("probe broke")) };
        let error = Calibrator::new(config(250, 2)?, failing).run().unwrap_err();
        assert_eq!(error.kind(), ErrorKind::CalibrationError);
        Ok(())
    }

    #[test]
    fn real_argon2_probe_runs() -> anyhow::Result<()> {
        let config = CalibrationConfig::builder()
            .with_target_ms(1)
            .with_tolerance(0.9)
            .with_samples(1)
            .with_seed_time_cost(1)
            .with_max_trials(4)
            .with_memory_cost(64)
            .with_parallelism(1)
            .build()?;

        // Timing on CI is unpredictable; any outcome but an error is fine.
        let report = Calibrator::argon2(config).run();
        if let Err(error) = &report {
            assert_eq!(error.kind(), ErrorKind::CalibrationError);
        }
        Ok(())
    }
}
