use std::io::Write;

use anyhow::Context;
use credhash_core::calibrate::{CalibrationConfig, CalibrationOutcome, CalibrationReport, Calibrator};

use super::Outcome;
use crate::TRACING_TARGET_COMMAND;
use crate::config::CalibrateArgs;

/// Runs the Argon2 time cost search and prints the chosen parameters.
pub fn run(args: &CalibrateArgs, out: &mut impl Write) -> anyhow::Result<Outcome> {
    let config = calibration_config(args)?;

    tracing::info!(
        target: TRACING_TARGET_COMMAND,
        profile = %args.profile,
        target_ms = args.target_ms,
        memory_cost = config.memory_cost(),
        parallelism = config.parallelism(),
        "starting calibration"
    );

    let report = Calibrator::argon2(config)
        .run()
        .context("calibration failed")?;

    if report.outcome == CalibrationOutcome::MinimumExceedsTarget {
        tracing::warn!(
            target: TRACING_TARGET_COMMAND,
            measured_ms = report.measured.as_secs_f64() * 1_000.0,
            "time cost 1 already exceeds the target, consider a lighter profile"
        );
    }

    write_report(&report, args.json, out)?;
    Ok(Outcome::Success)
}

fn calibration_config(args: &CalibrateArgs) -> anyhow::Result<CalibrationConfig> {
    CalibrationConfig::builder()
        .with_profile(args.profile)
        .with_target_ms(args.target_ms)
        .with_tolerance(args.tolerance)
        .with_samples(args.samples)
        .with_max_time_cost(args.max_time_cost)
        .with_max_trials(args.max_trials)
        .build()
        .context("invalid calibration options")
}

fn write_report(report: &CalibrationReport, json: bool, out: &mut impl Write) -> anyhow::Result<()> {
    if json {
        writeln!(out, "{}", report.to_json()?)?;
    } else {
        writeln!(out, "# {} after {} trials", report.outcome, report.trials.len())?;
        write!(out, "{}", report.to_env_lines())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use credhash_core::calibrate::{CostProfile, Trial};

    use super::*;

    fn args() -> CalibrateArgs {
        CalibrateArgs {
            target_ms: 250,
            profile: CostProfile::Balanced,
            tolerance: 0.15,
            samples: 3,
            max_time_cost: 64,
            max_trials: 24,
            json: false,
        }
    }

    fn report() -> CalibrationReport {
        CalibrationReport {
            time_cost: 7,
            memory_cost: 65_536,
            parallelism: 2,
            measured: Duration::from_millis(245),
            target: Duration::from_millis(250),
            tolerance: 0.15,
            outcome: CalibrationOutcome::Converged,
            trials: vec![Trial {
                time_cost: 7,
                elapsed: Duration::from_millis(245),
            }],
        }
    }

    #[test]
    fn maps_args_onto_the_config() -> anyhow::Result<()> {
        let config = calibration_config(&args())?;
        assert_eq!(config.target(), Duration::from_millis(250));
        assert_eq!(config.seed_time_cost(), CostProfile::Balanced.time_cost());
        assert_eq!(config.memory_cost(), CostProfile::Balanced.memory_cost());
        assert_eq!(config.parallelism(), CostProfile::Balanced.parallelism());
        assert_eq!(config.max_trials(), 24);
        Ok(())
    }

    #[test]
    fn zero_target_is_rejected() {
        let args = CalibrateArgs {
            target_ms: 0,
            ..args()
        };
        assert!(calibration_config(&args).is_err());
    }

    #[test]
    fn writes_env_lines() -> anyhow::Result<()> {
        let mut out = Vec::new();
        write_report(&report(), false, &mut out)?;

        let text = String::from_utf8(out)?;
        assert!(text.starts_with("# converged after 1 trials\n"));
        assert!(text.contains("ARGON2_TIME_COST=7\n"));
        assert!(text.contains("ARGON2_MEMORY_COST=65536\n"));
        assert!(text.contains("ARGON2_PARALLELISM=2\n"));
        Ok(())
    }

    #[test]
    fn writes_json() -> anyhow::Result<()> {
        let mut out = Vec::new();
        write_report(&report(), true, &mut out)?;

        let value: serde_json::Value = serde_json::from_slice(&out)?;
        assert_eq!(value["time_cost"], 7);
        assert_eq!(value["outcome"], "converged");
        Ok(())
    }
}
