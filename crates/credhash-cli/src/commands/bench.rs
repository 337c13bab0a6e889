use std::io::Write;

use anyhow::Context;
use credhash_core::calibrate::{BenchmarkResult, BenchmarkRunner, CostProfile};

use super::Outcome;
use crate::TRACING_TARGET_COMMAND;
use crate::config::BenchArgs;

/// Benchmarks the selected cost profiles and prints their latency.
pub fn run(args: &BenchArgs, out: &mut impl Write) -> anyhow::Result<Outcome> {
    let runner = BenchmarkRunner::new(args.loops).context("invalid benchmark options")?;
    let profiles = selected_profiles(&args.profile);

    tracing::info!(
        target: TRACING_TARGET_COMMAND,
        loops = runner.loops(),
        profiles = profiles.len(),
        "starting benchmark"
    );

    let results = runner
        .run_profiles(&profiles)
        .context("benchmark failed")?;

    write_results(&results, args.json, out)?;
    Ok(Outcome::Success)
}

/// Returns the requested profiles, or every profile when none was named.
fn selected_profiles(requested: &[CostProfile]) -> Vec<CostProfile> {
    if requested.is_empty() {
        CostProfile::all().collect()
    } else {
        requested.to_vec()
    }
}

fn write_results(results: &[BenchmarkResult], json: bool, out: &mut impl Write) -> anyhow::Result<()> {
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(results)?)?;
        return Ok(());
    }

    writeln!(out, "{:<40} {:>10} {:>10}", "profile", "hash ms", "verify ms")?;
    for result in results {
        writeln!(
            out,
            "{:<40} {:>10.1} {:>10.1}",
            result.label,
            result.hash.as_secs_f64() * 1_000.0,
            result.verify.as_secs_f64() * 1_000.0,
        )?;
    }
    Ok(())
}
