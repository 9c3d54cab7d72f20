//! `liftlog submit` - record or correct one day's workout.

use std::path::Path;

use anyhow::{Context, Result, bail};
use liftlog_core::{Engine, SqliteAggregateStore, SqliteRawStore, SubmissionInput};

pub fn run(
    engine: &Engine<SqliteRawStore, SqliteAggregateStore>,
    file: &Path,
    identity: Option<String>,
    period: Option<String>,
) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let mut input: SubmissionInput =
        serde_json::from_str(&content).context("malformed workout JSON")?;

    if let Some(identity) = identity {
        input.identity = identity;
    }
    if let Some(period) = period {
        input.period = period;
    }

    let outcome = engine.submit(&input)?;

    println!(
        "recorded {} for {}: total volume {}",
        outcome.submission.period, outcome.submission.identity, outcome.submission.total_volume,
    );
    for (category, volume) in &outcome.submission.volumes {
        println!(
            "  {category}: volume {volume}, reps {}",
            outcome.submission.reps[category]
        );
    }

    if !outcome.report.is_ok() {
        for failure in &outcome.report.failed {
            eprintln!(
                "warning: increment for '{}' failed: {}",
                failure.category, failure.error
            );
        }
        bail!(
            "{} of {} increments failed; affected counters are stale until the next correction",
            outcome.report.failed.len(),
            outcome.report.failed.len() + outcome.report.applied.len(),
        );
    }

    Ok(())
}
