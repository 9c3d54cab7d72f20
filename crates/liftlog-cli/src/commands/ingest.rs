//! `liftlog ingest` - process a batch of change events.

use std::path::Path;

use anyhow::{Context, Result, bail};
use liftlog_core::{
    BatchStatus, ChangeEvent, Engine, SqliteAggregateStore, SqliteRawStore,
};
use tracing::warn;

pub fn run(
    engine: &Engine<SqliteRawStore, SqliteAggregateStore>,
    file: &Path,
    max_batch_len: usize,
) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let events: Vec<ChangeEvent> =
        serde_json::from_str(&content).context("malformed batch JSON")?;
    ensure_batch_len(events.len(), max_batch_len)?;

    let report = engine.process_batch(events);

    println!(
        "batch: {} events, {} dropped, {} identities",
        report.events_seen,
        report.events_dropped,
        report.identities.len()
    );
    for identity in &report.identities {
        if identity.is_ok() {
            println!(
                "  {}: ok ({} increments)",
                identity.identity,
                identity.applied.len()
            );
        } else {
            println!(
                "  {}: {} failed, {} applied",
                identity.identity,
                identity.failed.len(),
                identity.applied.len()
            );
            for failure in &identity.failed {
                eprintln!("    '{}': {}", failure.category, failure.error);
            }
        }
    }

    match report.status {
        BatchStatus::Ok => {
            println!("status: ok");
            Ok(())
        }
        BatchStatus::Partial => {
            // Redelivery is the invoking infrastructure's call, so a partial
            // batch still exits zero.
            warn!("batch partially applied; failed counters are stale");
            println!("status: partial");
            Ok(())
        }
        BatchStatus::Failed => {
            println!("status: failed");
            bail!("no increment in the batch took effect")
        }
    }
}

/// Rejects the batch before any counter is touched, so an oversized file
/// can be split and resubmitted without a partial apply to unwind.
fn ensure_batch_len(len: usize, max: usize) -> Result<()> {
    if len > max {
        bail!("batch has {len} events, limit is {max}; split the file and resubmit");
    }
    Ok(())
}
