//! `liftlog totals` - report running totals for one user.

use anyhow::{Context, Result};
use liftlog_core::{
    AggregateStore, Engine, Identity, SqliteAggregateStore, SqliteRawStore,
};

pub fn run(engine: &Engine<SqliteRawStore, SqliteAggregateStore>, identity: &str) -> Result<()> {
    let identity = Identity::parse(identity).context("invalid identity")?;
    let rows = engine.aggregates().list_all(&identity)?;

    if rows.is_empty() {
        println!("no recorded volume for {identity}");
        return Ok(());
    }

    println!("totals for {identity}:");
    for row in rows.iter().filter(|r| !r.category.is_grand_total()) {
        println!(
            "  {}: volume {}, reps {}",
            row.category, row.total_volume, row.total_reps
        );
    }
    if let Some(total) = rows.iter().find(|r| r.category.is_grand_total()) {
        println!("  total lifted: {}", total.total_volume);
    }

    Ok(())
}
