//! CLI subcommand implementations.

pub mod ingest;
pub mod submit;
pub mod totals;
