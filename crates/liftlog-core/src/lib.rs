//! liftlog-core - workout-volume aggregate consistency engine
//!
//! This library maintains running per-user, per-exercise workout-volume
//! aggregates that stay correct under resubmission (a user re-posts the same
//! day's workout with different numbers) and under batched, at-least-once
//! delivery of change events from the raw-record log.
//!
//! # Architecture
//!
//! ```text
//! direct path:  submission --> delta (vs previous record) --> raw store
//!                                                         \-> updater --> aggregates
//! stream path:  change events --> consolidate (one delta set per identity)
//!                                                         \-> updater --> aggregates
//! ```
//!
//! # Modules
//!
//! - [`submission`]: Data model (identity, period, category, raw submission)
//!   and fail-fast validation
//! - [`delta`]: Pure signed-delta computation between a new submission and
//!   the previously stored one
//! - [`store`]: Raw-record and aggregate store traits with `SQLite` backends
//! - [`updater`]: Best-effort per-category application of deltas, with
//!   structured per-category failure reporting
//! - [`consolidate`]: Batch consolidation of change events, exactly one
//!   aggregate update per identity per batch
//! - [`engine`]: Entry points tying the paths together, with ok/partial/
//!   failed verdicts for the invoking trigger
//! - [`config`]: Store locations from TOML

pub mod config;
pub mod consolidate;
pub mod delta;
pub mod engine;
pub mod store;
pub mod submission;
pub mod updater;

pub use config::{ConfigError, EngineConfig};
pub use consolidate::{Batch, ChangeEvent, EventKind, SubmissionImage};
pub use delta::{DeltaSet, compute_deltas};
pub use engine::{BatchReport, BatchStatus, Engine, SubmitError, SubmitOutcome};
pub use store::{
    AggregateStore, CategoryAggregate, RawStore, SqliteAggregateStore, SqliteRawStore, StoreError,
};
pub use submission::{
    Category, EntryInput, GRAND_TOTAL_KEY, Identity, Period, RawSubmission, SetEntry,
    SubmissionInput, ValidationError,
};
pub use updater::{ApplyReport, CategoryFailure, apply_deltas};
