//! Durable keyed storage for raw submissions and running aggregates.
//!
//! Two stores back the engine:
//!
//! - **Raw record store**: the latest raw submission per (identity, period)
//!   key. Last-write-wins, strongly consistent read-after-write per key.
//! - **Aggregate store**: running counters per (identity, category) with an
//!   atomic additive increment (possibly negative) and point/range reads.
//!
//! The engine only ever talks to the [`RawStore`] and [`AggregateStore`]
//! traits; the `SQLite` backends in [`sqlite`] are the concrete
//! implementations, with `in_memory()` constructors for tests.
//!
//! Increment atomicity at the level of one (identity, category) key is a
//! store obligation, not an engine one: the engine never performs
//! read-modify-write against an aggregate.

mod sqlite;


pub use sqlite::{SqliteAggregateStore, SqliteRawStore};

use rust_decimal::Decimal;
use thiserror::Error;

use crate::submission::{Category, Identity, Period, RawSubmission};

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    /// The underlying database rejected or failed the operation.
    #[error("store unavailable: {0}")]
    Unavailable(#[from] rusqlite::Error),

    /// I/O error during database operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored value could not be decoded.
    #[error("corrupt stored value for {key}: {details}")]
    Corrupt {
        /// The row key whose value failed to decode.
        key: String,
        /// Details about the failure.
        details: String,
    },
}

/// A running counter row for one (identity, category) pair.
///
/// The grand total lives in a row like any other, keyed by the reserved
/// category ([`crate::submission::GRAND_TOTAL_KEY`]), with repetitions
/// pinned at zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryAggregate {
    /// Exercise name (or the reserved grand-total key).
    pub category: Category,

    /// Cumulative volume.
    pub total_volume: Decimal,

    /// Cumulative repetitions.
    pub total_reps: i64,
}

/// Durable storage of the latest raw submission per (identity, period).
pub trait RawStore {
    /// Fetches the stored submission for a key, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails or the stored value is corrupt.
    fn get(&self, identity: &Identity, period: &Period)
        -> Result<Option<RawSubmission>, StoreError>;

    /// Stores a submission, replacing any previous record for its key.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn put(&self, submission: &RawSubmission) -> Result<(), StoreError>;
}

/// Durable storage of running counters with atomic additive increment.
pub trait AggregateStore {
    /// Atomically adds the given (possibly negative) deltas to one
    /// (identity, category) counter row, creating the row if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the increment fails; the counter is unchanged in
    /// that case.
    fn increment(
        &self,
        identity: &Identity,
        category: &Category,
        volume_delta: Decimal,
        reps_delta: i64,
    ) -> Result<(), StoreError>;

    /// Point read of one counter row.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails or the stored value is corrupt.
    fn get(
        &self,
        identity: &Identity,
        category: &Category,
    ) -> Result<Option<CategoryAggregate>, StoreError>;

    /// All counter rows for an identity, grand total included, in category
    /// order. Reporting surface only; the engine never reads this.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails or a stored value is corrupt.
    fn list_all(&self, identity: &Identity) -> Result<Vec<CategoryAggregate>, StoreError>;
}
