//! Engine entry points: direct submission and stream-batch processing.
//!
//! The direct path accepts one day's workout for one user, diffs it against
//! the previously stored record for the same (identity, period) key, stores
//! the new record, and applies the signed deltas to the running aggregates.
//! The stream path accepts one batch of change events from the raw-record
//! log, consolidates them per identity, and applies each identity's
//! consolidated deltas exactly once.
//!
//! Failures are never retried here; redelivery is the invoking trigger's
//! policy, and the caller always receives an explicit ok/partial/failed
//! verdict rather than a silent partial success.


use tracing::{debug, info};

use crate::consolidate::{Batch, ChangeEvent};
use crate::delta::{DeltaSet, compute_deltas};
use crate::store::{AggregateStore, RawStore, StoreError};
use crate::submission::{RawSubmission, SubmissionInput, ValidationError};
use crate::updater::{ApplyReport, apply_deltas};

/// Errors from the direct-submission path.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SubmitError {
    /// The submission was malformed; nothing was mutated.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A raw-store operation failed before any aggregate was touched.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Outcome of one accepted direct submission.
#[derive(Debug)]
pub struct SubmitOutcome {
    /// The stored submission, totals derived.
    pub submission: RawSubmission,

    /// The signed deltas that were applied.
    pub deltas: DeltaSet,

    /// Per-category application outcome.
    pub report: ApplyReport,
}

/// Overall verdict for one processed batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    /// Every increment of every identity succeeded.
    Ok,

    /// Some increments succeeded and some failed.
    Partial,

    /// Increments were attempted and none succeeded.
    Failed,
}

/// Outcome of one processed batch, consumed by the invoking infrastructure
/// to decide redelivery.
#[derive(Debug)]
pub struct BatchReport {
    /// Overall verdict.
    pub status: BatchStatus,

    /// Per-identity application outcomes.
    pub identities: Vec<ApplyReport>,

    /// Events present in the batch.
    pub events_seen: usize,

    /// Events dropped for having a non-aggregable kind.
    pub events_dropped: usize,
}

/// The aggregate consistency engine.
///
/// Generic over its two store collaborators so tests can substitute
/// in-memory or fault-injecting implementations.
pub struct Engine<R, A> {
    raw: R,
    aggregates: A,
}

impl<R: RawStore, A: AggregateStore> Engine<R, A> {
    /// Builds an engine over the given stores.
    pub const fn new(raw: R, aggregates: A) -> Self {
        Self { raw, aggregates }
    }

    /// The aggregate store, for reporting reads.
    pub const fn aggregates(&self) -> &A {
        &self.aggregates
    }

    /// Processes one direct submission.
    ///
    /// Validates the input, reads the previous record for the same
    /// (identity, period) key, computes the signed deltas, replaces the raw
    /// record, and applies the deltas best-effort. A validation or
    /// raw-store failure aborts before any aggregate is touched; per-category
    /// increment failures are reported in the outcome, not raised.
    ///
    /// Concurrent resubmissions of the same (identity, period) key are not
    /// mutually exclusive: two callers can interleave read-previous and
    /// write-new around each other and lose a correction. This window is a
    /// documented consistency gap, deliberately left without a locking
    /// protocol.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError::Validation`] for malformed input and
    /// [`SubmitError::Store`] when the raw record cannot be read or written.
    pub fn submit(&self, input: &SubmissionInput) -> Result<SubmitOutcome, SubmitError> {
        let submission = RawSubmission::validate(input)?;

        let previous = self.raw.get(&submission.identity, &submission.period)?;
        if previous.is_some() {
            debug!(
                identity = %submission.identity,
                period = %submission.period,
                "previous record found; computing corrective deltas"
            );
        }

        let deltas = compute_deltas(&submission, previous.as_ref());
        self.raw.put(&submission)?;

        let report = apply_deltas(&self.aggregates, &submission.identity, &deltas);
        info!(
            identity = %submission.identity,
            period = %submission.period,
            total_volume = %submission.total_volume,
            failed = report.failed.len(),
            "submission recorded"
        );

        Ok(SubmitOutcome {
            submission,
            deltas,
            report,
        })
    }

    /// Processes one batch of change events from the raw-record log.
    ///
    /// Events are grouped by identity and merged, then the aggregate
    /// updater is invoked exactly once per identity. An empty batch (or one
    /// whose events were all dropped) reports `Ok`.
    ///
    /// The batch is assumed to be deduplicated by event offset at the
    /// delivery layer; reprocessing an already-partially-applied batch can
    /// double count.
    pub fn process_batch(&self, events: Vec<ChangeEvent>) -> BatchReport {
        let consolidated = Batch::new(events).group().merge();
        debug!(
            events_seen = consolidated.events_seen,
            events_dropped = consolidated.events_dropped,
            identities = consolidated.deltas.len(),
            "batch consolidated"
        );

        let identities: Vec<ApplyReport> = consolidated
            .deltas
            .iter()
            .map(|(identity, deltas)| apply_deltas(&self.aggregates, identity, deltas))
            .collect();

        let any_applied = identities.iter().any(|r| !r.applied.is_empty());
        let any_failed = identities.iter().any(|r| !r.failed.is_empty());
        let status = match (any_applied, any_failed) {
            (_, false) => BatchStatus::Ok,
            (false, true) => BatchStatus::Failed,
            (true, true) => BatchStatus::Partial,
        };

        info!(
            ?status,
            identities = identities.len(),
            events_seen = consolidated.events_seen,
            events_dropped = consolidated.events_dropped,
            "batch processed"
        );

        BatchReport {
            status,
            identities,
            events_seen: consolidated.events_seen,
            events_dropped: consolidated.events_dropped,
        }
    }
}
