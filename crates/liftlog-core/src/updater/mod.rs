//! Best-effort application of a delta set to the aggregate store.
//!
//! Each category's delta goes to the store as one atomic increment. A
//! failure on one category must not block the remaining categories or the
//! grand total: failures are collected per category and surfaced in the
//! [`ApplyReport`], never silently dropped. A failed increment leaves that
//! one counter stale until the next corrective submission recomputes
//! against it (eventual, not strict, consistency).

use tracing::{debug, warn};

use crate::delta::DeltaSet;
use crate::store::{AggregateStore, StoreError};
use crate::submission::{Category, Identity};

/// One category whose increment did not take effect.
#[derive(Debug)]
pub struct CategoryFailure {
    /// The category that failed (may be the reserved grand-total key).
    pub category: Category,

    /// The store error behind the failure.
    pub error: StoreError,
}

/// Per-identity outcome of applying a delta set.
#[derive(Debug)]
pub struct ApplyReport {
    /// The identity the deltas were applied for.
    pub identity: Identity,

    /// Categories whose increments succeeded (grand total included).
    pub applied: Vec<Category>,

    /// Categories whose increments failed.
    pub failed: Vec<CategoryFailure>,
}

impl ApplyReport {
    /// Whether every attempted increment succeeded.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Applies a delta set to the aggregate store, one atomic increment per
/// category plus one for the grand total.
///
/// Categories whose volume and repetition deltas are both zero are skipped
/// (an idempotent resubmission performs no writes). The grand-total
/// increment is attempted even when some categories failed.
pub fn apply_deltas<A: AggregateStore>(
    store: &A,
    identity: &Identity,
    deltas: &DeltaSet,
) -> ApplyReport {
    let mut report = ApplyReport {
        identity: identity.clone(),
        applied: Vec::new(),
        failed: Vec::new(),
    };

    for (category, volume_delta) in &deltas.volumes {
        let reps_delta = deltas.reps_for(category);
        if volume_delta.is_zero() && reps_delta == 0 {
            continue;
        }

        match store.increment(identity, category, *volume_delta, reps_delta) {
            Ok(()) => {
                debug!(
                    identity = %identity,
                    category = %category,
                    volume = %volume_delta,
                    reps = reps_delta,
                    "applied category delta"
                );
                report.applied.push(category.clone());
            },
            Err(error) => {
                warn!(
                    identity = %identity,
                    category = %category,
                    %error,
                    "category increment failed; counter left stale"
                );
                report.failed.push(CategoryFailure {
                    category: category.clone(),
                    error,
                });
            },
        }
    }

    if !deltas.total_volume.is_zero() {
        let grand_total = Category::grand_total();
        match store.increment(identity, &grand_total, deltas.total_volume, 0) {
            Ok(()) => report.applied.push(grand_total),
            Err(error) => {
                warn!(identity = %identity, %error, "grand-total increment failed");
                report.failed.push(CategoryFailure {
                    category: grand_total,
                    error,
                });
            },
        }
    }

    report
}
