//! Signed-delta computation between submissions.
//!
//! A resubmission for an (identity, period) key replaces the stored record
//! wholesale, so the running aggregates must be corrected by the *difference*
//! between the new and previous totals, never by re-adding the new totals.
//! This module computes that difference as a [`DeltaSet`]: retraction of the
//! previous contribution and application of the new one, folded into one
//! signed adjustment per category.
//!
//! Everything here is pure. Inputs are validated upstream and the
//! computation cannot fail.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::submission::{Category, RawSubmission};

/// A set of signed per-category adjustments plus the grand-total adjustment.
///
/// Invariant: `volumes` and `reps` carry the same key set, and
/// `total_volume` equals the sum of `volumes` values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeltaSet {
    /// Signed volume adjustment per category.
    pub volumes: BTreeMap<Category, Decimal>,

    /// Signed repetition adjustment per category.
    pub reps: BTreeMap<Category, i64>,

    /// Signed adjustment to the grand-total volume.
    pub total_volume: Decimal,
}

impl DeltaSet {
    /// Adds a signed contribution for a category, keeping both maps keyed
    /// identically and the grand total in sync.
    pub fn add(&mut self, category: &Category, volume: Decimal, reps: i64) {
        *self
            .volumes
            .entry(category.clone())
            .or_insert(Decimal::ZERO) += volume;
        *self.reps.entry(category.clone()).or_insert(0) += reps;
        self.total_volume += volume;
    }

    /// The repetition delta for a category (zero if absent).
    #[must_use]
    pub fn reps_for(&self, category: &Category) -> i64 {
        self.reps.get(category).copied().unwrap_or(0)
    }

    /// Whether every adjustment in the set is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.total_volume == Decimal::ZERO
            && self.volumes.values().all(|v| *v == Decimal::ZERO)
            && self.reps.values().all(|r| *r == 0)
    }
}

/// Computes the signed deltas between a new submission and the previously
/// stored submission for the same (identity, period) key.
///
/// With no previous submission the deltas are exactly the new submission's
/// totals. With a previous submission, each category's delta is new minus
/// previous; categories present only in the previous submission are fully
/// retracted (negative-only delta). The grand-total delta always equals the
/// sum of the per-category volume deltas.
#[must_use]
pub fn compute_deltas(new: &RawSubmission, previous: Option<&RawSubmission>) -> DeltaSet {
    let mut deltas = DeltaSet::default();

    for (category, volume) in &new.volumes {
        let reps = new.reps.get(category).copied().unwrap_or(0);
        deltas.add(category, *volume, reps);
    }

    if let Some(previous) = previous {
        for (category, volume) in &previous.volumes {
            let reps = previous.reps.get(category).copied().unwrap_or(0);
            deltas.add(category, -*volume, -reps);
        }
    }

    deltas
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::submission::{Identity, Period, SetEntry};

    fn submission(entries: &[(&str, &str, u32)]) -> RawSubmission {
        let identity = Identity::parse("alice@example.com").expect("identity");
        let period = Period::parse("2026-08-01").expect("period");
        let entries = entries
            .iter()
            .map(|(name, weight, reps)| SetEntry {
                category: Category::parse(name).expect("category"),
                weight: weight.parse().expect("weight"),
                reps: *reps,
            })
            .collect();
        RawSubmission::new(identity, period, entries)
    }

    fn cat(name: &str) -> Category {
        Category::parse(name).expect("category")
    }

    #[test]
    fn no_previous_yields_new_totals() {
        let new = submission(&[("squat", "100", 5), ("bench", "50", 10)]);
        let deltas = compute_deltas(&new, None);

        assert_eq!(deltas.volumes[&cat("squat")], "500".parse().unwrap());
        assert_eq!(deltas.reps_for(&cat("squat")), 5);
        assert_eq!(deltas.volumes[&cat("bench")], "500".parse().unwrap());
        assert_eq!(deltas.total_volume, "1000".parse().unwrap());
    }

    #[test]
    fn identical_resubmission_is_net_zero() {
        let first = submission(&[("squat", "100", 5), ("bench", "50.5", 10)]);
        let second = first.clone();
        let deltas = compute_deltas(&second, Some(&first));

        assert!(deltas.is_zero());
        // Zero entries stay present rather than vanishing from the set.
        assert_eq!(deltas.volumes.len(), 2);
    }

    #[test]
    fn correction_produces_signed_difference() {
        let previous = submission(&[("squat", "100", 5)]);
        let new = submission(&[("squat", "120", 5)]);
        let deltas = compute_deltas(&new, Some(&previous));

        assert_eq!(deltas.volumes[&cat("squat")], "100".parse().unwrap());
        assert_eq!(deltas.reps_for(&cat("squat")), 0);
        assert_eq!(deltas.total_volume, "100".parse().unwrap());
    }

    #[test]
    fn omitted_category_is_fully_retracted() {
        let previous = submission(&[("squat", "100", 5), ("bench", "50", 10)]);
        let new = submission(&[("squat", "100", 5)]);
        let deltas = compute_deltas(&new, Some(&previous));

        assert_eq!(deltas.volumes[&cat("bench")], "-500".parse().unwrap());
        assert_eq!(deltas.reps_for(&cat("bench")), -10);
        assert_eq!(deltas.volumes[&cat("squat")], Decimal::ZERO);
        assert_eq!(deltas.total_volume, "-500".parse().unwrap());
    }

    #[test]
    fn grand_total_matches_sum_of_category_deltas() {
        let previous = submission(&[("squat", "100", 5), ("bench", "50", 10)]);
        let new = submission(&[("squat", "110", 4), ("deadlift", "180", 3)]);
        let deltas = compute_deltas(&new, Some(&previous));

        let sum: Decimal = deltas.volumes.values().copied().sum();
        assert_eq!(deltas.total_volume, sum);
    }

    #[test]
    fn decimal_weights_stay_exact() {
        let previous = submission(&[("curl", "22.5", 10)]);
        let new = submission(&[("curl", "22.6", 10)]);
        let deltas = compute_deltas(&new, Some(&previous));

        assert_eq!(deltas.volumes[&cat("curl")], "1".parse().unwrap());
        assert_eq!(deltas.total_volume, "1".parse().unwrap());
    }
}
