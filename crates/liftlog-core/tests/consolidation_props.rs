//! Property tests for delta computation and batch consolidation.

use std::collections::BTreeMap;

use liftlog_core::consolidate::{Batch, ChangeEvent, EventKind, SubmissionImage};
use liftlog_core::delta::compute_deltas;
use liftlog_core::submission::{Category, Identity, Period, RawSubmission, SetEntry};
use proptest::prelude::*;
use rust_decimal::Decimal;

const CATEGORIES: &[&str] = &["squat", "bench", "deadlift", "press", "row"];
const IDENTITIES: &[&str] = &[
    "alice@example.com",
    "bob@example.com",
    "carol@example.com",
];

fn cat(name: &str) -> Category {
    Category::parse(name).expect("category")
}

fn weight_strategy() -> impl Strategy<Value = Decimal> {
    // Weights up to 1000.00 with at most two decimal places.
    (0i64..100_000, 0u32..=2).prop_map(|(mantissa, scale)| Decimal::new(mantissa, scale))
}

fn entry_strategy() -> impl Strategy<Value = SetEntry> {
    (
        prop::sample::select(CATEGORIES.to_vec()),
        weight_strategy(),
        0u32..=50,
    )
        .prop_map(|(name, weight, reps)| SetEntry {
            category: cat(name),
            weight,
            reps,
        })
}

fn submission_strategy() -> impl Strategy<Value = RawSubmission> {
    prop::collection::vec(entry_strategy(), 0..8).prop_map(|entries| {
        RawSubmission::new(
            Identity::parse("alice@example.com").expect("identity"),
            Period::parse("2026-08-01").expect("period"),
            entries,
        )
    })
}

fn event_strategy() -> impl Strategy<Value = ChangeEvent> {
    let kind = prop::sample::select(vec![
        EventKind::Insert,
        EventKind::Modify,
        EventKind::Remove,
        EventKind::Other,
    ]);
    let image = prop::collection::btree_map(
        prop::sample::select(CATEGORIES.to_vec()).prop_map(cat),
        (weight_strategy(), 0i64..=50),
        1..4,
    )
    .prop_map(|entries| {
        let mut volumes = BTreeMap::new();
        let mut reps = BTreeMap::new();
        for (category, (volume, r)) in entries {
            volumes.insert(category.clone(), volume);
            reps.insert(category, r);
        }
        SubmissionImage { volumes, reps }
    });

    (kind, prop::sample::select(IDENTITIES.to_vec()), image).prop_map(|(kind, who, new_image)| {
        ChangeEvent {
            kind,
            identity: Identity::parse(who).expect("identity"),
            new_image,
        }
    })
}

proptest! {
    /// Resubmitting the exact same record always nets out to zero.
    #[test]
    fn identical_resubmission_is_always_net_zero(submission in submission_strategy()) {
        let deltas = compute_deltas(&submission, Some(&submission));
        prop_assert!(deltas.is_zero());
    }

    /// The grand-total delta always equals the sum of the per-category
    /// volume deltas, with or without a previous record.
    #[test]
    fn grand_total_is_sum_of_category_deltas(
        new in submission_strategy(),
        previous in proptest::option::of(submission_strategy()),
    ) {
        let deltas = compute_deltas(&new, previous.as_ref());
        let sum: Decimal = deltas.volumes.values().copied().sum();
        prop_assert_eq!(deltas.total_volume, sum);
    }

    /// A correction followed by its inverse retraction cancels exactly.
    #[test]
    fn correction_and_inverse_cancel(
        a in submission_strategy(),
        b in submission_strategy(),
    ) {
        let forward = compute_deltas(&b, Some(&a));
        let backward = compute_deltas(&a, Some(&b));
        prop_assert_eq!(forward.total_volume, -backward.total_volume);
        for (category, volume) in &forward.volumes {
            prop_assert_eq!(Some(&-*volume), backward.volumes.get(category));
        }
    }

    /// Consolidation equals the per-identity sum of aggregable events, no
    /// matter how events for different identities interleave.
    #[test]
    fn consolidation_matches_per_identity_sums(
        events in prop::collection::vec(event_strategy(), 0..20),
    ) {
        let mut expected_volume: BTreeMap<(Identity, Category), Decimal> = BTreeMap::new();
        let mut expected_reps: BTreeMap<(Identity, Category), i64> = BTreeMap::new();
        let mut expected_total: BTreeMap<Identity, Decimal> = BTreeMap::new();
        let mut aggregable = 0usize;

        for event in &events {
            if !event.kind.is_aggregable() {
                continue;
            }
            aggregable += 1;
            for (category, volume) in &event.new_image.volumes {
                let key = (event.identity.clone(), category.clone());
                *expected_volume.entry(key.clone()).or_insert(Decimal::ZERO) += *volume;
                *expected_reps.entry(key).or_insert(0) +=
                    event.new_image.reps.get(category).copied().unwrap_or(0);
                *expected_total.entry(event.identity.clone()).or_insert(Decimal::ZERO) += *volume;
            }
        }

        let seen = events.len();
        let consolidated = Batch::new(events).group().merge();

        prop_assert_eq!(consolidated.events_seen, seen);
        prop_assert_eq!(consolidated.events_dropped, seen - aggregable);

        for ((identity, category), volume) in &expected_volume {
            let deltas = &consolidated.deltas[identity];
            prop_assert_eq!(&deltas.volumes[category], volume);
            prop_assert_eq!(deltas.reps_for(category), expected_reps[&(identity.clone(), category.clone())]);
        }
        for (identity, total) in &expected_total {
            prop_assert_eq!(&consolidated.deltas[identity].total_volume, total);
        }
    }
}
