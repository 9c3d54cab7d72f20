//! Batch consolidation of change events.
//!
//! The upstream raw-record log delivers change events in batches, at least
//! once, and a single batch routinely carries several events for the same
//! identity. Applying each event individually would mean N racing partial
//! updates per identity; consolidation folds each identity's events into
//! one delta set so the aggregate updater is invoked exactly once per
//! identity per batch.
//!
//! The batch moves through an explicit typestate pipeline:
//!
//! ```text
//! Batch (raw events) --group()--> Grouped --merge()--> Consolidated
//! ```
//!
//! Grouping partitions events by identity, preserving arrival order within
//! each group, and drops events whose kind is not insert/modify. Merging
//! folds each group in arrival order, summing volumes and repetitions per
//! category — events are modeled as cumulative contributions, not
//! successive overwrites. If the upstream source ever emitted one
//! cumulative image per identity per batch, summing would double count;
//! that contract belongs to the event source.
//!
//! Consolidation is pure and deterministic. Rerunning it over an
//! already-partially-applied batch can still double count; deduplication by
//! event offset is owned by the delivery layer, not this module.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::delta::DeltaSet;
use crate::submission::{Category, Identity};

/// Kind of change recorded by an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// A new raw record was written.
    #[serde(alias = "INSERT")]
    Insert,

    /// An existing raw record was overwritten.
    #[serde(alias = "MODIFY")]
    Modify,

    /// A raw record was deleted. Not aggregable; dropped before grouping.
    #[serde(alias = "REMOVE")]
    Remove,

    /// Any other kind. Dropped before grouping.
    #[serde(other)]
    Other,
}

impl EventKind {
    /// Whether events of this kind contribute to aggregates.
    #[must_use]
    pub const fn is_aggregable(self) -> bool {
        matches!(self, Self::Insert | Self::Modify)
    }
}

/// The post-change image of one raw record, pre-aggregated per category by
/// the upstream writer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmissionImage {
    /// Per-category volume totals.
    #[serde(default)]
    pub volumes: BTreeMap<Category, Decimal>,

    /// Per-category repetition totals.
    #[serde(default)]
    pub reps: BTreeMap<Category, i64>,
}

/// One change event from the raw-record log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// What happened to the record.
    pub kind: EventKind,

    /// The identity the record belongs to.
    pub identity: Identity,

    /// The record's post-change image.
    #[serde(alias = "newImage")]
    pub new_image: SubmissionImage,
}

/// An unprocessed batch of change events, in arrival order.
#[derive(Debug)]
pub struct Batch {
    events: Vec<ChangeEvent>,
}

impl Batch {
    /// Wraps a sequence of change events.
    #[must_use]
    pub const fn new(events: Vec<ChangeEvent>) -> Self {
        Self { events }
    }

    /// Number of events in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the batch carries no events.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Partitions the batch by identity, preserving arrival order within
    /// each group and dropping non-aggregable events.
    #[must_use]
    pub fn group(self) -> Grouped {
        let events_seen = self.events.len();
        let mut groups: BTreeMap<Identity, Vec<SubmissionImage>> = BTreeMap::new();
        let mut events_dropped = 0;

        for event in self.events {
            if event.kind.is_aggregable() {
                groups.entry(event.identity).or_default().push(event.new_image);
            } else {
                events_dropped += 1;
            }
        }

        Grouped {
            groups,
            events_seen,
            events_dropped,
        }
    }
}

/// Events partitioned into per-identity groups.
#[derive(Debug)]
pub struct Grouped {
    groups: BTreeMap<Identity, Vec<SubmissionImage>>,
    events_seen: usize,
    events_dropped: usize,
}

impl Grouped {
    /// Number of distinct identities in the batch.
    #[must_use]
    pub fn identity_count(&self) -> usize {
        self.groups.len()
    }

    /// Folds each identity's events, in arrival order, into one
    /// consolidated delta set.
    #[must_use]
    pub fn merge(self) -> Consolidated {
        let deltas = self
            .groups
            .into_iter()
            .map(|(identity, images)| {
                let mut set = DeltaSet::default();
                for image in &images {
                    merge_image(&mut set, image);
                }
                (identity, set)
            })
            .collect();

        Consolidated {
            deltas,
            events_seen: self.events_seen,
            events_dropped: self.events_dropped,
        }
    }
}

/// Folds one image into a delta set, covering categories that appear in
/// either map. A category with a volume but no repetition entry (or the
/// reverse) contributes zero for the missing half rather than poisoning the
/// batch.
fn merge_image(set: &mut DeltaSet, image: &SubmissionImage) {
    for (category, volume) in &image.volumes {
        let reps = image.reps.get(category).copied().unwrap_or(0);
        set.add(category, *volume, reps);
    }
    for (category, reps) in &image.reps {
        if !image.volumes.contains_key(category) {
            set.add(category, Decimal::ZERO, *reps);
        }
    }
}

/// One consolidated delta set per identity, ready for application.
///
/// Cross-identity application order is unspecified; iteration over the map
/// is deterministic but not contractual.
#[derive(Debug)]
pub struct Consolidated {
    /// Consolidated deltas keyed by identity.
    pub deltas: BTreeMap<Identity, DeltaSet>,

    /// Events present in the original batch.
    pub events_seen: usize,

    /// Events dropped for having a non-aggregable kind.
    pub events_dropped: usize,
}
