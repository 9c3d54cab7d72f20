//! Submission data model and validation.
//!
//! A raw submission is one user's workout for one reporting day: an ordered
//! list of set entries plus per-category totals derived from them. The
//! derived totals are what the rest of the engine operates on; the original
//! entry list is kept verbatim so a later resubmission can be diffed against
//! exactly what was stored.
//!
//! Validation is fail-fast: a submission that fails any rule is rejected
//! before delta computation and nothing is mutated.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reserved aggregate key holding the cross-category grand total.
///
/// Submissions may not use this as an exercise name; the aggregate store
/// keeps the running grand total under it.
pub const GRAND_TOTAL_KEY: &str = "total_lifted";

/// Upper bound on a single entry's weight.
pub const MAX_WEIGHT: u32 = 10_000;

/// Upper bound on a single entry's repetitions.
pub const MAX_REPS: u32 = 1_000;

/// Errors produced when a submission fails validation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ValidationError {
    /// The identity was missing or blank.
    #[error("identity is required")]
    MissingIdentity,

    /// The period was not a real `YYYY-MM-DD` calendar date.
    #[error("invalid period '{value}': expected a YYYY-MM-DD calendar date")]
    InvalidPeriod {
        /// The value that failed to parse.
        value: String,
    },

    /// An entry had a missing or blank exercise name.
    #[error("exercise name is required")]
    EmptyCategory,

    /// An entry used the reserved grand-total key as its exercise name.
    #[error("'{name}' is a reserved category name")]
    ReservedCategory {
        /// The offending name.
        name: String,
    },

    /// An entry's weight was negative or implausibly large.
    #[error("weight {weight} for '{category}' is out of range (0..={MAX_WEIGHT})")]
    WeightOutOfRange {
        /// The exercise name the entry was for.
        category: String,
        /// The rejected weight.
        weight: Decimal,
    },

    /// An entry's repetitions were negative or implausibly large.
    #[error("reps {reps} for '{category}' are out of range (0..={MAX_REPS})")]
    RepsOutOfRange {
        /// The exercise name the entry was for.
        category: String,
        /// The rejected repetition count.
        reps: i64,
    },
}

/// Opaque user key partitioning all raw and aggregate data.
///
/// Identities are trimmed and lower-cased on construction (email-style
/// keys), so two spellings of the same account compare equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identity(String);

impl Identity {
    /// Parses and normalizes an identity.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingIdentity`] if the value is blank.
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        let normalized = value.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(ValidationError::MissingIdentity);
        }
        Ok(Self(normalized))
    }

    /// The normalized key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Identity {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Identity> for String {
    fn from(value: Identity) -> Self {
        value.0
    }
}

/// The reporting window (one calendar day) a raw submission belongs to.
///
/// Exactly one raw record exists per identity and period; resubmitting the
/// same day replaces the record wholesale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Period(NaiveDate);

impl Period {
    /// Parses a `YYYY-MM-DD` date string.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidPeriod`] if the value is not a real
    /// calendar date in that format.
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
            .map(Self)
            .map_err(|_| ValidationError::InvalidPeriod {
                value: value.to_string(),
            })
    }

    /// The underlying calendar date.
    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        self.0
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl TryFrom<String> for Period {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Period> for String {
    fn from(value: Period) -> Self {
        value.to_string()
    }
}

/// A case-normalized exercise name.
///
/// The set of categories is open: new names create new aggregate rows on
/// first contribution. The reserved grand-total key cannot be parsed as a
/// category; it is only produced internally via [`Category::grand_total`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Category(String);

impl Category {
    /// Parses and normalizes an exercise name.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is blank or reserved.
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        let normalized = value.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(ValidationError::EmptyCategory);
        }
        if normalized == GRAND_TOTAL_KEY {
            return Err(ValidationError::ReservedCategory { name: normalized });
        }
        Ok(Self(normalized))
    }

    /// The reserved grand-total aggregate key.
    #[must_use]
    pub fn grand_total() -> Self {
        Self(GRAND_TOTAL_KEY.to_string())
    }

    /// Whether this is the reserved grand-total key.
    #[must_use]
    pub fn is_grand_total(&self) -> bool {
        self.0 == GRAND_TOTAL_KEY
    }

    /// The normalized name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Reconstructs a category from a stored aggregate row.
    ///
    /// Unlike [`Category::parse`] this accepts the reserved grand-total key,
    /// which legitimately appears as a row key in the aggregate store.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored name is blank.
    pub fn from_stored(value: &str) -> Result<Self, ValidationError> {
        if value == GRAND_TOTAL_KEY {
            return Ok(Self::grand_total());
        }
        Self::parse(value)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Category {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Category> for String {
    fn from(value: Category) -> Self {
        value.0
    }
}

/// One set entry as submitted by the client, prior to validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryInput {
    /// Exercise name.
    #[serde(alias = "exercise")]
    pub name: String,

    /// Weight moved per repetition.
    pub weight: Decimal,

    /// Number of repetitions.
    pub reps: i64,
}

/// A validated set entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetEntry {
    /// Normalized exercise name.
    pub category: Category,

    /// Weight moved per repetition.
    pub weight: Decimal,

    /// Number of repetitions.
    pub reps: u32,
}

impl SetEntry {
    /// Validates a raw entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is blank or reserved, or the weight or
    /// repetitions fall outside their plausible ranges.
    pub fn validate(input: &EntryInput) -> Result<Self, ValidationError> {
        let category = Category::parse(&input.name)?;

        if input.weight < Decimal::ZERO || input.weight > Decimal::from(MAX_WEIGHT) {
            return Err(ValidationError::WeightOutOfRange {
                category: category.as_str().to_string(),
                weight: input.weight,
            });
        }
        if input.reps < 0 || input.reps > i64::from(MAX_REPS) {
            return Err(ValidationError::RepsOutOfRange {
                category: category.as_str().to_string(),
                reps: input.reps,
            });
        }

        // Bounds checked above, the cast cannot truncate.
        #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
        let reps = input.reps as u32;

        Ok(Self {
            category,
            weight: input.weight,
            reps,
        })
    }

    /// Volume contributed by this entry (weight × reps).
    #[must_use]
    pub fn volume(&self) -> Decimal {
        self.weight * Decimal::from(self.reps)
    }
}

/// The wire shape of one direct submission: a day's workout for one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionInput {
    /// User key.
    pub identity: String,

    /// Reporting day, `YYYY-MM-DD`.
    #[serde(alias = "date")]
    pub period: String,

    /// Set entries in submitted order.
    #[serde(alias = "exercises")]
    pub entries: Vec<EntryInput>,
}

/// A validated submission with derived per-category totals.
///
/// Owned by (identity, period); fully replaced on resubmission. The
/// `volumes` and `reps` maps always carry the same key set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSubmission {
    /// User key.
    pub identity: Identity,

    /// Reporting day.
    pub period: Period,

    /// Set entries in submitted order.
    pub entries: Vec<SetEntry>,

    /// Derived per-category volume (weight × reps summed per category).
    pub volumes: BTreeMap<Category, Decimal>,

    /// Derived per-category repetition totals.
    pub reps: BTreeMap<Category, i64>,

    /// Derived grand-total volume across all entries.
    pub total_volume: Decimal,
}

impl RawSubmission {
    /// Builds a submission from validated entries, deriving the totals.
    ///
    /// Multiple entries for the same category are additive, not
    /// overwriting.
    #[must_use]
    pub fn new(identity: Identity, period: Period, entries: Vec<SetEntry>) -> Self {
        let mut volumes: BTreeMap<Category, Decimal> = BTreeMap::new();
        let mut reps: BTreeMap<Category, i64> = BTreeMap::new();
        let mut total_volume = Decimal::ZERO;

        for entry in &entries {
            let volume = entry.volume();
            total_volume += volume;
            *volumes.entry(entry.category.clone()).or_insert(Decimal::ZERO) += volume;
            *reps.entry(entry.category.clone()).or_insert(0) += i64::from(entry.reps);
        }

        Self {
            identity,
            period,
            entries,
            volumes,
            reps,
            total_volume,
        }
    }

    /// Validates a raw submission input end to end.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure; nothing is partially accepted.
    pub fn validate(input: &SubmissionInput) -> Result<Self, ValidationError> {
        let identity = Identity::parse(&input.identity)?;
        let period = Period::parse(&input.period)?;
        let entries = input
            .entries
            .iter()
            .map(SetEntry::validate)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(identity, period, entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, weight: &str, reps: i64) -> EntryInput {
        EntryInput {
            name: name.to_string(),
            weight: weight.parse().expect("test weight"),
            reps,
        }
    }

    #[test]
    fn identity_is_trimmed_and_lowercased() {
        let id = Identity::parse("  Alice@Example.COM ").expect("valid identity");
        assert_eq!(id.as_str(), "alice@example.com");
    }

    #[test]
    fn blank_identity_is_rejected() {
        assert!(matches!(
            Identity::parse("   "),
            Err(ValidationError::MissingIdentity)
        ));
    }

    #[test]
    fn period_requires_real_calendar_date() {
        assert!(Period::parse("2026-02-28").is_ok());
        assert!(matches!(
            Period::parse("2026-02-30"),
            Err(ValidationError::InvalidPeriod { .. })
        ));
        assert!(matches!(
            Period::parse("Feb 3"),
            Err(ValidationError::InvalidPeriod { .. })
        ));
    }

    #[test]
    fn category_normalization() {
        let cat = Category::parse(" Squat ").expect("valid category");
        assert_eq!(cat.as_str(), "squat");
    }

    #[test]
    fn reserved_category_is_rejected() {
        assert!(matches!(
            Category::parse("Total_Lifted"),
            Err(ValidationError::ReservedCategory { .. })
        ));
        assert!(Category::from_stored(GRAND_TOTAL_KEY)
            .expect("stored grand total")
            .is_grand_total());
    }

    #[test]
    fn entry_bounds() {
        assert!(SetEntry::validate(&entry("squat", "0", 0)).is_ok());
        assert!(matches!(
            SetEntry::validate(&entry("squat", "-1", 5)),
            Err(ValidationError::WeightOutOfRange { .. })
        ));
        assert!(matches!(
            SetEntry::validate(&entry("squat", "10001", 5)),
            Err(ValidationError::WeightOutOfRange { .. })
        ));
        assert!(matches!(
            SetEntry::validate(&entry("squat", "100", -1)),
            Err(ValidationError::RepsOutOfRange { .. })
        ));
        assert!(matches!(
            SetEntry::validate(&entry("squat", "100", 1001)),
            Err(ValidationError::RepsOutOfRange { .. })
        ));
    }

    #[test]
    fn duplicate_categories_accumulate() {
        let input = SubmissionInput {
            identity: "alice@example.com".to_string(),
            period: "2026-08-01".to_string(),
            entries: vec![
                entry("Squat", "100", 5),
                entry("squat", "120", 3),
                entry("bench", "50.5", 10),
            ],
        };
        let submission = RawSubmission::validate(&input).expect("valid submission");

        let squat = Category::parse("squat").expect("category");
        let bench = Category::parse("bench").expect("category");

        assert_eq!(submission.volumes[&squat], "860".parse().unwrap());
        assert_eq!(submission.reps[&squat], 8);
        assert_eq!(submission.volumes[&bench], "505".parse().unwrap());
        assert_eq!(submission.reps[&bench], 10);
        assert_eq!(submission.total_volume, "1365".parse().unwrap());
        assert_eq!(submission.entries.len(), 3);
    }

    #[test]
    fn empty_entry_list_is_valid_and_zero() {
        let input = SubmissionInput {
            identity: "alice@example.com".to_string(),
            period: "2026-08-01".to_string(),
            entries: vec![],
        };
        let submission = RawSubmission::validate(&input).expect("empty submission");
        assert!(submission.volumes.is_empty());
        assert_eq!(submission.total_volume, Decimal::ZERO);
    }

    #[test]
    fn input_aliases_match_original_wire_shape() {
        let json = r#"{
            "identity": "Alice@Example.com",
            "date": "2026-08-01",
            "exercises": [{"exercise": "Squat", "weight": 102.5, "reps": 5}]
        }"#;
        let input: SubmissionInput = serde_json::from_str(json).expect("parse input");
        let submission = RawSubmission::validate(&input).expect("valid submission");
        assert_eq!(submission.identity.as_str(), "alice@example.com");
        assert_eq!(submission.total_volume, "512.5".parse().unwrap());
    }
}
