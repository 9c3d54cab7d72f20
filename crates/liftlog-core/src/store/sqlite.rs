//! `SQLite`-backed store implementations.
//!
//! Both stores use WAL mode so reads proceed while a write is in progress.
//! Raw submissions are stored as a JSON payload keyed by (identity, period);
//! aggregates keep one counter row per (identity, category). Volumes are
//! stored as decimal TEXT and re-parsed on read so precision survives; a
//! bare SQL `ADD` would coerce them to binary floats, so the increment runs
//! the add inside a single immediate transaction instead.

// SQLite returns i64 for counts and timestamps; values never go negative.
// Mutex poisoning indicates a panic in another thread, which is unrecoverable.
#![allow(
    clippy::cast_possible_wrap,
    clippy::cast_possible_truncation,
    clippy::missing_panics_doc
)]

use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::{Connection, OpenFlags, OptionalExtension, TransactionBehavior, params};
use rust_decimal::Decimal;

use super::{AggregateStore, CategoryAggregate, RawStore, StoreError};
use crate::submission::{Category, Identity, Period, RawSubmission};

/// Schema for the raw record store.
const RAW_SCHEMA: &str = r"
-- Latest raw submission per (identity, period)
PRAGMA journal_mode = WAL;
PRAGMA synchronous = NORMAL;
PRAGMA busy_timeout = 5000;

CREATE TABLE IF NOT EXISTS raw_submissions (
    identity TEXT NOT NULL,
    period TEXT NOT NULL,
    payload TEXT NOT NULL,
    updated_at_ns INTEGER NOT NULL,
    PRIMARY KEY (identity, period)
);
";

/// Schema for the aggregate store.
const AGGREGATE_SCHEMA: &str = r"
-- Running counters per (identity, category)
PRAGMA journal_mode = WAL;
PRAGMA synchronous = NORMAL;
PRAGMA busy_timeout = 5000;

CREATE TABLE IF NOT EXISTS aggregates (
    identity TEXT NOT NULL,
    category TEXT NOT NULL,
    total_volume TEXT NOT NULL,
    total_reps INTEGER NOT NULL,
    updated_at_ns INTEGER NOT NULL,
    PRIMARY KEY (identity, category)
);
";

fn now_ns() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as i64)
        .unwrap_or(0)
}

fn open_connection(path: &Path, schema: &str) -> Result<Connection, StoreError> {
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    conn.execute_batch(schema)?;
    Ok(conn)
}

/// Raw record store backed by `SQLite`.
pub struct SqliteRawStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteRawStore {
    /// Opens or creates the store at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = open_connection(path.as_ref(), RAW_SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Creates an in-memory store for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(RAW_SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

impl RawStore for SqliteRawStore {
    fn get(
        &self,
        identity: &Identity,
        period: &Period,
    ) -> Result<Option<RawSubmission>, StoreError> {
        let conn = self.conn.lock().unwrap();

        let payload: Option<String> = conn
            .query_row(
                "SELECT payload FROM raw_submissions WHERE identity = ?1 AND period = ?2",
                params![identity.as_str(), period.to_string()],
                |row| row.get(0),
            )
            .optional()?;

        match payload {
            None => Ok(None),
            Some(payload) => {
                serde_json::from_str(&payload)
                    .map(Some)
                    .map_err(|e| StoreError::Corrupt {
                        key: format!("{identity}/{period}"),
                        details: e.to_string(),
                    })
            },
        }
    }

    fn put(&self, submission: &RawSubmission) -> Result<(), StoreError> {
        let payload = serde_json::to_string(submission).map_err(|e| StoreError::Corrupt {
            key: format!("{}/{}", submission.identity, submission.period),
            details: e.to_string(),
        })?;

        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO raw_submissions (identity, period, payload, updated_at_ns)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (identity, period) DO UPDATE SET
                 payload = excluded.payload,
                 updated_at_ns = excluded.updated_at_ns",
            params![
                submission.identity.as_str(),
                submission.period.to_string(),
                payload,
                now_ns(),
            ],
        )?;
        Ok(())
    }
}

/// Aggregate store backed by `SQLite`.
pub struct SqliteAggregateStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteAggregateStore {
    /// Opens or creates the store at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = open_connection(path.as_ref(), AGGREGATE_SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Creates an in-memory store for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(AGGREGATE_SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

fn parse_volume(identity: &Identity, category: &str, text: &str) -> Result<Decimal, StoreError> {
    Decimal::from_str(text).map_err(|e| StoreError::Corrupt {
        key: format!("{identity}/{category}"),
        details: e.to_string(),
    })
}

fn row_to_aggregate(
    identity: &Identity,
    category: String,
    volume: String,
    reps: i64,
) -> Result<CategoryAggregate, StoreError> {
    let total_volume = parse_volume(identity, &category, &volume)?;
    let category = Category::from_stored(&category).map_err(|e| StoreError::Corrupt {
        key: format!("{identity}/{category}"),
        details: e.to_string(),
    })?;
    Ok(CategoryAggregate {
        category,
        total_volume,
        total_reps: reps,
    })
}

impl AggregateStore for SqliteAggregateStore {
    fn increment(
        &self,
        identity: &Identity,
        category: &Category,
        volume_delta: Decimal,
        reps_delta: i64,
    ) -> Result<(), StoreError> {
        let mut conn = self.conn.lock().unwrap();

        // The decimal add must happen in Rust, so run read + write under an
        // immediate transaction to keep the increment atomic per key.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing: Option<(String, i64)> = tx
            .query_row(
                "SELECT total_volume, total_reps FROM aggregates
                 WHERE identity = ?1 AND category = ?2",
                params![identity.as_str(), category.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let (volume, reps) = match existing {
            None => (volume_delta, reps_delta),
            Some((volume_text, current_reps)) => {
                let current_volume = parse_volume(identity, category.as_str(), &volume_text)?;
                (current_volume + volume_delta, current_reps + reps_delta)
            },
        };

        tx.execute(
            "INSERT INTO aggregates (identity, category, total_volume, total_reps, updated_at_ns)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (identity, category) DO UPDATE SET
                 total_volume = excluded.total_volume,
                 total_reps = excluded.total_reps,
                 updated_at_ns = excluded.updated_at_ns",
            params![
                identity.as_str(),
                category.as_str(),
                volume.to_string(),
                reps,
                now_ns(),
            ],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn get(
        &self,
        identity: &Identity,
        category: &Category,
    ) -> Result<Option<CategoryAggregate>, StoreError> {
        let conn = self.conn.lock().unwrap();

        let row: Option<(String, i64)> = conn
            .query_row(
                "SELECT total_volume, total_reps FROM aggregates
                 WHERE identity = ?1 AND category = ?2",
                params![identity.as_str(), category.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        row.map(|(volume, reps)| {
            row_to_aggregate(identity, category.as_str().to_string(), volume, reps)
        })
        .transpose()
    }

    fn list_all(&self, identity: &Identity) -> Result<Vec<CategoryAggregate>, StoreError> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare(
            "SELECT category, total_volume, total_reps FROM aggregates
             WHERE identity = ?1
             ORDER BY category ASC",
        )?;

        let rows = stmt
            .query_map(params![identity.as_str()], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(category, volume, reps)| row_to_aggregate(identity, category, volume, reps))
            .collect()
    }
}
