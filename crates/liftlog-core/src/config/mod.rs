//! Engine configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file could not be parsed.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Locations of the engine's durable stores and batch limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Path to the raw-record database.
    #[serde(default = "default_raw_db_path")]
    pub raw_db_path: PathBuf,

    /// Path to the aggregates database.
    #[serde(default = "default_aggregate_db_path")]
    pub aggregate_db_path: PathBuf,

    /// Largest change-event batch a single ingest run accepts.
    #[serde(default = "default_max_batch_len")]
    pub max_batch_len: usize,
}

fn default_raw_db_path() -> PathBuf {
    PathBuf::from("liftlog-raw.db")
}

fn default_aggregate_db_path() -> PathBuf {
    PathBuf::from("liftlog-aggregates.db")
}

// Matches the largest batch the upstream change stream delivers.
fn default_max_batch_len() -> usize {
    1000
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            raw_db_path: default_raw_db_path(),
            aggregate_db_path: default_aggregate_db_path(),
            max_batch_len: default_max_batch_len(),
        }
    }
}

impl EngineConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = EngineConfig::from_toml("").expect("parse");
        assert_eq!(config.raw_db_path, PathBuf::from("liftlog-raw.db"));
        assert_eq!(
            config.aggregate_db_path,
            PathBuf::from("liftlog-aggregates.db")
        );
        assert_eq!(config.max_batch_len, 1000);
    }

    #[test]
    fn max_batch_len_is_overridable() {
        let config = EngineConfig::from_toml("max_batch_len = 25").expect("parse");
        assert_eq!(config.max_batch_len, 25);
        assert_eq!(config.raw_db_path, PathBuf::from("liftlog-raw.db"));
    }

    #[test]
    fn paths_are_overridable() {
        let config = EngineConfig::from_toml(
            r#"
            raw_db_path = "/var/lib/liftlog/raw.db"
            aggregate_db_path = "/var/lib/liftlog/agg.db"
            "#,
        )
        .expect("parse");
        assert_eq!(config.raw_db_path, PathBuf::from("/var/lib/liftlog/raw.db"));
    }

    #[test]
    fn unknown_keys_are_rejected_by_shape() {
        // toml is permissive about extra keys by default; a typo in a path
        // key falls back to the default rather than failing. Guard the
        // defaults so that behavior stays visible.
        let config = EngineConfig::from_toml("raw_db_pth = \"oops.db\"").expect("parse");
        assert_eq!(config.raw_db_path, PathBuf::from("liftlog-raw.db"));
    }
}
