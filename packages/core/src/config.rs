//! Store configuration
//!
//! `StoreConfig` carries everything the database layer needs at open time.
//! Defaults resolve under `~/.marksync/`; each field can be overridden from
//! the environment.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// SQLite's default upper bound on bound parameters per statement
const SQLITE_MAX_VARIABLES: usize = 32766;

/// Widest row the store binds (the `nodes` upsert)
const MAX_PARAMS_PER_ROW: usize = 8;

pub const ENV_DB_PATH: &str = "MARKSYNC_DB_PATH";
pub const ENV_BUSY_TIMEOUT_MS: &str = "MARKSYNC_BUSY_TIMEOUT_MS";
pub const ENV_MAX_BATCH_ROWS: &str = "MARKSYNC_MAX_BATCH_ROWS";

/// Configuration for the libsql-backed store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Database file (created with its parent directories if missing)
    pub database_path: PathBuf,

    /// How long a connection waits on a locked database before failing
    pub busy_timeout_ms: u64,

    /// Rows per multi-row INSERT statement
    pub max_batch_rows: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            busy_timeout_ms: 5000,
            max_batch_rows: 100,
        }
    }
}

impl StoreConfig {
    /// Config for a specific database file, other settings at their defaults
    pub fn for_path(database_path: impl Into<PathBuf>) -> Self {
        Self {
            database_path: database_path.into(),
            ..Default::default()
        }
    }

    /// Defaults overridden by `MARKSYNC_*` environment variables.
    ///
    /// Unparseable numeric values are ignored with a warning.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(path) = env::var(ENV_DB_PATH) {
            if !path.is_empty() {
                config.database_path = PathBuf::from(path);
            }
        }

        if let Some(timeout) = parse_env(ENV_BUSY_TIMEOUT_MS) {
            config.busy_timeout_ms = timeout;
        }

        if let Some(rows) = parse_env(ENV_MAX_BATCH_ROWS) {
            config.max_batch_rows = rows;
        }

        config
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.database_path.as_os_str().is_empty() {
            return Err("database_path cannot be empty".to_string());
        }

        if self.busy_timeout_ms == 0 {
            return Err("busy_timeout_ms must be greater than 0".to_string());
        }

        if self.max_batch_rows == 0 {
            return Err("max_batch_rows must be greater than 0".to_string());
        }

        let limit = SQLITE_MAX_VARIABLES / MAX_PARAMS_PER_ROW;
        if self.max_batch_rows > limit {
            return Err(format!(
                "max_batch_rows cannot exceed {} (SQLite bound parameter limit)",
                limit
            ));
        }

        Ok(())
    }
}

/// `~/.marksync/database/marksync.db`, or a relative path if there is no home
fn default_database_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_default()
        .join(".marksync")
        .join("database")
        .join("marksync.db")
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = env::var(key).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring {}={:?}: not a valid number", key, raw);
            None
        }
    }
}
