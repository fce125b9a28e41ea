//! Store and session configuration.
//!
//! # Responsibility
//! - Describe where the document database lives and which collection the
//!   screen binds to.
//! - Resolve the database path from the environment for FFI/CLI callers.
//!
//! # Invariants
//! - Collection names are non-empty and limited to `[a-z0-9_-]`.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

/// Collection bound by the entry screen unless configured otherwise.
pub const DEFAULT_COLLECTION: &str = "entries";
/// Environment variable overriding the database file path.
pub const DB_PATH_ENV: &str = "ENTRYSYNC_DB_PATH";
const DEFAULT_DB_FILE_NAME: &str = "entrysync.sqlite3";

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidCollection(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidCollection(value) => {
                write!(f, "collection name is invalid: `{value}`")
            }
        }
    }
}

impl Error for ConfigError {}

/// Backing location for the document database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbLocation {
    File(PathBuf),
    Memory,
}

/// Store configuration used by `LocalStoreClient::open`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub collection: String,
    pub location: DbLocation,
}

impl StoreConfig {
    /// In-memory database bound to the default collection.
    pub fn in_memory() -> Self {
        Self {
            collection: DEFAULT_COLLECTION.to_string(),
            location: DbLocation::Memory,
        }
    }

    /// File-backed database bound to the default collection.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            collection: DEFAULT_COLLECTION.to_string(),
            location: DbLocation::File(path.into()),
        }
    }

    /// File-backed database at `ENTRYSYNC_DB_PATH`, or a file under the
    /// system temp dir when the variable is unset or blank.
    pub fn from_env() -> Self {
        Self::file(resolve_db_path())
    }

    /// Replaces the collection name after validating it.
    pub fn with_collection(mut self, collection: &str) -> Result<Self, ConfigError> {
        let normalized = collection.trim();
        if !is_valid_collection_name(normalized) {
            return Err(ConfigError::InvalidCollection(collection.to_string()));
        }
        self.collection = normalized.to_string();
        Ok(self)
    }
}

/// Resolves the database file path from the environment.
pub fn resolve_db_path() -> PathBuf {
    db_path_or_default(std::env::var(DB_PATH_ENV).ok().as_deref())
}

fn db_path_or_default(raw: Option<&str>) -> PathBuf {
    match raw.map(str::trim) {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => std::env::temp_dir().join(DEFAULT_DB_FILE_NAME),
    }
}

fn is_valid_collection_name(value: &str) -> bool {
    if value.is_empty() {
        return false;
    }
    value
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
}
