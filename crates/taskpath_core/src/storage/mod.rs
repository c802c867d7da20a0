//! Abstract key-value storage backend and its implementations.
//!
//! # Responsibility
//! - Define the storage seam the stores persist collection blobs through.
//! - Keep backend details (SQLite, in-memory map) behind one trait.
//!
//! # Invariants
//! - Values are opaque strings; interpretation belongs to the repo layer.
//! - A backend must be fully bootstrapped before the first read or write.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod memory;
mod sqlite;

pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;

pub type StorageResult<T> = Result<T, StorageError>;

/// Errors from storage backend operations.
#[derive(Debug)]
pub enum StorageError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "storage schema version {db_version} is newer than supported {latest_supported}"
            ),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Keys under which core collections are persisted.
pub mod keys {
    pub const ACTIVE_TASKS: &str = "tasks.active";
    pub const ARCHIVED_TASKS: &str = "tasks.archived";
    pub const CATEGORIES: &str = "categories";
    pub const SETTINGS: &str = "settings";
}

/// Key-value storage seam.
///
/// Receivers are `&self`: the execution model is single-threaded
/// run-to-completion, and implementations use interior mutability where the
/// underlying handle requires it.
pub trait StorageBackend {
    fn get(&self, key: &str) -> StorageResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;
    fn remove(&self, key: &str) -> StorageResult<()>;
}
