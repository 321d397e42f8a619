//! Key-value record store contract.
//!
//! # Responsibility
//! - Persist and retrieve self-describing JSON documents by collection and key.
//! - Keep backend details (files, SQLite, memory) behind one trait.
//!
//! # Invariants
//! - `get` reports a missing key as `StoreError::NotFound` and nothing else.
//! - `put` replaces any existing document under the same key.
//! - `scan` order is backend-defined; callers must not rely on it.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub type StoreResult<T> = Result<T, StoreError>;

/// Store error for persistence and decoding failures.
#[derive(Debug)]
pub enum StoreError {
    /// No document exists under `collection/key`.
    NotFound { collection: String, key: String },
    /// Collection or key is empty or not path-safe.
    InvalidKey(String),
    Io { path: PathBuf, source: std::io::Error },
    Db(DbError),
    Encode(serde_json::Error),
    Decode { key: String, source: serde_json::Error },
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { collection, key } => {
                write!(f, "record not found: {collection}/{key}")
            }
            Self::InvalidKey(value) => write!(f, "invalid record key: `{value}`"),
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
            Self::Db(err) => write!(f, "{err}"),
            Self::Encode(err) => write!(f, "failed to encode record: {err}"),
            Self::Decode { key, source } => write!(f, "failed to decode record {key}: {source}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Db(err) => Some(err),
            Self::Encode(err) => Some(err),
            Self::Decode { source, .. } => Some(source),
            Self::NotFound { .. } | Self::InvalidKey(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// One raw document returned by `scan`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
    pub key: String,
    pub body: String,
}

/// Persistence capability: `put`, `get`, `scan` over JSON documents.
pub trait RecordStore {
    fn put(&self, collection: &str, key: &str, body: &str) -> StoreResult<()>;
    fn get(&self, collection: &str, key: &str) -> StoreResult<String>;
    fn scan(&self, collection: &str) -> StoreResult<Vec<StoredRecord>>;
}

impl<T: RecordStore + ?Sized> RecordStore for &T {
    fn put(&self, collection: &str, key: &str, body: &str) -> StoreResult<()> {
        (**self).put(collection, key, body)
    }

    fn get(&self, collection: &str, key: &str) -> StoreResult<String> {
        (**self).get(collection, key)
    }

    fn scan(&self, collection: &str) -> StoreResult<Vec<StoredRecord>> {
        (**self).scan(collection)
    }
}

impl<T: RecordStore + ?Sized> RecordStore for Box<T> {
    fn put(&self, collection: &str, key: &str, body: &str) -> StoreResult<()> {
        (**self).put(collection, key, body)
    }

    fn get(&self, collection: &str, key: &str) -> StoreResult<String> {
        (**self).get(collection, key)
    }

    fn scan(&self, collection: &str) -> StoreResult<Vec<StoredRecord>> {
        (**self).scan(collection)
    }
}

/// Rejects empty segments and anything that could escape a directory.
pub(crate) fn validate_segment(value: &str) -> StoreResult<()> {
    let bad = value.is_empty()
        || value == "."
        || value == ".."
        || value.starts_with('.')
        || value.contains(['/', '\\', '\0']);
    if bad {
        return Err(StoreError::InvalidKey(value.to_string()));
    }
    Ok(())
}
