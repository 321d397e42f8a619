//! SQLite file backing the `sqlite` store backend.
//!
//! # Responsibility
//! - Open the store file (or an in-memory store) ready for `SqliteRecordStore`.
//! - Bring the `records` schema up to date before any record is touched.
//!
//! # Invariants
//! - The applied schema version lives in `PRAGMA user_version`.
//! - A store written by a newer binary is refused, never downgraded.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    /// The directory that should hold the store file could not be created.
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Migration `version` failed; the store keeps its previous version.
    Migration {
        version: u32,
        source: rusqlite::Error,
    },
    /// The store file carries a schema this binary does not know.
    SchemaTooNew { found: u32, supported: u32 },
    Sqlite(rusqlite::Error),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CreateDir { path, source } => {
                write!(f, "cannot create store directory {}: {source}", path.display())
            }
            Self::Migration { version, source } => {
                write!(f, "store migration {version} failed: {source}")
            }
            Self::SchemaTooNew { found, supported } => write!(
                f,
                "store was written with schema {found}, this build supports up to {supported}"
            ),
            Self::Sqlite(err) => write!(f, "sqlite store: {err}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::CreateDir { source, .. } => Some(source),
            Self::Migration { source, .. } => Some(source),
            Self::SchemaTooNew { .. } => None,
            Self::Sqlite(err) => Some(err),
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
