//! Schema migrations for the SQLite record store.
//!
//! # Invariants
//! - Versions are strictly increasing and each one is applied at most once.
//! - The applied version is mirrored to `PRAGMA user_version` in the same
//!   transaction as the migration body.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

/// (version, sql) pairs in application order.
const MIGRATIONS: &[(u32, &str)] = &[(1, include_str!("0001_init.sql"))];

/// Returns the latest schema version known by this binary.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |(version, _)| *version)
}

/// Returns the schema version recorded in `conn`.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?)
}

/// Applies every migration newer than the recorded schema version.
///
/// Returns the number of migrations applied.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<usize> {
    let current = schema_version(conn)?;
    let latest = latest_version();
    if current > latest {
        return Err(DbError::SchemaTooNew {
            found: current,
            supported: latest,
        });
    }

    let mut applied = 0;
    for (version, sql) in MIGRATIONS.iter().filter(|(version, _)| *version > current) {
        let migrate = |source| DbError::Migration {
            version: *version,
            source,
        };
        let tx = conn.transaction().map_err(migrate)?;
        tx.execute_batch(sql).map_err(migrate)?;
        tx.pragma_update(None, "user_version", version)
            .map_err(migrate)?;
        tx.commit().map_err(migrate)?;
        info!("event=db_migrate module=db status=ok version={version}");
        applied += 1;
    }

    Ok(applied)
}
