//! SQLite-backed record store.
//!
//! # Responsibility
//! - Persist JSON documents as rows of the `records` table.
//!
//! # Invariants
//! - `(collection, key)` is the primary key; `put` upserts.
//! - The connection must come from `db::open_db*` so migrations are applied.

use crate::repo::record_store::{
    validate_segment, RecordStore, StoreError, StoreResult, StoredRecord,
};
use rusqlite::{params, Connection, OptionalExtension};

pub struct SqliteRecordStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRecordStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl RecordStore for SqliteRecordStore<'_> {
    fn put(&self, collection: &str, key: &str, body: &str) -> StoreResult<()> {
        validate_segment(collection)?;
        validate_segment(key)?;
        self.conn.execute(
            "INSERT INTO records (collection, key, body)
             VALUES (?1, ?2, ?3)
             ON CONFLICT (collection, key) DO UPDATE SET
                body = excluded.body,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![collection, key, body],
        )?;
        Ok(())
    }

    fn get(&self, collection: &str, key: &str) -> StoreResult<String> {
        validate_segment(collection)?;
        validate_segment(key)?;
        let body = self
            .conn
            .query_row(
                "SELECT body FROM records WHERE collection = ?1 AND key = ?2;",
                params![collection, key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        body.ok_or_else(|| StoreError::NotFound {
            collection: collection.to_string(),
            key: key.to_string(),
        })
    }

    fn scan(&self, collection: &str) -> StoreResult<Vec<StoredRecord>> {
        validate_segment(collection)?;
        let mut stmt = self
            .conn
            .prepare("SELECT key, body FROM records WHERE collection = ?1 ORDER BY key ASC;")?;
        let rows = stmt.query_map(params![collection], |row| {
            Ok(StoredRecord {
                key: row.get(0)?,
                body: row.get(1)?,
            })
        })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }
}
