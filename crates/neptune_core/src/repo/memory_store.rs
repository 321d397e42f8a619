//! In-memory record store.
//!
//! Used by tests and by callers that want to run the pipeline without
//! touching disk. Single-threaded; not `Sync`.

use crate::repo::record_store::{
    validate_segment, RecordStore, StoreError, StoreResult, StoredRecord,
};
use std::cell::RefCell;
use std::collections::BTreeMap;

#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RefCell<BTreeMap<String, BTreeMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents held in `collection`.
    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .borrow()
            .get(collection)
            .map_or(0, BTreeMap::len)
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }
}

impl RecordStore for MemoryStore {
    fn put(&self, collection: &str, key: &str, body: &str) -> StoreResult<()> {
        validate_segment(collection)?;
        validate_segment(key)?;
        self.collections
            .borrow_mut()
            .entry(collection.to_string())
            .or_default()
            .insert(key.to_string(), body.to_string());
        Ok(())
    }

    fn get(&self, collection: &str, key: &str) -> StoreResult<String> {
        validate_segment(collection)?;
        validate_segment(key)?;
        self.collections
            .borrow()
            .get(collection)
            .and_then(|records| records.get(key))
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                key: key.to_string(),
            })
    }

    fn scan(&self, collection: &str) -> StoreResult<Vec<StoredRecord>> {
        validate_segment(collection)?;
        Ok(self
            .collections
            .borrow()
            .get(collection)
            .map(|records| {
                records
                    .iter()
                    .map(|(key, body)| StoredRecord {
                        key: key.clone(),
                        body: body.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }
}
