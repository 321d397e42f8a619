//! Typed place persistence over any `RecordStore`.
//!
//! # Responsibility
//! - Encode/decode `Place` documents in the `places` collection.
//! - Turn the store's `NotFound` into `None`; every other failure propagates.
//!
//! # Invariants
//! - A place is always saved under `identity_key(place)`.

use crate::model::identity::identity_key;
use crate::model::place::Place;
use crate::repo::record_store::{RecordStore, StoreError, StoreResult};

/// Collection holding every imported place.
pub const PLACES_COLLECTION: &str = "places";

pub struct PlaceRepository<S: RecordStore> {
    store: S,
}

impl<S: RecordStore> PlaceRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Loads the place stored under `key`, or `None` when absent.
    pub fn find(&self, key: &str) -> StoreResult<Option<Place>> {
        match self.store.get(PLACES_COLLECTION, key) {
            Ok(body) => decode_place(key, &body).map(Some),
            Err(StoreError::NotFound { .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Writes `place` under its identity key and returns that key.
    pub fn save(&self, place: &Place) -> StoreResult<String> {
        let key = identity_key(place);
        let body = serde_json::to_string_pretty(place).map_err(StoreError::Encode)?;
        self.store.put(PLACES_COLLECTION, &key, &body)?;
        Ok(key)
    }

    /// Loads every stored place in store iteration order.
    pub fn list(&self) -> StoreResult<Vec<Place>> {
        self.store
            .scan(PLACES_COLLECTION)?
            .into_iter()
            .map(|record| decode_place(&record.key, &record.body))
            .collect()
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

fn decode_place(key: &str, body: &str) -> StoreResult<Place> {
    serde_json::from_str(body).map_err(|source| StoreError::Decode {
        key: key.to_string(),
        source,
    })
}
