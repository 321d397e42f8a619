//! Flat-file JSON record store.
//!
//! # Responsibility
//! - Persist one JSON document per key at `<root>/<collection>/<key>.json`.
//!
//! # Invariants
//! - Writes go to a hidden temp file in the same directory and are renamed
//!   into place, so readers never observe a half-written document.
//! - A missing collection directory scans as empty.

use crate::repo::record_store::{
    validate_segment, RecordStore, StoreError, StoreResult, StoredRecord,
};
use log::debug;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use uuid::Uuid;

const RECORD_EXTENSION: &str = "json";

/// Directory-backed store; each collection is a subdirectory of `root`.
#[derive(Debug, Clone)]
pub struct JsonDirStore {
    root: PathBuf,
}

impl JsonDirStore {
    /// Creates a store rooted at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|source| StoreError::Io {
            path: root.clone(),
            source,
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn collection_dir(&self, collection: &str) -> StoreResult<PathBuf> {
        validate_segment(collection)?;
        Ok(self.root.join(collection))
    }

    fn record_path(&self, collection: &str, key: &str) -> StoreResult<PathBuf> {
        validate_segment(key)?;
        Ok(self
            .collection_dir(collection)?
            .join(format!("{key}.{RECORD_EXTENSION}")))
    }
}

impl RecordStore for JsonDirStore {
    fn put(&self, collection: &str, key: &str, body: &str) -> StoreResult<()> {
        let dir = self.collection_dir(collection)?;
        let final_path = self.record_path(collection, key)?;
        fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            path: dir.clone(),
            source,
        })?;

        let temp_path = dir.join(format!(".{key}.{}.tmp", Uuid::new_v4().simple()));
        fs::write(&temp_path, body).map_err(|source| StoreError::Io {
            path: temp_path.clone(),
            source,
        })?;
        if let Err(source) = fs::rename(&temp_path, &final_path) {
            let _ = fs::remove_file(&temp_path);
            return Err(StoreError::Io {
                path: final_path,
                source,
            });
        }

        debug!("event=store_put module=json_store status=ok collection={collection} key={key}");
        Ok(())
    }

    fn get(&self, collection: &str, key: &str) -> StoreResult<String> {
        let path = self.record_path(collection, key)?;
        match fs::read_to_string(&path) {
            Ok(body) => Ok(body),
            Err(err) if err.kind() == ErrorKind::NotFound => Err(StoreError::NotFound {
                collection: collection.to_string(),
                key: key.to_string(),
            }),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }

    fn scan(&self, collection: &str) -> StoreResult<Vec<StoredRecord>> {
        let dir = self.collection_dir(collection)?;
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(StoreError::Io { path: dir, source }),
        };

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| StoreError::Io {
                path: dir.clone(),
                source,
            })?;
            let path = entry.path();
            let is_record = path.extension().is_some_and(|ext| ext == RECORD_EXTENSION)
                && !entry.file_name().to_string_lossy().starts_with('.');
            if is_record {
                paths.push(path);
            }
        }
        paths.sort();

        let mut records = Vec::with_capacity(paths.len());
        for path in paths {
            let key = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default();
            let body = fs::read_to_string(&path).map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;
            records.push(StoredRecord { key, body });
        }
        Ok(records)
    }
}
