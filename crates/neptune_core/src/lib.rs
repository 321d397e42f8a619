//! Core domain logic for the Neptune place importer.
//! Readers, enrichment, persistence and reporting live here; the CLI only
//! wires configuration into these components.

pub mod config;
pub mod db;
pub mod ingest;
pub mod logging;
pub mod lookup;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, NeptuneConfig, StoreBackend};
pub use ingest::{CsvColumns, CsvReader, GeoJsonReader, InputFormat, ParseError, PlaceReader};
pub use logging::{
    default_log_level, flush_logging, init_logging, logging_status, LoggingError,
};
pub use lookup::{
    GoogleMapsClient, HttpPageFetcher, LookupError, PageFetcher, PlacesApi, ProviderPlace, Route,
};
pub use model::identity::{identity_key, identity_key_for};
pub use model::place::{Bounds, Geometry, LatLng, Place};
pub use repo::json_store::JsonDirStore;
pub use repo::memory_store::MemoryStore;
pub use repo::place_repo::{PlaceRepository, PLACES_COLLECTION};
pub use repo::record_store::{RecordStore, StoreError, StoreResult, StoredRecord};
pub use repo::sqlite_store::SqliteRecordStore;
pub use service::export_service::{
    render_text, CategoryGroup, ExportError, ExportOptions, ExportService,
};
pub use service::import_service::{ImportError, ImportService, ImportSummary};
pub use service::reconcile::{reconcile, Reconciled};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
