//! Persistence layer: record store contract, backends and typed access.
//!
//! # Responsibility
//! - Define the `RecordStore` capability (`put`/`get`/`scan`).
//! - Provide flat-file, SQLite and in-memory backends.
//! - Map `Place` values to and from stored JSON documents.
//!
//! # Invariants
//! - Store APIs return `NotFound` distinctly from transport/decoding errors.

pub mod json_store;
pub mod memory_store;
pub mod place_repo;
pub mod record_store;
pub mod sqlite_store;
