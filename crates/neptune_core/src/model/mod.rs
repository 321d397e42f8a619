//! Domain model for imported places.
//!
//! # Responsibility
//! - Define the single domain entity (`Place`) shared by readers, stores,
//!   enrichment and reporting.
//! - Derive the stable identity key used as the storage key.
//!
//! # Invariants
//! - Every persisted place is addressed by `identity_key(place)`.

pub mod identity;
pub mod place;
