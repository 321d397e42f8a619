//! Place domain model.
//!
//! # Responsibility
//! - Define the canonical record produced by readers and persisted by stores.
//! - Provide the field-level overwrite helpers used by enrichment passes.
//!
//! # Invariants
//! - `name` and `formatted_address` are the identity inputs; once a place is
//!   persisted, only `external_id`, `geometry` and `categories` may change
//!   through search enrichment.
//! - `categories[0]` is the primary category used for report grouping.
//! - `tags` keep insertion order and may contain duplicates.
//!
//! # See also
//! - `model::identity` for storage key derivation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Rectangular viewport bounds reported by the lookup provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub northeast: LatLng,
    pub southwest: LatLng,
}

/// Point location plus optional viewport.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub location: LatLng,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewport: Option<Bounds>,
}

impl Geometry {
    /// Creates a point geometry without viewport.
    pub fn point(lat: f64, lng: f64) -> Self {
        Self {
            location: LatLng::new(lat, lng),
            viewport: None,
        }
    }
}

/// Canonical record for one saved location.
///
/// Readers produce partially populated values; enrichment fills in the rest.
/// Every field defaults when absent so older stored records keep loading.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Place {
    /// Display name. Identity input.
    pub name: String,
    /// Canonical postal address. Identity input and search query component.
    pub formatted_address: String,
    /// `None` until a reader or lookup supplies coordinates.
    pub geometry: Option<Geometry>,
    /// Provider-assigned opaque id; empty until enrichment succeeds.
    pub external_id: String,
    /// Provider category tags, primary first.
    pub categories: Vec<String>,
    /// User labels attached at import time.
    pub tags: Vec<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Place {
    /// Creates a place carrying only its identity inputs.
    pub fn new(name: impl Into<String>, formatted_address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            formatted_address: formatted_address.into(),
            ..Self::default()
        }
    }

    /// Returns the primary (first) category, if any.
    pub fn primary_category(&self) -> Option<&str> {
        self.categories.first().map(String::as_str)
    }

    /// Whether a provider id has already been attached.
    pub fn has_external_id(&self) -> bool {
        !self.external_id.is_empty()
    }

    /// Whether any of `wanted` appears in this place's tags.
    pub fn has_any_tag(&self, wanted: &[String]) -> bool {
        self.tags.iter().any(|tag| wanted.contains(tag))
    }
}
