//! Reconciliation of imported places with stored ones.
//!
//! # Invariants
//! - A new place is stored verbatim.
//! - A merge keeps every field of the stored place and appends the incoming
//!   tags in order. Duplicates accumulate; nothing is deduplicated.

use crate::model::place::Place;

/// Result of reconciling one incoming place.
#[derive(Debug, Clone, PartialEq)]
pub enum Reconciled {
    /// No stored place existed; the incoming record is stored as-is.
    Created(Place),
    /// The stored place absorbed the incoming tags.
    Merged(Place),
}

impl Reconciled {
    pub fn place(&self) -> &Place {
        match self {
            Self::Created(place) | Self::Merged(place) => place,
        }
    }

    pub fn into_place(self) -> Place {
        match self {
            Self::Created(place) | Self::Merged(place) => place,
        }
    }

    pub fn is_merge(&self) -> bool {
        matches!(self, Self::Merged(_))
    }
}

/// Merges `incoming` into `existing` (if any).
pub fn reconcile(existing: Option<Place>, incoming: Place) -> Reconciled {
    match existing {
        None => Reconciled::Created(incoming),
        Some(mut stored) => {
            stored.tags.extend(incoming.tags);
            Reconciled::Merged(stored)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{reconcile, Reconciled};
    use crate::model::place::{Geometry, Place};

    fn tagged(name: &str, address: &str, tags: &[&str]) -> Place {
        Place {
            tags: tags.iter().map(|tag| tag.to_string()).collect(),
            ..Place::new(name, address)
        }
    }

    #[test]
    fn absent_existing_stores_incoming_verbatim() {
        let incoming = tagged("A", "1 Main St", &["y"]);
        assert_eq!(
            reconcile(None, incoming.clone()),
            Reconciled::Created(incoming)
        );
    }

    #[test]
    fn merge_appends_tags_and_preserves_identity_fields() {
        let existing = tagged("A", "1 Main St", &["x"]);
        let incoming = tagged("A", "1 Main St", &["y"]);

        let merged = reconcile(Some(existing), incoming);

        assert!(merged.is_merge());
        let place = merged.into_place();
        assert_eq!(place.name, "A");
        assert_eq!(place.formatted_address, "1 Main St");
        assert_eq!(place.tags, vec!["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn merge_does_not_overwrite_stored_provider_fields() {
        let mut existing = tagged("A", "1 Main St", &[]);
        existing.external_id = "ChIJstored".to_string();
        existing.categories = vec!["museum".to_string()];
        let mut incoming = tagged("A", "1 Main St", &["z"]);
        incoming.external_id = "ChIJincoming".to_string();
        incoming.geometry = Some(Geometry::point(1.0, 1.0));

        let place = reconcile(Some(existing), incoming).into_place();

        assert_eq!(place.external_id, "ChIJstored");
        assert_eq!(place.categories, vec!["museum".to_string()]);
        assert!(place.geometry.is_none());
        assert_eq!(place.tags, vec!["z".to_string()]);
    }
}
