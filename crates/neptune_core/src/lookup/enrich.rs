//! Enrichment passes that fill place fields from the lookup provider.
//!
//! # Responsibility
//! - Search enrichment: resolve `name + address` to exactly one provider place.
//! - Id enrichment: refresh a place from its provider id.
//!
//! # Invariants
//! - Search enrichment never touches `name`/`formatted_address`, so the
//!   identity key of an already persisted place stays valid.
//! - Places that already carry an `external_id` are not searched again.
//! - The first failing place aborts the whole pass.

use crate::lookup::{LookupError, LookupResult, PlacesApi, ProviderPlace};
use crate::model::place::Place;
use log::{debug, info};

/// Builds the free-text query `"<name> <formatted_address>"`.
///
/// # Errors
/// - `MissingField` when the name or the address is empty.
pub fn search_query(place: &Place) -> LookupResult<String> {
    if place.name.is_empty() {
        return Err(LookupError::MissingField {
            field: "name",
            name: place.name.clone(),
        });
    }
    if place.formatted_address.is_empty() {
        return Err(LookupError::MissingField {
            field: "formatted address",
            name: place.name.clone(),
        });
    }
    Ok(format!("{} {}", place.name, place.formatted_address))
}

/// Runs text search for every place without an `external_id`.
///
/// Returns how many places were enriched.
pub fn enrich_by_search<A: PlacesApi>(api: &A, places: &mut [Place]) -> LookupResult<usize> {
    let mut enriched = 0;
    for place in places.iter_mut() {
        if place.has_external_id() {
            continue;
        }

        let query = search_query(place)?;
        let bias = place.geometry.map(|geometry| geometry.location);
        let candidates = api.search_by_text(&query, bias)?;
        let candidate = single_candidate(&query, candidates)?;
        apply_search_result(place, candidate);
        enriched += 1;
        debug!(
            "event=enrich_search module=lookup status=ok external_id={}",
            place.external_id
        );
    }

    info!("event=enrich_search_pass module=lookup status=ok enriched={enriched}");
    Ok(enriched)
}

/// Refreshes every place from its provider id. No skip condition.
pub fn enrich_by_id<A: PlacesApi>(api: &A, places: &mut [Place]) -> LookupResult<usize> {
    for place in places.iter_mut() {
        if !place.has_external_id() {
            return Err(LookupError::MissingField {
                field: "provider id",
                name: place.name.clone(),
            });
        }

        let details = api.get_by_id(&place.external_id)?;
        apply_details_result(place, details);
    }

    info!(
        "event=enrich_id_pass module=lookup status=ok enriched={}",
        places.len()
    );
    Ok(places.len())
}

/// Overwrites the provider-owned fields from a search candidate.
pub fn apply_search_result(place: &mut Place, candidate: ProviderPlace) {
    place.external_id = candidate.external_id;
    place.geometry = candidate.geometry;
    place.categories = candidate.categories;
}

/// Overwrites address, geometry and categories from a by-id lookup.
pub fn apply_details_result(place: &mut Place, details: ProviderPlace) {
    place.formatted_address = details.formatted_address;
    place.geometry = details.geometry;
    place.categories = details.categories;
}

fn single_candidate(query: &str, candidates: Vec<ProviderPlace>) -> LookupResult<ProviderPlace> {
    if candidates.len() > 1 {
        return Err(LookupError::Ambiguous {
            query: query.to_string(),
            candidates: candidates
                .into_iter()
                .map(|candidate| format!("{} ({})", candidate.name, candidate.formatted_address))
                .collect(),
        });
    }

    candidates
        .into_iter()
        .next()
        .ok_or_else(|| LookupError::NoMatch {
            query: query.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::{enrich_by_id, enrich_by_search, search_query};
    use crate::lookup::{LookupError, LookupResult, PlacesApi, ProviderPlace, Route};
    use crate::model::place::{Geometry, LatLng, Place};
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[derive(Default)]
    struct FakeApi {
        search_results: HashMap<String, Vec<ProviderPlace>>,
        details: HashMap<String, ProviderPlace>,
        searches: RefCell<Vec<(String, Option<LatLng>)>>,
    }

    impl PlacesApi for FakeApi {
        fn search_by_text(
            &self,
            query: &str,
            bias: Option<LatLng>,
        ) -> LookupResult<Vec<ProviderPlace>> {
            self.searches.borrow_mut().push((query.to_string(), bias));
            Ok(self.search_results.get(query).cloned().unwrap_or_default())
        }

        fn get_by_id(&self, external_id: &str) -> LookupResult<ProviderPlace> {
            self.details
                .get(external_id)
                .cloned()
                .ok_or_else(|| LookupError::Decode(format!("unknown id {external_id}")))
        }

        fn routes(&self, _origin: &str, _destination: &str) -> LookupResult<Vec<Route>> {
            Ok(Vec::new())
        }
    }

    fn provider_place(id: &str, name: &str, address: &str, category: &str) -> ProviderPlace {
        ProviderPlace {
            external_id: id.to_string(),
            name: name.to_string(),
            formatted_address: address.to_string(),
            geometry: Some(Geometry::point(1.0, 2.0)),
            categories: vec![category.to_string()],
        }
    }

    #[test]
    fn search_query_requires_name_and_address() {
        assert_eq!(
            search_query(&Place::new("A", "1 Main St")).expect("query"),
            "A 1 Main St"
        );
        assert!(matches!(
            search_query(&Place::new("A", "")),
            Err(LookupError::MissingField { .. })
        ));
        assert!(matches!(
            search_query(&Place::new("", "1 Main St")),
            Err(LookupError::MissingField { .. })
        ));
    }

    #[test]
    fn search_overwrites_provider_fields_but_not_identity_fields() {
        let mut api = FakeApi::default();
        api.search_results.insert(
            "Cafe 1 Main St".to_string(),
            vec![provider_place("ChIJcafe", "Cafe Renamed", "1 Main Street", "cafe")],
        );
        let mut places = vec![Place::new("Cafe", "1 Main St")];
        places[0].geometry = Some(Geometry::point(37.8, -122.4));

        let enriched = enrich_by_search(&api, &mut places).expect("enrich");

        assert_eq!(enriched, 1);
        let place = &places[0];
        assert_eq!(place.name, "Cafe");
        assert_eq!(place.formatted_address, "1 Main St");
        assert_eq!(place.external_id, "ChIJcafe");
        assert_eq!(place.categories, vec!["cafe".to_string()]);
        assert_eq!(place.geometry, Some(Geometry::point(1.0, 2.0)));
        assert_eq!(
            api.searches.borrow()[0].1,
            Some(LatLng::new(37.8, -122.4))
        );
    }

    #[test]
    fn search_skips_places_with_external_id() {
        let api = FakeApi::default();
        let mut place = Place::new("Known", "2 Elm St");
        place.external_id = "ChIJknown".to_string();
        let mut places = vec![place.clone()];

        let enriched = enrich_by_search(&api, &mut places).expect("enrich");

        assert_eq!(enriched, 0);
        assert!(api.searches.borrow().is_empty());
        assert_eq!(places[0], place);
    }

    #[test]
    fn multiple_candidates_abort_the_pass() {
        let mut api = FakeApi::default();
        api.search_results.insert(
            "Starbucks Market St".to_string(),
            vec![
                provider_place("ChIJ1", "Starbucks", "1 Market St", "cafe"),
                provider_place("ChIJ2", "Starbucks", "2 Market St", "cafe"),
            ],
        );
        let mut places = vec![
            Place::new("Starbucks", "Market St"),
            Place::new("Never", "Reached"),
        ];

        let err = enrich_by_search(&api, &mut places).expect_err("ambiguous must fail");

        assert!(matches!(err, LookupError::Ambiguous { ref candidates, .. } if candidates.len() == 2));
        assert_eq!(api.searches.borrow().len(), 1);
        assert!(places[0].external_id.is_empty());
    }

    #[test]
    fn zero_candidates_is_no_match() {
        let api = FakeApi::default();
        let mut places = vec![Place::new("Ghost", "Nowhere")];

        let err = enrich_by_search(&api, &mut places).expect_err("no match must fail");

        assert_eq!(
            err,
            LookupError::NoMatch {
                query: "Ghost Nowhere".to_string()
            }
        );
    }

    #[test]
    fn id_lookup_overwrites_address_geometry_and_categories() {
        let mut api = FakeApi::default();
        api.details.insert(
            "ChIJpark".to_string(),
            provider_place("ChIJpark", "Park", "500 Park Ave", "park"),
        );
        let mut place = Place::default();
        place.name = "My Park".to_string();
        place.external_id = "ChIJpark".to_string();
        let mut places = vec![place];

        enrich_by_id(&api, &mut places).expect("enrich");

        assert_eq!(places[0].name, "My Park");
        assert_eq!(places[0].formatted_address, "500 Park Ave");
        assert_eq!(places[0].categories, vec!["park".to_string()]);
        assert!(places[0].geometry.is_some());
    }

    #[test]
    fn id_lookup_requires_external_id() {
        let api = FakeApi::default();
        let mut places = vec![Place::new("No Id", "")];

        let err = enrich_by_id(&api, &mut places).expect_err("missing id must fail");

        assert!(matches!(err, LookupError::MissingField { field: "provider id", .. }));
    }
}
