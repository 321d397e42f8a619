//! External places lookup capability.
//!
//! # Responsibility
//! - Define the `PlacesApi` boundary: text search, lookup by id, routing.
//! - Define the `PageFetcher` boundary used for provider id recovery.
//! - Define the provider-neutral result types enrichment consumes.
//!
//! # Invariants
//! - Every call is synchronous and single-attempt; there is no retry layer.
//! - Timeouts surface as `LookupError::Timeout`, never as a generic network error.

pub mod enrich;
pub mod google;
pub mod http;

use crate::model::place::{Geometry, LatLng};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub use enrich::{enrich_by_id, enrich_by_search, search_query};
pub use google::GoogleMapsClient;
pub use http::HttpPageFetcher;

pub type LookupResult<T> = Result<T, LookupError>;

/// Lookup-layer error for transport, provider and matching failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// No API credential was supplied.
    MissingCredential,
    /// A place lacks a field required to build the request.
    MissingField { field: &'static str, name: String },
    /// Connection-level failure (DNS, TLS, reset, ...).
    Network(String),
    /// The configured per-request timeout elapsed.
    Timeout(String),
    /// Non-success HTTP status.
    Http { status: u16, body: String },
    /// Provider-level status other than `OK`/`ZERO_RESULTS`.
    Api { status: String, message: String },
    /// Response body did not match the expected shape.
    Decode(String),
    /// Text search returned no candidate.
    NoMatch { query: String },
    /// Text search returned more than one candidate.
    Ambiguous { query: String, candidates: Vec<String> },
}

impl Display for LookupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingCredential => write!(f, "a maps API key is required"),
            Self::MissingField { field, name } => {
                write!(f, "place `{name}` must have a {field}")
            }
            Self::Network(message) => write!(f, "network error: {message}"),
            Self::Timeout(message) => write!(f, "request timed out: {message}"),
            Self::Http { status, body } => write!(f, "HTTP {status}: {body}"),
            Self::Api { status, message } => write!(f, "places API returned {status}: {message}"),
            Self::Decode(message) => write!(f, "unexpected places API response: {message}"),
            Self::NoMatch { query } => write!(f, "found no place for `{query}`"),
            Self::Ambiguous { query, candidates } => write!(
                f,
                "found more than one place for `{query}`: {}",
                candidates.join("; ")
            ),
        }
    }
}

impl Error for LookupError {}

/// One place as reported by the provider.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderPlace {
    pub external_id: String,
    pub name: String,
    pub formatted_address: String,
    pub geometry: Option<Geometry>,
    pub categories: Vec<String>,
}

/// One routing alternative, split into legs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Route {
    pub leg_meters: Vec<u64>,
}

impl Route {
    pub fn total_meters(&self) -> u64 {
        self.leg_meters.iter().sum()
    }
}

/// Places lookup capability.
pub trait PlacesApi {
    /// Finds candidates for free text, optionally biased toward `bias`.
    fn search_by_text(&self, query: &str, bias: Option<LatLng>)
        -> LookupResult<Vec<ProviderPlace>>;

    /// Fetches one place by its provider id.
    fn get_by_id(&self, external_id: &str) -> LookupResult<ProviderPlace>;

    /// Returns routing alternatives from `origin` to `destination`.
    fn routes(&self, origin: &str, destination: &str) -> LookupResult<Vec<Route>>;

    /// Route distance in meters along the first alternative.
    ///
    /// No route at all counts as zero meters.
    fn route_distance(&self, origin: &str, destination: &str) -> LookupResult<u64> {
        Ok(self
            .routes(origin, destination)?
            .first()
            .map_or(0, Route::total_meters))
    }
}

/// Plain page download, used to recover provider ids from saved-place URLs.
pub trait PageFetcher {
    fn fetch_page(&self, url: &str) -> LookupResult<String>;
}

impl<T: PageFetcher + ?Sized> PageFetcher for &T {
    fn fetch_page(&self, url: &str) -> LookupResult<String> {
        (**self).fetch_page(url)
    }
}

impl<T: PlacesApi + ?Sized> PlacesApi for &T {
    fn search_by_text(
        &self,
        query: &str,
        bias: Option<LatLng>,
    ) -> LookupResult<Vec<ProviderPlace>> {
        (**self).search_by_text(query, bias)
    }

    fn get_by_id(&self, external_id: &str) -> LookupResult<ProviderPlace> {
        (**self).get_by_id(external_id)
    }

    fn routes(&self, origin: &str, destination: &str) -> LookupResult<Vec<Route>> {
        (**self).routes(origin, destination)
    }
}
