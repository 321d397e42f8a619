//! Google Maps web-service implementation of `PlacesApi`.
//!
//! # Responsibility
//! - Call Find Place, Place Details and Directions over blocking HTTP.
//! - Translate provider payloads into `ProviderPlace`/`Route`.
//!
//! # Invariants
//! - The API key is sent as a query parameter and never logged.
//! - `OK` and `ZERO_RESULTS` are the only successful provider statuses.

use crate::lookup::http::{build_http_client, classify_transport_error, send};
use crate::lookup::{LookupError, LookupResult, PlacesApi, ProviderPlace, Route};
use crate::model::place::{Geometry, LatLng};
use log::{debug, info};
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::{Duration, Instant};

/// Production endpoint root.
pub const DEFAULT_API_BASE_URL: &str = "https://maps.googleapis.com";
/// Radius of the circular location bias applied to text search.
pub const SEARCH_BIAS_RADIUS_METERS: u32 = 20;

const PLACE_FIELDS: &str = "formatted_address,geometry,name,place_id,types";
const STATUS_OK: &str = "OK";
const STATUS_ZERO_RESULTS: &str = "ZERO_RESULTS";

/// Blocking Google Maps client.
#[derive(Clone)]
pub struct GoogleMapsClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl GoogleMapsClient {
    /// Creates a client for `base_url` with a per-request `timeout`.
    ///
    /// # Errors
    /// - `MissingCredential` when `api_key` is blank.
    pub fn new(api_key: &str, base_url: &str, timeout: Duration) -> LookupResult<Self> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(LookupError::MissingCredential);
        }

        Ok(Self {
            http: build_http_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn get_json<T>(&self, endpoint: &'static str, params: &[(&str, String)]) -> LookupResult<T>
    where
        T: DeserializeOwned + ProviderStatus,
    {
        let started_at = Instant::now();
        let url = format!("{}/maps/api/{endpoint}/json", self.base_url);
        let request = self
            .http
            .get(url)
            .query(params)
            .query(&[("key", self.api_key.as_str())]);

        let payload = send(request)?
            .json::<T>()
            .map_err(classify_transport_error)?;
        info!(
            "event=maps_call module=lookup status=ok endpoint={endpoint} provider_status={} duration_ms={}",
            payload.status(),
            started_at.elapsed().as_millis()
        );

        match payload.status() {
            STATUS_OK | STATUS_ZERO_RESULTS => Ok(payload),
            status => Err(LookupError::Api {
                status: status.to_string(),
                message: payload.error_message().unwrap_or_default().to_string(),
            }),
        }
    }
}

impl PlacesApi for GoogleMapsClient {
    fn search_by_text(
        &self,
        query: &str,
        bias: Option<LatLng>,
    ) -> LookupResult<Vec<ProviderPlace>> {
        let mut params = vec![
            ("input", query.to_string()),
            ("inputtype", "textquery".to_string()),
            ("fields", PLACE_FIELDS.to_string()),
        ];
        if let Some(center) = bias {
            params.push((
                "locationbias",
                format!(
                    "circle:{SEARCH_BIAS_RADIUS_METERS}@{},{}",
                    center.lat, center.lng
                ),
            ));
        }

        let response: FindPlaceResponse = self.get_json("place/findplacefromtext", &params)?;
        debug!(
            "event=maps_search module=lookup status=ok candidates={}",
            response.candidates.len()
        );
        Ok(response
            .candidates
            .into_iter()
            .map(ProviderPlace::from)
            .collect())
    }

    fn get_by_id(&self, external_id: &str) -> LookupResult<ProviderPlace> {
        let params = [
            ("place_id", external_id.to_string()),
            ("fields", PLACE_FIELDS.to_string()),
        ];
        let response: DetailsResponse = self.get_json("place/details", &params)?;
        response
            .result
            .map(ProviderPlace::from)
            .ok_or_else(|| LookupError::Decode(format!("no result for place id {external_id}")))
    }

    fn routes(&self, origin: &str, destination: &str) -> LookupResult<Vec<Route>> {
        let params = [
            ("origin", origin.to_string()),
            ("destination", destination.to_string()),
        ];
        let response: DirectionsResponse = self.get_json("directions", &params)?;
        Ok(response
            .routes
            .into_iter()
            .map(|route| Route {
                leg_meters: route.legs.into_iter().map(|leg| leg.distance.value).collect(),
            })
            .collect())
    }
}

trait ProviderStatus {
    fn status(&self) -> &str;
    fn error_message(&self) -> Option<&str>;
}

macro_rules! impl_provider_status {
    ($($response:ty),+) => {
        $(impl ProviderStatus for $response {
            fn status(&self) -> &str {
                &self.status
            }

            fn error_message(&self) -> Option<&str> {
                self.error_message.as_deref()
            }
        })+
    };
}

impl_provider_status!(FindPlaceResponse, DetailsResponse, DirectionsResponse);

#[derive(Debug, Deserialize)]
struct FindPlaceResponse {
    #[serde(default)]
    candidates: Vec<ApiPlace>,
    status: String,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DetailsResponse {
    #[serde(default)]
    result: Option<ApiPlace>,
    status: String,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    #[serde(default)]
    routes: Vec<ApiRoute>,
    status: String,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ApiPlace {
    place_id: String,
    name: String,
    formatted_address: String,
    geometry: Option<Geometry>,
    types: Vec<String>,
}

impl From<ApiPlace> for ProviderPlace {
    fn from(value: ApiPlace) -> Self {
        Self {
            external_id: value.place_id,
            name: value.name,
            formatted_address: value.formatted_address,
            geometry: value.geometry,
            categories: value.types,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiRoute {
    #[serde(default)]
    legs: Vec<ApiLeg>,
}

#[derive(Debug, Deserialize)]
struct ApiLeg {
    distance: ApiDistance,
}

#[derive(Debug, Deserialize)]
struct ApiDistance {
    value: u64,
}
