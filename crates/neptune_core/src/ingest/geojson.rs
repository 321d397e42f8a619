//! GeoJSON saved-places reader.
//!
//! # Invariants
//! - Each feature needs string `Title`, `Published`, `Updated` and a nested
//!   `Location.Address`; the first feature missing any of them fails the parse.
//! - Point coordinates arrive as `[lng, lat]` and are stored as `lat`/`lng`.

use crate::ingest::{InputFormat, ParseError, ParseResult, PlaceReader};
use crate::model::place::{Geometry, Place};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    #[serde(default)]
    geometry: Option<FeatureGeometry>,
    /// `null` is valid GeoJSON and reads as no properties.
    #[serde(default)]
    properties: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct FeatureGeometry {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    coordinates: Vec<f64>,
}

/// Reader for GeoJSON feature collections of saved places.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoJsonReader;

impl PlaceReader for GeoJsonReader {
    fn format(&self) -> InputFormat {
        InputFormat::GeoJson
    }

    fn read_places(&self, bytes: &[u8]) -> ParseResult<Vec<Place>> {
        let collection: FeatureCollection = serde_json::from_slice(bytes)?;
        collection
            .features
            .iter()
            .enumerate()
            .map(|(index, feature)| parse_feature(index + 1, feature))
            .collect()
    }
}

fn parse_feature(ordinal: usize, feature: &Feature) -> ParseResult<Place> {
    let empty = Map::new();
    let props = feature.properties.as_ref().unwrap_or(&empty);
    let title = string_property(props, "Title", &format!("feature {ordinal}"))?;

    let location = match props.get("Location") {
        Some(Value::Object(location)) => location,
        Some(_) => return Err(invalid("Location", &title, "expected an object")),
        None => return Err(missing("Location", &title)),
    };
    let address = match location.get("Address") {
        Some(Value::String(address)) => address.clone(),
        Some(_) => return Err(invalid("Location.Address", &title, "expected a string")),
        None => return Err(missing("Location.Address", &title)),
    };

    let published_at = timestamp_property(props, "Published", &title)?;
    let updated_at = timestamp_property(props, "Updated", &title)?;
    let geometry = point_geometry(feature.geometry.as_ref(), &title)?;

    Ok(Place {
        name: title,
        formatted_address: address,
        geometry: Some(geometry),
        published_at: Some(published_at),
        updated_at: Some(updated_at),
        ..Place::default()
    })
}

fn string_property(props: &Map<String, Value>, field: &str, title: &str) -> ParseResult<String> {
    match props.get(field) {
        Some(Value::String(value)) => Ok(value.clone()),
        Some(_) => Err(invalid(field, title, "expected a string")),
        None => Err(missing(field, title)),
    }
}

fn timestamp_property(
    props: &Map<String, Value>,
    field: &str,
    title: &str,
) -> ParseResult<DateTime<Utc>> {
    let raw = string_property(props, field, title)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|err| invalid(field, title, &err.to_string()))
}

fn point_geometry(geometry: Option<&FeatureGeometry>, title: &str) -> ParseResult<Geometry> {
    let geometry = geometry.ok_or_else(|| missing("geometry", title))?;
    if geometry.kind != "Point" {
        return Err(invalid(
            "geometry",
            title,
            &format!("expected Point, got {}", geometry.kind),
        ));
    }
    match geometry.coordinates.as_slice() {
        [lng, lat, ..] => Ok(Geometry::point(*lat, *lng)),
        _ => Err(invalid("geometry", title, "point needs [longitude, latitude]")),
    }
}

fn missing(field: &str, title: &str) -> ParseError {
    ParseError::MissingField {
        field: field.to_string(),
        title: title.to_string(),
    }
}

fn invalid(field: &str, title: &str, message: &str) -> ParseError {
    ParseError::InvalidField {
        field: field.to_string(),
        title: title.to_string(),
        message: message.to_string(),
    }
}
