use neptune_core::lookup::LookupResult;
use neptune_core::{
    CsvColumns, CsvReader, GeoJsonReader, LookupError, PageFetcher, ParseError, PlaceReader,
};
use std::cell::RefCell;

fn feature(properties: &str, coordinates: &str) -> String {
    format!(
        r#"{{"type":"FeatureCollection","features":[{{"type":"Feature","geometry":{{"type":"Point","coordinates":{coordinates}}},"properties":{properties}}}]}}"#
    )
}

#[test]
fn geojson_swaps_coordinates_and_reads_timestamps() {
    let input = feature(
        r#"{"Title":"Ferry Building","Published":"2022-01-02T03:04:05Z","Updated":"2022-02-03T04:05:06+01:00","Location":{"Address":"1 Ferry Building, San Francisco","Business Name":"Ferry Building"}}"#,
        "[-122.4, 37.8]",
    );

    let places = GeoJsonReader.read_places(input.as_bytes()).unwrap();

    assert_eq!(places.len(), 1);
    let place = &places[0];
    assert_eq!(place.name, "Ferry Building");
    assert_eq!(place.formatted_address, "1 Ferry Building, San Francisco");
    let location = place.geometry.unwrap().location;
    assert_eq!(location.lat, 37.8);
    assert_eq!(location.lng, -122.4);
    assert_eq!(
        place.updated_at.unwrap().to_rfc3339(),
        "2022-02-03T03:05:06+00:00"
    );
    assert!(place.external_id.is_empty());
    assert!(place.tags.is_empty());
}

#[test]
fn geojson_missing_address_names_field_and_title() {
    let input = feature(
        r#"{"Title":"Mystery Spot","Published":"2022-01-02T03:04:05Z","Updated":"2022-01-02T03:04:05Z","Location":{"Geo Coordinates":{}}}"#,
        "[-122.4, 37.8]",
    );

    let err = GeoJsonReader.read_places(input.as_bytes()).unwrap_err();

    match &err {
        ParseError::MissingField { field, title } => {
            assert_eq!(field, "Location.Address");
            assert_eq!(title, "Mystery Spot");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(
        err.to_string(),
        "couldn't find Location.Address for Mystery Spot"
    );
}

#[test]
fn geojson_missing_title_uses_feature_ordinal() {
    let input = feature(r#"{"Location":{"Address":"x"}}"#, "[0, 0]");

    let err = GeoJsonReader.read_places(input.as_bytes()).unwrap_err();

    assert!(matches!(
        err,
        ParseError::MissingField { field, title } if field == "Title" && title == "feature 1"
    ));
}

#[test]
fn geojson_null_properties_report_missing_title() {
    let input = r#"{"type":"FeatureCollection","features":[
        {"type":"Feature","geometry":{"type":"Point","coordinates":[0,0]},"properties":{"Title":"First","Published":"2022-01-02T03:04:05Z","Updated":"2022-01-02T03:04:05Z","Location":{"Address":"x"}}},
        {"type":"Feature","geometry":{"type":"Point","coordinates":[0,0]},"properties":null}
    ]}"#;

    let err = GeoJsonReader.read_places(input.as_bytes()).unwrap_err();

    assert!(matches!(
        err,
        ParseError::MissingField { field, title } if field == "Title" && title == "feature 2"
    ));
}

#[test]
fn geojson_rejects_unparseable_timestamp() {
    let input = feature(
        r#"{"Title":"T","Published":"yesterday","Updated":"2022-01-02T03:04:05Z","Location":{"Address":"x"}}"#,
        "[0, 0]",
    );

    let err = GeoJsonReader.read_places(input.as_bytes()).unwrap_err();

    assert!(matches!(err, ParseError::InvalidField { field, .. } if field == "Published"));
}

#[test]
fn geojson_rejects_invalid_json() {
    let err = GeoJsonReader.read_places(b"not json").unwrap_err();
    assert!(matches!(err, ParseError::Json(_)));
}

/// Serves one fixed page and records every requested URL.
struct RecordingFetcher {
    page: String,
    requested: RefCell<Vec<String>>,
}

impl RecordingFetcher {
    fn serving(page: &str) -> Self {
        Self {
            page: page.to_string(),
            requested: RefCell::new(Vec::new()),
        }
    }
}

impl PageFetcher for RecordingFetcher {
    fn fetch_page(&self, url: &str) -> LookupResult<String> {
        self.requested.borrow_mut().push(url.to_string());
        Ok(self.page.clone())
    }
}

struct TimingOutFetcher;

impl PageFetcher for TimingOutFetcher {
    fn fetch_page(&self, _url: &str) -> LookupResult<String> {
        Err(LookupError::Timeout("operation timed out".to_string()))
    }
}

#[test]
fn csv_reads_title_and_recovered_id() {
    let fetcher = RecordingFetcher::serving("x\n\"ChIJ123-abc\\\"\n");
    let reader = CsvReader::new(CsvColumns::english(), &fetcher);
    let csv = "\u{feff}Title,Note,URL,Comment\nGolden Gate Park,,https://maps.example/ggp,\n";

    let places = reader.read_places(csv.as_bytes()).unwrap();

    assert_eq!(places.len(), 1);
    assert_eq!(places[0].name, "Golden Gate Park");
    assert_eq!(places[0].external_id, "ChIJ123-abc");
    assert!(places[0].formatted_address.is_empty());
    assert_eq!(
        *fetcher.requested.borrow(),
        vec!["https://maps.example/ggp".to_string()]
    );
}

#[test]
fn csv_empty_row_is_reported_before_any_fetch() {
    let fetcher = RecordingFetcher::serving("\"ChIJ1\\\"");
    let reader = CsvReader::new(CsvColumns::english(), &fetcher);
    let csv = "Title,Note,URL,Comment\nA,,https://maps.example/a,\n,,,\nB,,https://maps.example/b,\n";

    let err = reader.read_places(csv.as_bytes()).unwrap_err();

    assert!(matches!(err, ParseError::EmptyRow { row: 2 }));
    assert!(fetcher.requested.borrow().is_empty());
}

#[test]
fn csv_page_without_id_names_the_title() {
    let fetcher = RecordingFetcher::serving("<html>no ids here</html>");
    let reader = CsvReader::new(CsvColumns::english(), &fetcher);
    let csv = "Title,URL\nTwin Peaks,https://maps.example/tp\n";

    let err = reader.read_places(csv.as_bytes()).unwrap_err();

    assert!(matches!(&err, ParseError::IdNotFound { title } if title == "Twin Peaks"));
    assert_eq!(err.to_string(), "didn't find id for Twin Peaks");
}

#[test]
fn csv_missing_configured_column_is_reported() {
    let fetcher = RecordingFetcher::serving("");
    let reader = CsvReader::new(CsvColumns::german(), &fetcher);

    let err = reader
        .read_places(b"Title,URL\nA,https://maps.example/a\n")
        .unwrap_err();

    assert!(matches!(err, ParseError::MissingColumn(name) if name == "Titel"));
}

#[test]
fn csv_fetch_timeout_surfaces_as_timeout() {
    let reader = CsvReader::new(CsvColumns::english(), TimingOutFetcher);

    let err = reader
        .read_places(b"Title,URL\nA,https://maps.example/a\n")
        .unwrap_err();

    match err {
        ParseError::Fetch { title, source } => {
            assert_eq!(title, "A");
            assert!(matches!(source, LookupError::Timeout(_)));
        }
        other => panic!("unexpected error: {other}"),
    }
}
