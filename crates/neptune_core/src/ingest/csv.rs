//! CSV saved-places reader.
//!
//! # Responsibility
//! - Read title/URL rows using a configurable column mapping.
//! - Recover each row's provider id by scanning the saved-place page.
//!
//! # Invariants
//! - All rows are validated before any page is fetched.
//! - Rows are numbered from 1, header excluded.
//! - Records carry `name` and `external_id` only; the address comes later
//!   from a by-id lookup.

use crate::ingest::{InputFormat, ParseError, ParseResult, PlaceReader};
use crate::lookup::PageFetcher;
use crate::model::place::Place;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Provider id embedded in saved-place pages: `"ChI...\`.
static PROVIDER_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""(ChI[\w-]+)\\"#).expect("valid provider id regex"));

const UTF8_BOM: char = '\u{feff}';

/// Header names for the columns the reader consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvColumns {
    pub title: String,
    pub url: String,
}

impl CsvColumns {
    /// Headers of English-locale exports.
    pub fn english() -> Self {
        Self {
            title: "Title".to_string(),
            url: "URL".to_string(),
        }
    }

    /// Headers of German-locale exports.
    pub fn german() -> Self {
        Self {
            title: "Titel".to_string(),
            url: "URL".to_string(),
        }
    }

    /// Looks up a named preset (`en`, `de`).
    pub fn preset(locale: &str) -> Option<Self> {
        match locale.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Some(Self::english()),
            "de" | "german" | "deutsch" => Some(Self::german()),
            _ => None,
        }
    }
}

impl Default for CsvColumns {
    fn default() -> Self {
        Self::english()
    }
}

/// Reader for CSV exports; resolves provider ids through `fetcher`.
pub struct CsvReader<F: PageFetcher> {
    columns: CsvColumns,
    fetcher: F,
}

struct SavedRow {
    title: String,
    url: String,
}

impl<F: PageFetcher> CsvReader<F> {
    pub fn new(columns: CsvColumns, fetcher: F) -> Self {
        Self { columns, fetcher }
    }

    fn read_rows(&self, bytes: &[u8]) -> ParseResult<Vec<SavedRow>> {
        let mut reader = ::csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(bytes);

        let headers = reader.headers()?.clone();
        let column_index = |name: &str| {
            headers
                .iter()
                .position(|header| header.trim_start_matches(UTF8_BOM).trim() == name)
                .ok_or_else(|| ParseError::MissingColumn(name.to_string()))
        };
        let title_index = column_index(&self.columns.title)?;
        let url_index = column_index(&self.columns.url)?;

        let mut rows = Vec::new();
        for (index, record) in reader.records().enumerate() {
            let record = record?;
            let row = index + 1;
            if record.iter().all(|field| field.trim().is_empty()) {
                return Err(ParseError::EmptyRow { row });
            }

            let field = |at: usize| record.get(at).map(str::trim).unwrap_or_default();
            let title = field(title_index).to_string();
            let label = if title.is_empty() {
                format!("row {row}")
            } else {
                title.clone()
            };
            if title.is_empty() {
                return Err(ParseError::MissingField {
                    field: self.columns.title.clone(),
                    title: label,
                });
            }
            let url = field(url_index).to_string();
            if url.is_empty() {
                return Err(ParseError::MissingField {
                    field: self.columns.url.clone(),
                    title: label,
                });
            }

            rows.push(SavedRow { title, url });
        }
        Ok(rows)
    }

    fn lookup_provider_id(&self, row: &SavedRow) -> ParseResult<String> {
        let page = self
            .fetcher
            .fetch_page(&row.url)
            .map_err(|source| ParseError::Fetch {
                title: row.title.clone(),
                source,
            })?;

        find_provider_id(&page).ok_or_else(|| ParseError::IdNotFound {
            title: row.title.clone(),
        })
    }
}

impl<F: PageFetcher> PlaceReader for CsvReader<F> {
    fn format(&self) -> InputFormat {
        InputFormat::Csv
    }

    fn read_places(&self, bytes: &[u8]) -> ParseResult<Vec<Place>> {
        let rows = self.read_rows(bytes)?;
        let mut places = Vec::with_capacity(rows.len());
        for row in &rows {
            let external_id = self.lookup_provider_id(row)?;
            debug!("event=csv_id_recovered module=ingest status=ok external_id={external_id}");
            places.push(Place {
                name: row.title.clone(),
                external_id,
                ..Place::default()
            });
        }
        Ok(places)
    }
}

/// Returns the first provider id found line by line in `page`.
pub fn find_provider_id(page: &str) -> Option<String> {
    page.lines().find_map(|line| {
        PROVIDER_ID_RE
            .captures(line)
            .and_then(|captures| captures.get(1))
            .map(|id| id.as_str().to_string())
    })
}
