//! Input readers that turn saved-place exports into partial `Place` records.
//!
//! # Responsibility
//! - Parse GeoJSON and CSV exports.
//! - Report malformed input with the offending field and record.
//!
//! # Invariants
//! - A reader returns every record or an error, never a partial list.
//! - Readers never set `tags`; tags are attached by the import pipeline.

pub mod csv;
pub mod geojson;

use crate::lookup::LookupError;
use crate::model::place::Place;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

pub use self::csv::{CsvColumns, CsvReader};
pub use self::geojson::GeoJsonReader;

pub type ParseResult<T> = Result<T, ParseError>;

/// Supported input formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    GeoJson,
    Csv,
}

impl InputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GeoJson => "geojson",
            Self::Csv => "csv",
        }
    }
}

impl FromStr for InputFormat {
    type Err = ParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "geojson" | "json" => Ok(Self::GeoJson),
            "csv" => Ok(Self::Csv),
            other => Err(ParseError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl Display for InputFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Malformed-input errors. Any of these aborts the whole parse.
#[derive(Debug)]
pub enum ParseError {
    UnsupportedFormat(String),
    Json(serde_json::Error),
    Csv(::csv::Error),
    /// A required property is absent. `title` names the record.
    MissingField { field: String, title: String },
    /// A property is present but has the wrong shape or cannot be parsed.
    InvalidField {
        field: String,
        title: String,
        message: String,
    },
    /// Every field of the 1-based data row `row` is blank.
    EmptyRow { row: usize },
    /// The CSV header lacks a configured column.
    MissingColumn(String),
    /// The saved-place page did not contain a provider id.
    IdNotFound { title: String },
    /// Downloading the saved-place page failed.
    Fetch { title: String, source: LookupError },
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedFormat(value) => {
                write!(f, "unsupported input format `{value}`; expected geojson|csv")
            }
            Self::Json(err) => write!(f, "invalid GeoJSON: {err}"),
            Self::Csv(err) => write!(f, "invalid CSV: {err}"),
            Self::MissingField { field, title } => {
                write!(f, "couldn't find {field} for {title}")
            }
            Self::InvalidField {
                field,
                title,
                message,
            } => write!(f, "couldn't parse {field} for {title}: {message}"),
            Self::EmptyRow { row } => write!(f, "row {row} is empty"),
            Self::MissingColumn(name) => write!(f, "CSV header has no `{name}` column"),
            Self::IdNotFound { title } => write!(f, "didn't find id for {title}"),
            Self::Fetch { title, source } => write!(f, "couldn't fetch page for {title}: {source}"),
        }
    }
}

impl Error for ParseError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            Self::Csv(err) => Some(err),
            Self::Fetch { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ParseError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<::csv::Error> for ParseError {
    fn from(value: ::csv::Error) -> Self {
        Self::Csv(value)
    }
}

/// Parses raw export bytes into partially populated places.
pub trait PlaceReader {
    fn format(&self) -> InputFormat;
    fn read_places(&self, bytes: &[u8]) -> ParseResult<Vec<Place>>;
}
