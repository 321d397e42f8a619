//! Run configuration.
//!
//! # Responsibility
//! - Hold every setting a run needs in one explicit structure.
//! - Load optional TOML settings; callers layer CLI/env values on top.
//!
//! # Invariants
//! - Components receive configuration at construction; nothing reads the
//!   environment or global state on its own.
//! - A missing default config file is not an error; a missing explicit one is.

use crate::ingest::{CsvColumns, InputFormat};
use crate::lookup::google::DEFAULT_API_BASE_URL;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_DATA_DIR: &str = "data/out/";
pub const DEFAULT_DISTANCE_KM: u64 = 200;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const CONFIG_DIR_NAME: &str = "neptune";
const CONFIG_FILE_NAME: &str = "config.toml";
const SQLITE_FILE_NAME: &str = "neptune.sqlite3";

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, source: toml::de::Error },
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "config {}: {source}", path.display()),
            Self::Parse { path, source } => write!(f, "config {}: {source}", path.display()),
            Self::Invalid(message) => write!(f, "invalid configuration: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::Invalid(_) => None,
        }
    }
}

/// Persistence backend for imported places.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// One JSON file per place under `<data_dir>/places/`.
    #[default]
    Json,
    /// Single SQLite file at `<data_dir>/neptune.sqlite3`.
    Sqlite,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(ConfigError::Invalid(format!(
                "unknown store backend `{other}`; expected json|sqlite"
            ))),
        }
    }
}

/// Everything one import or export run needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeptuneConfig {
    pub data_dir: PathBuf,
    pub store_backend: StoreBackend,
    /// Maps API credential. Never logged.
    #[serde(skip_serializing)]
    pub maps_key: Option<String>,
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub csv_columns: CsvColumns,
    #[serde(skip)]
    pub input_format: Option<InputFormat>,
    #[serde(skip)]
    pub input_path: Option<PathBuf>,
    /// Tags attached to every imported place.
    pub tags: Vec<String>,
    /// Reference location for the export distance filter.
    pub location: Option<String>,
    pub distance_km: u64,
    /// Export only places carrying one of these tags; empty keeps all.
    pub export_tags: Vec<String>,
}

impl Default for NeptuneConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            store_backend: StoreBackend::Json,
            maps_key: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            csv_columns: CsvColumns::default(),
            input_format: None,
            input_path: None,
            tags: Vec::new(),
            location: None,
            distance_km: DEFAULT_DISTANCE_KM,
            export_tags: Vec::new(),
        }
    }
}

impl NeptuneConfig {
    /// Loads settings from `explicit`, or from the default location if it exists.
    ///
    /// # Errors
    /// - `Io` when `explicit` is given but unreadable.
    /// - `Parse` when the file is not valid TOML for this structure.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match default_config_path() {
                Some(path) if path.is_file() => path,
                _ => return Ok(Self::default()),
            },
        };

        let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        Self::from_toml_str(&raw).map_err(|source| ConfigError::Parse { path, source })
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    /// Checks cross-field constraints after all layers are applied.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.api_base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("api_base_url must not be empty".to_string()));
        }
        if self.csv_columns.title.trim().is_empty() || self.csv_columns.url.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "csv_columns.title and csv_columns.url must not be empty".to_string(),
            ));
        }
        if self.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("data_dir must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Distance threshold converted from kilometers to meters.
    pub fn distance_meters(&self) -> u64 {
        self.distance_km.saturating_mul(1000)
    }

    /// Non-blank credential, if any.
    pub fn maps_key(&self) -> Option<&str> {
        self.maps_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    pub fn sqlite_path(&self) -> PathBuf {
        self.data_dir.join(SQLITE_FILE_NAME)
    }
}

/// `<config dir>/neptune/config.toml`, when the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, NeptuneConfig, StoreBackend};
    use std::path::PathBuf;

    #[test]
    fn defaults_match_cli_defaults() {
        let config = NeptuneConfig::default();
        assert_eq!(config.data_dir, PathBuf::from("data/out/"));
        assert_eq!(config.distance_km, 200);
        assert_eq!(config.distance_meters(), 200_000);
        assert_eq!(config.store_backend, StoreBackend::Json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn toml_overrides_selected_fields_and_keeps_defaults() {
        let config = NeptuneConfig::from_toml_str(
            r#"
            data_dir = "/var/lib/neptune"
            store_backend = "sqlite"
            maps_key = "abc"
            distance_km = 50

            [csv_columns]
            title = "Titel"
            "#,
        )
        .expect("valid toml");

        assert_eq!(config.data_dir, PathBuf::from("/var/lib/neptune"));
        assert_eq!(config.store_backend, StoreBackend::Sqlite);
        assert_eq!(config.maps_key(), Some("abc"));
        assert_eq!(config.distance_meters(), 50_000);
        assert_eq!(config.csv_columns.title, "Titel");
        assert_eq!(config.csv_columns.url, "URL");
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn blank_key_counts_as_missing() {
        let config = NeptuneConfig {
            maps_key: Some("   ".to_string()),
            ..NeptuneConfig::default()
        };
        assert_eq!(config.maps_key(), None);
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let config = NeptuneConfig {
            request_timeout_secs: 0,
            ..NeptuneConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = NeptuneConfig::load(Some(&dir.path().join("absent.toml")))
            .expect_err("explicit path must exist");
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn backend_parses_from_flag_values() {
        assert_eq!("SQLite".parse::<StoreBackend>().expect("sqlite"), StoreBackend::Sqlite);
        assert!("redis".parse::<StoreBackend>().is_err());
    }
}
