//! `neptune` command-line entry point.
//!
//! # Responsibility
//! - Resolve one `NeptuneConfig` from defaults, TOML, environment and flags.
//! - Open the configured store backend and lookup clients.
//! - Run `import` or `export` and map failures to exit codes.
//!
//! # Invariants
//! - The API key is never printed or logged.
//! - Exit code 0 on success, 1 on runtime failure, 2 on usage/config errors.

use clap::{Args, Parser, Subcommand, ValueEnum};
use log::{error, info};
use neptune_core::{
    db, flush_logging, init_logging, render_text, ConfigError, CsvColumns, CsvReader, ExportError,
    ExportOptions, ExportService, GeoJsonReader, GoogleMapsClient, HttpPageFetcher, ImportError,
    ImportService, InputFormat, JsonDirStore, LookupError, NeptuneConfig, ParseError, PlacesApi,
    RecordStore, SqliteRecordStore, StoreBackend,
};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

const EXIT_SUCCESS: u8 = 0;
const EXIT_RUNTIME: u8 = 1;
const EXIT_USAGE: u8 = 2;

#[derive(Parser)]
#[command(name = "neptune")]
#[command(about = "Import saved places, enrich them and export category listings")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalArgs {
    /// TOML config file (default: <config dir>/neptune/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Directory holding the place store
    #[arg(long, short = 'D', global = true, value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Maps API key
    #[arg(long, global = true, env = "NEPTUNE_MAPS_KEY", hide_env_values = true)]
    maps_key: Option<String>,

    /// Store backend (json|sqlite)
    #[arg(long, global = true, value_parser = parse_store)]
    store: Option<StoreBackend>,

    /// trace|debug|info|warn|error
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log directory (default: <data dir>/logs)
    #[arg(long, global = true, value_name = "DIR")]
    log_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a saved-places export into the store
    #[command(after_help = "\
Examples:
  neptune import geojson -f Saved.json -t hike,2024
  neptune import csv -f Favourites.csv --csv-locale de")]
    Import {
        /// Input format (geojson|csv)
        #[arg(value_name = "FORMAT", value_parser = parse_format)]
        format: InputFormat,

        /// Export file to read
        #[arg(long, short = 'f', value_name = "FILE")]
        file: PathBuf,

        /// Tags attached to every imported place (comma-separated or repeated)
        #[arg(long, short = 't', value_delimiter = ',')]
        tags: Vec<String>,

        /// CSV header preset (en|de)
        #[arg(long)]
        csv_locale: Option<String>,

        /// CSV column holding the place title
        #[arg(long)]
        title_column: Option<String>,

        /// CSV column holding the saved-place URL
        #[arg(long)]
        url_column: Option<String>,
    },

    /// Print stored places grouped by category
    #[command(after_help = "\
Examples:
  neptune export text
  neptune export text -l 'Berlin Hbf' -d 150 -t hike")]
    Export {
        /// Output format
        format: ReportArg,

        /// Reference location for the distance filter
        #[arg(long, short = 'l')]
        location: Option<String>,

        /// Maximum route distance in kilometers
        #[arg(long, short = 'd')]
        distance: Option<u64>,

        /// Keep only places carrying one of these tags
        #[arg(long, short = 't', value_delimiter = ',')]
        tags: Vec<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ReportArg {
    Text,
}

fn parse_format(value: &str) -> Result<InputFormat, String> {
    value.parse().map_err(|err: ParseError| err.to_string())
}

fn parse_store(value: &str) -> Result<StoreBackend, String> {
    value.parse().map_err(|err: ConfigError| err.to_string())
}

#[derive(Debug)]
struct CliError {
    code: u8,
    message: String,
}

impl CliError {
    fn usage(message: impl Into<String>) -> Self {
        Self {
            code: EXIT_USAGE,
            message: message.into(),
        }
    }

    fn runtime(message: impl Into<String>) -> Self {
        Self {
            code: EXIT_RUNTIME,
            message: message.into(),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(value: ConfigError) -> Self {
        Self::usage(value.to_string())
    }
}

impl From<LookupError> for CliError {
    fn from(value: LookupError) -> Self {
        match value {
            LookupError::MissingCredential => Self::usage(format!(
                "{} (pass --maps-key or set NEPTUNE_MAPS_KEY)",
                LookupError::MissingCredential
            )),
            other => Self::runtime(other.to_string()),
        }
    }
}

impl From<ImportError> for CliError {
    fn from(value: ImportError) -> Self {
        match value {
            ImportError::Lookup(err) => err.into(),
            other => Self::runtime(other.to_string()),
        }
    }
}

impl From<ExportError> for CliError {
    fn from(value: ExportError) -> Self {
        match value {
            ExportError::Lookup(err) => err.into(),
            other => Self::runtime(other.to_string()),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = run(cli);
    flush_logging();
    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message }) => {
            eprintln!("error: {message}");
            ExitCode::from(code)
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = NeptuneConfig::load(cli.global.config.as_deref())?;
    apply_global_args(&mut config, &cli.global);

    match cli.command {
        Commands::Import {
            format,
            file,
            tags,
            csv_locale,
            title_column,
            url_column,
        } => {
            config.input_format = Some(format);
            config.input_path = Some(file);
            if !tags.is_empty() {
                config.tags = tags;
            }
            if let Some(locale) = csv_locale {
                config.csv_columns = CsvColumns::preset(&locale).ok_or_else(|| {
                    CliError::usage(format!("unknown CSV locale `{locale}`; expected en|de"))
                })?;
            }
            if let Some(title) = title_column {
                config.csv_columns.title = title;
            }
            if let Some(url) = url_column {
                config.csv_columns.url = url;
            }
            config.validate()?;
            start_logging(&cli.global, &config)?;
            cmd_import(&config)
        }
        Commands::Export {
            format: ReportArg::Text,
            location,
            distance,
            tags,
        } => {
            if location.is_some() {
                config.location = location;
            }
            if let Some(distance) = distance {
                config.distance_km = distance;
            }
            if !tags.is_empty() {
                config.export_tags = tags;
            }
            config.validate()?;
            start_logging(&cli.global, &config)?;
            cmd_export(&config)
        }
    }
}

fn apply_global_args(config: &mut NeptuneConfig, global: &GlobalArgs) {
    if let Some(dir) = &global.dir {
        config.data_dir = dir.clone();
    }
    if let Some(key) = &global.maps_key {
        config.maps_key = Some(key.clone());
    }
    if let Some(store) = global.store {
        config.store_backend = store;
    }
}

fn start_logging(global: &GlobalArgs, config: &NeptuneConfig) -> Result<(), CliError> {
    let level = global
        .log_level
        .as_deref()
        .unwrap_or(neptune_core::default_log_level());
    let log_dir = match &global.log_dir {
        Some(dir) => absolute(dir)?,
        None => absolute(&config.data_dir)?.join("logs"),
    };
    init_logging(level, &log_dir).map_err(|err| CliError::usage(err.to_string()))
}

fn absolute(path: &Path) -> Result<PathBuf, CliError> {
    std::path::absolute(path)
        .map_err(|err| CliError::usage(format!("invalid path `{}`: {err}", path.display())))
}

fn maps_client(config: &NeptuneConfig) -> Result<GoogleMapsClient, CliError> {
    let key = config.maps_key().ok_or(LookupError::MissingCredential)?;
    Ok(GoogleMapsClient::new(
        key,
        &config.api_base_url,
        config.request_timeout(),
    )?)
}

/// Opens the configured backend and hands it to `f`.
fn with_store<T>(
    config: &NeptuneConfig,
    f: impl FnOnce(&dyn RecordStore) -> Result<T, CliError>,
) -> Result<T, CliError> {
    info!(
        "event=store_open module=cli status=start backend={:?} dir={}",
        config.store_backend,
        config.data_dir.display()
    );
    match config.store_backend {
        StoreBackend::Json => {
            let store = JsonDirStore::open(&config.data_dir)
                .map_err(|err| CliError::runtime(err.to_string()))?;
            f(&store)
        }
        StoreBackend::Sqlite => {
            let conn = db::open_db(config.sqlite_path())
                .map_err(|err| CliError::runtime(err.to_string()))?;
            let store = SqliteRecordStore::new(&conn);
            f(&store)
        }
    }
}

fn cmd_import(config: &NeptuneConfig) -> Result<(), CliError> {
    let (Some(format), Some(path)) = (config.input_format, config.input_path.as_deref()) else {
        return Err(CliError::usage("an input format and file are required"));
    };
    let bytes = std::fs::read(path)
        .map_err(|err| CliError::usage(format!("cannot read `{}`: {err}", path.display())))?;
    let api = maps_client(config)?;

    let summary = with_store(config, |store| {
        let service = ImportService::new(store, &api);
        let summary = match format {
            InputFormat::GeoJson => service.import(&GeoJsonReader, &bytes, &config.tags),
            InputFormat::Csv => {
                let fetcher = HttpPageFetcher::new(config.request_timeout())?;
                let reader = CsvReader::new(config.csv_columns.clone(), fetcher);
                service.import(&reader, &bytes, &config.tags)
            }
        }?;
        Ok(summary)
    })?;

    println!(
        "imported {} places ({} new, {} merged, {} enriched)",
        summary.parsed, summary.created, summary.merged, summary.enriched
    );
    Ok(())
}

fn cmd_export(config: &NeptuneConfig) -> Result<(), CliError> {
    let options = ExportOptions {
        location: config.location.clone(),
        max_distance_meters: config.distance_meters(),
        tags: config.export_tags.clone(),
    };
    // Routing is only needed for the distance filter.
    let api = if options.location.is_some() {
        Some(maps_client(config)?)
    } else {
        None
    };

    let groups = with_store(config, |store| {
        let service = ExportService::new(store);
        Ok(service.report(&options, api.as_ref().map(|api| api as &dyn PlacesApi))?)
    })?;

    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(render_text(&groups).as_bytes())
        .and_then(|()| stdout.flush())
        .map_err(|err| {
            error!("event=export module=cli status=error stage=write");
            CliError::runtime(format!("cannot write report: {err}"))
        })
}
