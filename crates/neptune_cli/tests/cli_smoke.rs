use neptune_core::{JsonDirStore, Place, PlaceRepository};
use std::fs;
use std::path::Path;
use std::process::{Command, Output};

/// Runs the built binary against an isolated config and data directory.
fn neptune(workspace: &Path, args: &[&str]) -> Output {
    let config = workspace.join("config.toml");
    if !config.exists() {
        fs::write(&config, "").unwrap();
    }
    Command::new(env!("CARGO_BIN_EXE_neptune"))
        .arg("--config")
        .arg(&config)
        .arg("--dir")
        .arg(workspace.join("data"))
        .args(args)
        .env_remove("NEPTUNE_MAPS_KEY")
        .output()
        .unwrap()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn seed(data_dir: &Path, entries: &[(&str, &str, &str)]) {
    let repo = PlaceRepository::new(JsonDirStore::open(data_dir).unwrap());
    for (name, address, category) in entries {
        let mut place = Place::new(*name, *address);
        place.categories = vec![category.to_string()];
        repo.save(&place).unwrap();
    }
}

fn log_contents(log_dir: &Path) -> String {
    let mut contents = String::new();
    for entry in fs::read_dir(log_dir).unwrap() {
        contents.push_str(&fs::read_to_string(entry.unwrap().path()).unwrap_or_default());
    }
    contents
}

#[test]
fn export_text_prints_grouped_listing() {
    let workspace = tempfile::tempdir().unwrap();
    seed(
        &workspace.path().join("data"),
        &[("Taco", "1 Mission St", "food"), ("Inn", "2 Market St", "lodging")],
    );

    let output = neptune(workspace.path(), &["export", "text"]);

    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "# Food\n* Taco\n\n# Lodging\n* Inn\n\n"
    );
    assert!(stderr(&output).is_empty());
}

#[test]
fn run_is_recorded_in_the_log_file() {
    let workspace = tempfile::tempdir().unwrap();
    let log_dir = workspace.path().join("run-logs");

    let output = neptune(
        workspace.path(),
        &["--log-dir", log_dir.to_str().unwrap(), "export", "text"],
    );

    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
    let contents = log_contents(&log_dir);
    assert!(contents.contains("event=app_start module=logging status=ok"));
    assert!(contents.contains("event=store_open module=cli status=start"));
}

#[test]
fn default_log_dir_lives_under_the_data_dir() {
    let workspace = tempfile::tempdir().unwrap();

    let output = neptune(workspace.path(), &["export", "text"]);

    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
    let contents = log_contents(&workspace.path().join("data").join("logs"));
    assert!(contents.contains("event=app_start"));
}

#[test]
fn import_without_maps_key_is_a_usage_error() {
    let workspace = tempfile::tempdir().unwrap();
    let input = workspace.path().join("saved.json");
    fs::write(&input, r#"{"type":"FeatureCollection","features":[]}"#).unwrap();

    let output = neptune(
        workspace.path(),
        &["import", "geojson", "-f", input.to_str().unwrap()],
    );

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("NEPTUNE_MAPS_KEY"));
}

#[test]
fn unreadable_input_is_a_usage_error() {
    let workspace = tempfile::tempdir().unwrap();
    let missing = workspace.path().join("missing.json");

    let output = neptune(
        workspace.path(),
        &["--maps-key", "k", "import", "geojson", "-f", missing.to_str().unwrap()],
    );

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("cannot read"));
}

#[test]
fn unknown_input_format_is_rejected_by_the_parser() {
    let workspace = tempfile::tempdir().unwrap();

    let output = neptune(workspace.path(), &["import", "kml", "-f", "saved.kml"]);

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("kml"));
}

#[test]
fn unknown_store_backend_is_rejected_by_the_parser() {
    let workspace = tempfile::tempdir().unwrap();

    let output = neptune(workspace.path(), &["--store", "redis", "export", "text"]);

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("redis"));
}

#[test]
fn sqlite_backend_flag_selects_the_sqlite_file() {
    let workspace = tempfile::tempdir().unwrap();

    let output = neptune(workspace.path(), &["--store", "sqlite", "export", "text"]);

    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
    assert!(workspace.path().join("data").join("neptune.sqlite3").is_file());
}

#[test]
fn runtime_failure_is_reported_once() {
    let workspace = tempfile::tempdir().unwrap();
    let input = workspace.path().join("broken.json");
    fs::write(&input, "not json").unwrap();

    let output = neptune(
        workspace.path(),
        &["--maps-key", "k", "import", "geojson", "-f", input.to_str().unwrap()],
    );

    assert_eq!(output.status.code(), Some(1));
    let stderr = stderr(&output);
    assert_eq!(stderr.matches("error:").count(), 1, "{stderr}");
    assert!(!stderr.contains("event="), "{stderr}");
}
