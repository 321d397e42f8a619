use log::{info, warn};
use neptune_core::{flush_logging, init_logging, logging_status};
use std::fs;
use std::path::Path;

fn log_contents(dir: &Path) -> String {
    let mut contents = String::new();
    for entry in fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        if path.extension().and_then(|ext| ext.to_str()) == Some("log") {
            contents.push_str(&fs::read_to_string(path).unwrap());
        }
    }
    contents
}

#[test]
fn records_are_on_disk_once_flushed() {
    let dir = tempfile::tempdir().unwrap();
    let log_dir = dir.path().join("logs");

    init_logging("info", &log_dir).unwrap();
    assert_eq!(logging_status().unwrap().1, log_dir);

    info!("event=import module=test status=ok created=2");
    warn!("event=import module=test status=error stage=lookup");
    flush_logging();

    let contents = log_contents(&log_dir);
    assert!(contents.contains("event=app_start module=logging status=ok"));
    assert!(contents.contains("event=import module=test status=ok created=2"));
    assert!(contents.contains("event=import module=test status=error stage=lookup"));
}
