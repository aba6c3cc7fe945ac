//! Config files on disk merged with environment overrides

use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

use tempfile::{Builder, TempDir};
use tripline_domain::{LogFormat, TriplineError};
use tripline_infra::config::{load_from_file, load_with_env, probe_config_paths};

fn env(pairs: &[(&str, String)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs.iter().map(|(k, v)| ((*k).to_string(), v.clone())).collect();
    move |key| map.get(key).cloned()
}

fn write(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, contents).unwrap();
    path
}

const TOML: &str = r#"
[api]
base_url = "https://api.example.com/exec"
fallback_urls = ["https://mirror.example.com/exec"]

[fetch]
max_concurrent = 4

[fetch.read_retry]
max_retries = 5

[events.cache]
fresh_ms = 60000
stale_ms = 120000
max_entries = 20

[logging]
format = "json"
"#;

#[test]
fn toml_file_merges_over_defaults() {
    let mut file = Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(TOML.as_bytes()).unwrap();

    let config = load_from_file(file.path()).unwrap();

    assert_eq!(config.api.base_url, "https://api.example.com/exec");
    assert_eq!(config.api.fallback_urls, vec!["https://mirror.example.com/exec"]);
    assert_eq!(config.fetch.max_concurrent, 4);
    assert_eq!(config.fetch.read_retry.max_retries, 5);
    assert_eq!(config.fetch.read_retry.base_delay_ms, 1_000);
    assert_eq!(config.events.cache.max_entries, 20);
    assert_eq!(config.destinations.cache.max_entries, 100);
    assert_eq!(config.logging.format, LogFormat::Json);
}

#[test]
fn json_file_is_detected_by_extension() {
    let mut file = Builder::new().suffix(".json").tempfile().unwrap();
    file.write_all(br#"{"fetch": {"timeout_ms": 2500}, "connectivity": {"probe_enabled": false}}"#).unwrap();

    let config = load_from_file(file.path()).unwrap();

    assert_eq!(config.fetch.timeout_ms, 2_500);
    assert!(!config.connectivity.probe_enabled);
}

#[test]
fn malformed_and_invalid_files_are_config_errors() {
    let dir = TempDir::new().unwrap();

    let broken = write(dir.path(), "broken.toml", "[api\nbase_url = 1");
    let err = load_from_file(&broken).unwrap_err();
    assert!(matches!(&err, TriplineError::Config(msg) if msg.contains("Invalid TOML")), "{err}");

    let inverted = write(dir.path(), "inverted.json", r#"{"destinations": {"cache": {"fresh_ms": 10, "stale_ms": 5}}}"#);
    let err = load_from_file(&inverted).unwrap_err();
    assert!(matches!(&err, TriplineError::Config(msg) if msg.contains("destinations.cache")), "{err}");
}

#[test]
fn environment_overrides_file_values() {
    let dir = TempDir::new().unwrap();
    let path = write(dir.path(), "tripline.toml", TOML);

    let config = load_with_env(env(&[
        ("TRIPLINE_CONFIG", path.display().to_string()),
        ("TRIPLINE_MAX_CONCURRENT", "2".into()),
        ("TRIPLINE_LOG_FORMAT", "pretty".into()),
    ]))
    .unwrap();

    assert_eq!(config.api.base_url, "https://api.example.com/exec");
    assert_eq!(config.fetch.max_concurrent, 2);
    assert_eq!(config.fetch.read_retry.max_retries, 5);
    assert_eq!(config.logging.format, LogFormat::Pretty);
}

#[test]
fn overrides_are_validated_after_merge() {
    let dir = TempDir::new().unwrap();
    let path = write(dir.path(), "tripline.json", "{}");

    let err = load_with_env(env(&[
        ("TRIPLINE_CONFIG", path.display().to_string()),
        ("TRIPLINE_RATE_LIMIT_MAX", "0".into()),
    ]))
    .unwrap_err();

    assert!(matches!(err, TriplineError::Config(msg) if msg.contains("rate_limit")));
}

#[test]
fn probe_prefers_working_directory_then_config_dir() {
    let dir = TempDir::new().unwrap();
    assert_eq!(probe_config_paths(dir.path()), None);

    let nested = write(dir.path(), "config/tripline.json", "{}");
    assert_eq!(probe_config_paths(dir.path()), Some(nested));

    let nested_toml = write(dir.path(), "config/tripline.toml", "");
    assert_eq!(probe_config_paths(dir.path()), Some(nested_toml));

    let top = write(dir.path(), "tripline.json", "{}");
    assert_eq!(probe_config_paths(dir.path()), Some(top));
}
