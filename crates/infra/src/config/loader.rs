//! Configuration loader
//!
//! ## Loading Strategy
//! 1. Start from [`TriplineConfig::default`]
//! 2. Merge a config file, if one is found
//! 3. Apply `TRIPLINE_*` environment overrides
//! 4. Validate the result
//!
//! Files are partial: any field they omit keeps its default.
//!
//! ## Environment Variables
//! - `TRIPLINE_CONFIG`: explicit config file path (must exist)
//! - `TRIPLINE_API_URL`: primary API URL
//! - `TRIPLINE_FALLBACK_URLS`: comma-separated fallback URLs
//! - `TRIPLINE_TIMEOUT_MS`: per-attempt timeout
//! - `TRIPLINE_MAX_CONCURRENT`: request queue slots
//! - `TRIPLINE_RATE_LIMIT_MAX`: requests admitted per window
//! - `TRIPLINE_RATE_LIMIT_WINDOW_MS`: rate limit window length
//! - `TRIPLINE_PROBE_ENABLED`: whether the connectivity probe runs (true/false)
//! - `TRIPLINE_LOG_LEVEL`: `EnvFilter` directive
//! - `TRIPLINE_LOG_FORMAT`: `pretty` or `json`
//!
//! ## File Locations
//! Without `TRIPLINE_CONFIG`, the loader probes (in order):
//! 1. `./tripline.toml`, `./tripline.json`
//! 2. `./config/tripline.toml`, `./config/tripline.json`

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;
use tripline_domain::constants::{CONFIG_ENV_PREFIX, CONFIG_FILE_STEM};
use tripline_domain::{LogFormat, Result, TriplineConfig, TriplineError};

/// Failure while locating, reading or overriding configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML format in {}: {source}", .path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid JSON format in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid value for {var}: {reason}")]
    InvalidEnv { var: String, reason: String },
}

impl From<ConfigError> for TriplineError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value.to_string())
    }
}

/// Load configuration from the process environment and working directory.
///
/// # Errors
/// Returns `TriplineError::Config` if a file cannot be read or parsed, an
/// override is malformed, or the merged configuration fails validation.
pub fn load() -> Result<TriplineConfig> {
    load_with_env(|key| std::env::var(key).ok())
}

/// Load configuration with an injected environment lookup.
///
/// # Errors
/// Same as [`load`].
pub fn load_with_env<F>(env: F) -> Result<TriplineConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let explicit = lookup(&env, &env_key("CONFIG")).map(PathBuf::from);
    let path = match explicit {
        Some(path) if !path.exists() => return Err(ConfigError::NotFound(path).into()),
        Some(path) => Some(path),
        None => std::env::current_dir().ok().and_then(|cwd| probe_config_paths(&cwd)),
    };

    let mut config = match path {
        Some(path) => read_config(&path)?,
        None => {
            tracing::debug!("No config file found, using defaults");
            TriplineConfig::default()
        }
    };

    apply_env_overrides(&mut config, &env)?;
    config.validate()?;
    Ok(config)
}

/// Load and validate a single config file, without environment overrides.
///
/// Format is detected by extension (`.toml` or `.json`).
///
/// # Errors
/// Returns `TriplineError::Config` if the file is missing, malformed or
/// invalid.
pub fn load_from_file(path: &Path) -> Result<TriplineConfig> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()).into());
    }
    let config = read_config(path)?;
    config.validate()?;
    Ok(config)
}

fn read_config(path: &Path) -> std::result::Result<TriplineConfig, ConfigError> {
    tracing::info!(path = %path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(path)
        .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;

    parse_config(&contents, path)
}

fn parse_config(contents: &str, path: &Path) -> std::result::Result<TriplineConfig, ConfigError> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match extension {
        "toml" => toml::from_str(contents).map_err(|source| ConfigError::Toml { path: path.to_path_buf(), source }),
        "json" => {
            serde_json::from_str(contents).map_err(|source| ConfigError::Json { path: path.to_path_buf(), source })
        }
        other => Err(ConfigError::UnsupportedFormat(other.to_string())),
    }
}

/// First existing config file under `base`.
pub fn probe_config_paths(base: &Path) -> Option<PathBuf> {
    let toml = format!("{CONFIG_FILE_STEM}.toml");
    let json = format!("{CONFIG_FILE_STEM}.json");
    let config_dir = base.join("config");

    [base.join(&toml), base.join(&json), config_dir.join(&toml), config_dir.join(&json)]
        .into_iter()
        .find(|path| path.is_file())
}

/// Overlay `TRIPLINE_*` variables onto `config`.
///
/// Unset and blank variables leave the field alone.
///
/// # Errors
/// Returns [`ConfigError::InvalidEnv`] naming the first malformed variable.
pub fn apply_env_overrides<F>(config: &mut TriplineConfig, env: F) -> std::result::Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup(&env, &env_key("API_URL")) {
        config.api.base_url = url;
    }
    if let Some(urls) = lookup(&env, &env_key("FALLBACK_URLS")) {
        config.api.fallback_urls =
            urls.split(',').map(str::trim).filter(|url| !url.is_empty()).map(str::to_string).collect();
    }
    if let Some(timeout) = parse_env(&env, "TIMEOUT_MS")? {
        config.fetch.timeout_ms = timeout;
    }
    if let Some(slots) = parse_env(&env, "MAX_CONCURRENT")? {
        config.fetch.max_concurrent = slots;
    }
    if let Some(max) = parse_env(&env, "RATE_LIMIT_MAX")? {
        config.fetch.rate_limit.max_requests = max;
    }
    if let Some(window) = parse_env(&env, "RATE_LIMIT_WINDOW_MS")? {
        config.fetch.rate_limit.window_ms = window;
    }
    if let Some(enabled) = env_bool(&env, &env_key("PROBE_ENABLED")) {
        config.connectivity.probe_enabled = enabled;
    }
    if let Some(level) = lookup(&env, &env_key("LOG_LEVEL")) {
        config.logging.level = level;
    }
    if let Some(format) = lookup(&env, &env_key("LOG_FORMAT")) {
        config.logging.format = format
            .parse::<LogFormat>()
            .map_err(|reason| ConfigError::InvalidEnv { var: env_key("LOG_FORMAT"), reason })?;
    }
    Ok(())
}

fn env_key(suffix: &str) -> String {
    format!("{CONFIG_ENV_PREFIX}{suffix}")
}

fn lookup<F>(env: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    env(key).map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}

fn parse_env<F, T>(env: &F, suffix: &str) -> std::result::Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    let key = env_key(suffix);
    lookup(env, &key)
        .map(|raw| raw.parse::<T>().map_err(|e| ConfigError::InvalidEnv { var: key.clone(), reason: e.to_string() }))
        .transpose()
}

/// Parse boolean from an environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive).
/// Anything else counts as `false`.
fn env_bool<F>(env: &F, key: &str) -> Option<bool>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(env, key).map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_env_bool_parsing() {
        let vars = env(&[("A", "1"), ("B", "TRUE"), ("C", "on"), ("D", "0"), ("E", "off"), ("F", "  ")]);

        assert_eq!(env_bool(&vars, "A"), Some(true));
        assert_eq!(env_bool(&vars, "B"), Some(true));
        assert_eq!(env_bool(&vars, "C"), Some(true));
        assert_eq!(env_bool(&vars, "D"), Some(false));
        assert_eq!(env_bool(&vars, "E"), Some(false));
        assert_eq!(env_bool(&vars, "F"), None);
        assert_eq!(env_bool(&vars, "MISSING"), None);
    }

    #[test]
    fn overrides_apply_every_documented_variable() {
        let mut config = TriplineConfig::default();
        let vars = env(&[
            ("TRIPLINE_API_URL", "https://api.example.com/exec"),
            ("TRIPLINE_FALLBACK_URLS", " https://a.example.com/exec, ,https://b.example.com/exec "),
            ("TRIPLINE_TIMEOUT_MS", "5000"),
            ("TRIPLINE_MAX_CONCURRENT", "6"),
            ("TRIPLINE_RATE_LIMIT_MAX", "10"),
            ("TRIPLINE_RATE_LIMIT_WINDOW_MS", "1000"),
            ("TRIPLINE_PROBE_ENABLED", "no"),
            ("TRIPLINE_LOG_LEVEL", "tripline_core=debug"),
            ("TRIPLINE_LOG_FORMAT", "JSON"),
        ]);

        apply_env_overrides(&mut config, vars).unwrap();

        assert_eq!(config.api.base_url, "https://api.example.com/exec");
        assert_eq!(config.api.fallback_urls, vec!["https://a.example.com/exec", "https://b.example.com/exec"]);
        assert_eq!(config.fetch.timeout_ms, 5_000);
        assert_eq!(config.fetch.max_concurrent, 6);
        assert_eq!(config.fetch.rate_limit.max_requests, 10);
        assert_eq!(config.fetch.rate_limit.window_ms, 1_000);
        assert!(!config.connectivity.probe_enabled);
        assert_eq!(config.logging.level, "tripline_core=debug");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn malformed_override_names_the_variable() {
        let mut config = TriplineConfig::default();
        let err = apply_env_overrides(&mut config, env(&[("TRIPLINE_MAX_CONCURRENT", "lots")])).unwrap_err();

        assert!(matches!(&err, ConfigError::InvalidEnv { var, .. } if var == "TRIPLINE_MAX_CONCURRENT"));
        assert!(matches!(TriplineError::from(err), TriplineError::Config(_)));

        let err = apply_env_overrides(&mut config, env(&[("TRIPLINE_LOG_FORMAT", "xml")])).unwrap_err();
        assert!(err.to_string().contains("TRIPLINE_LOG_FORMAT"));
    }

    #[test]
    fn unset_variables_keep_defaults() {
        let mut config = TriplineConfig::default();
        apply_env_overrides(&mut config, env(&[])).unwrap();

        assert_eq!(config, TriplineConfig::default());
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = parse_config("", Path::new("tripline.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(ext) if ext == "yaml"));
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let result = load_with_env(env(&[("TRIPLINE_CONFIG", "/definitely/not/here/tripline.toml")]));

        assert!(matches!(result, Err(TriplineError::Config(msg)) if msg.contains("not found")));
    }
}
