//! Configuration structures
//!
//! Every field carries a default so a partial file (or none at all) yields a
//! working configuration. Durations are stored as milliseconds to keep the
//! TOML/JSON representation flat; accessor methods return [`Duration`].

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::constants::{
    DEFAULT_API_URL, DEFAULT_DISPATCH_DELAY_MS, DEFAULT_FALLBACK_MAX_RETRIES,
    DEFAULT_FRESH_DURATION_MS, DEFAULT_MAX_BACKOFF_MS, DEFAULT_MAX_CONCURRENT,
    DEFAULT_PROBE_INTERVAL_MS, DEFAULT_PROBE_TIMEOUT_MS, DEFAULT_RATE_LIMIT_MAX_REQUESTS,
    DEFAULT_RATE_LIMIT_WINDOW_MS, DEFAULT_READ_BASE_DELAY_MS, DEFAULT_READ_MAX_JITTER_MS,
    DEFAULT_READ_MAX_RETRIES, DEFAULT_STALE_DURATION_MS, DEFAULT_TIMEOUT_MS, DEFAULT_USER_AGENT,
    DEFAULT_WRITE_BASE_DELAY_MS, DEFAULT_WRITE_MAX_JITTER_MS, DEFAULT_WRITE_MAX_RETRIES,
    DESTINATIONS_CACHE_EVICT_FRACTION, DESTINATIONS_CACHE_MAX_ENTRIES, EVENTS_CACHE_EVICT_FRACTION,
    EVENTS_CACHE_MAX_ENTRIES,
};
use crate::errors::{Result, TriplineError};

/// Root configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriplineConfig {
    pub api: ApiConfig,
    pub fetch: FetchConfig,
    #[serde(default = "ServiceConfig::destinations")]
    pub destinations: ServiceConfig,
    #[serde(default = "ServiceConfig::events")]
    pub events: ServiceConfig,
    pub connectivity: ConnectivityConfig,
    pub logging: LoggingConfig,
}

impl Default for TriplineConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            fetch: FetchConfig::default(),
            destinations: ServiceConfig::destinations(),
            events: ServiceConfig::events(),
            connectivity: ConnectivityConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl TriplineConfig {
    /// Check cross-field invariants that serde defaults cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`TriplineError::Config`] describing the first violation.
    pub fn validate(&self) -> Result<()> {
        self.api.primary_url()?;
        self.api.fallback_urls()?;

        if self.fetch.max_concurrent == 0 {
            return Err(TriplineError::Config("fetch.max_concurrent must be at least 1".into()));
        }
        if self.fetch.timeout_ms == 0 {
            return Err(TriplineError::Config("fetch.timeout_ms must be greater than 0".into()));
        }
        if self.fetch.rate_limit.max_requests == 0 || self.fetch.rate_limit.window_ms == 0 {
            return Err(TriplineError::Config(
                "fetch.rate_limit requires max_requests > 0 and window_ms > 0".into(),
            ));
        }

        for (name, service) in [("destinations", &self.destinations), ("events", &self.events)] {
            service.cache.validate().map_err(|msg| TriplineError::Config(format!("{name}.cache: {msg}")))?;
        }
        Ok(())
    }

    /// Read retry policy for a service, falling back to the shared one.
    pub fn read_retry_for(&self, service: &ServiceConfig) -> RetrySettings {
        service.read_retry.clone().unwrap_or_else(|| self.fetch.read_retry.clone())
    }

    /// Write retry policy for a service, falling back to the shared one.
    pub fn write_retry_for(&self, service: &ServiceConfig) -> RetrySettings {
        service.write_retry.clone().unwrap_or_else(|| self.fetch.write_retry.clone())
    }
}

/// Upstream API location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Primary endpoint; resource selection happens through query params.
    pub base_url: String,
    /// Tried in order after the primary has exhausted its retries.
    pub fallback_urls: Vec<String>,
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            fallback_urls: Vec::new(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ApiConfig {
    /// # Errors
    ///
    /// Returns [`TriplineError::Config`] if `base_url` is not an absolute URL.
    pub fn primary_url(&self) -> Result<Url> {
        parse_url("api.base_url", &self.base_url)
    }

    /// # Errors
    ///
    /// Returns [`TriplineError::Config`] naming the first unparsable entry.
    pub fn fallback_urls(&self) -> Result<Vec<Url>> {
        self.fallback_urls.iter().map(|raw| parse_url("api.fallback_urls", raw)).collect()
    }
}

fn parse_url(field: &str, raw: &str) -> Result<Url> {
    Url::parse(raw.trim()).map_err(|e| TriplineError::Config(format!("{field}: invalid URL '{raw}': {e}")))
}

/// Request execution limits shared by every service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_ms: u64,
    pub max_concurrent: usize,
    pub dispatch_delay_ms: u64,
    pub rate_limit: RateLimitSettings,
    pub read_retry: RetrySettings,
    /// Retries granted to each fallback URL.
    pub fallback_retries: u32,
    pub write_retry: RetrySettings,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            dispatch_delay_ms: DEFAULT_DISPATCH_DELAY_MS,
            rate_limit: RateLimitSettings::default(),
            read_retry: RetrySettings::read(),
            fallback_retries: DEFAULT_FALLBACK_MAX_RETRIES,
            write_retry: RetrySettings::write(),
        }
    }
}

impl FetchConfig {
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub const fn dispatch_delay(&self) -> Duration {
        Duration::from_millis(self.dispatch_delay_ms)
    }
}

/// Sliding-window admission thresholds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    pub max_requests: usize,
    pub window_ms: u64,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self { max_requests: DEFAULT_RATE_LIMIT_MAX_REQUESTS, window_ms: DEFAULT_RATE_LIMIT_WINDOW_MS }
    }
}

impl RateLimitSettings {
    pub const fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

/// Exponential backoff parameters: `base * 2^attempt + jitter`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    /// Upper bound (exclusive) of the random jitter added to each delay.
    pub max_jitter_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self::read()
    }
}

impl RetrySettings {
    pub const fn read() -> Self {
        Self {
            max_retries: DEFAULT_READ_MAX_RETRIES,
            base_delay_ms: DEFAULT_READ_BASE_DELAY_MS,
            max_jitter_ms: DEFAULT_READ_MAX_JITTER_MS,
            max_delay_ms: DEFAULT_MAX_BACKOFF_MS,
        }
    }

    pub const fn write() -> Self {
        Self {
            max_retries: DEFAULT_WRITE_MAX_RETRIES,
            base_delay_ms: DEFAULT_WRITE_BASE_DELAY_MS,
            max_jitter_ms: DEFAULT_WRITE_MAX_JITTER_MS,
            max_delay_ms: DEFAULT_MAX_BACKOFF_MS,
        }
    }

    pub const fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub const fn max_jitter(&self) -> Duration {
        Duration::from_millis(self.max_jitter_ms)
    }

    pub const fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}

/// Per-service settings. Retry overrides are optional; when absent the
/// shared [`FetchConfig`] policies apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_retry: Option<RetrySettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write_retry: Option<RetrySettings>,
}

impl ServiceConfig {
    pub fn destinations() -> Self {
        Self {
            cache: CacheSettings {
                max_entries: DESTINATIONS_CACHE_MAX_ENTRIES,
                evict_fraction: DESTINATIONS_CACHE_EVICT_FRACTION,
                ..CacheSettings::default()
            },
            read_retry: None,
            write_retry: None,
        }
    }

    pub fn events() -> Self {
        Self {
            cache: CacheSettings {
                max_entries: EVENTS_CACHE_MAX_ENTRIES,
                evict_fraction: EVENTS_CACHE_EVICT_FRACTION,
                ..CacheSettings::default()
            },
            read_retry: None,
            write_retry: None,
        }
    }
}

/// Cache tier durations and size cap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub fresh_ms: u64,
    pub stale_ms: u64,
    pub max_entries: usize,
    /// Share of `max_entries` evicted at once when the cap is exceeded.
    pub evict_fraction: f64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            fresh_ms: DEFAULT_FRESH_DURATION_MS,
            stale_ms: DEFAULT_STALE_DURATION_MS,
            max_entries: DESTINATIONS_CACHE_MAX_ENTRIES,
            evict_fraction: DESTINATIONS_CACHE_EVICT_FRACTION,
        }
    }
}

impl CacheSettings {
    pub const fn fresh(&self) -> Duration {
        Duration::from_millis(self.fresh_ms)
    }

    pub const fn stale(&self) -> Duration {
        Duration::from_millis(self.stale_ms)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.fresh_ms >= self.stale_ms {
            return Err(format!("fresh_ms ({}) must be less than stale_ms ({})", self.fresh_ms, self.stale_ms));
        }
        if self.max_entries == 0 {
            return Err("max_entries must be at least 1".into());
        }
        if !(0.0..=1.0).contains(&self.evict_fraction) {
            return Err(format!("evict_fraction must be within [0, 1], got {}", self.evict_fraction));
        }
        Ok(())
    }
}

/// Background reachability probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectivityConfig {
    pub probe_enabled: bool,
    pub probe_interval_ms: u64,
    pub probe_timeout_ms: u64,
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            probe_enabled: true,
            probe_interval_ms: DEFAULT_PROBE_INTERVAL_MS,
            probe_timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
        }
    }
}

impl ConnectivityConfig {
    pub const fn probe_interval(&self) -> Duration {
        Duration::from_millis(self.probe_interval_ms)
    }

    pub const fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

crate::impl_wire_name_conversions!(LogFormat {
    Pretty => "pretty",
    Json => "json",
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `tripline_core=debug,info`.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: LogFormat::Pretty }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_thresholds() {
        let config = TriplineConfig::default();
        assert_eq!(config.fetch.timeout(), Duration::from_secs(15));
        assert_eq!(config.fetch.max_concurrent, 3);
        assert_eq!(config.fetch.rate_limit.max_requests, 30);
        assert_eq!(config.fetch.rate_limit.window(), Duration::from_secs(60));
        assert_eq!(config.fetch.read_retry.max_retries, 3);
        assert_eq!(config.fetch.fallback_retries, 0);
        assert_eq!(config.fetch.write_retry.max_retries, 2);
        assert_eq!(config.destinations.cache.max_entries, 100);
        assert_eq!(config.events.cache.max_entries, 50);
        assert_eq!(config.events.cache.fresh(), Duration::from_secs(600));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_document_keeps_defaults() {
        let config: TriplineConfig = from_json(
            r#"{"api": {"base_url": "https://api.example.com/exec"}, "fetch": {"max_concurrent": 5}}"#,
        );
        assert_eq!(config.api.base_url, "https://api.example.com/exec");
        assert_eq!(config.fetch.max_concurrent, 5);
        assert_eq!(config.fetch.timeout_ms, DEFAULT_TIMEOUT_MS);
        assert_eq!(config.events.cache.max_entries, 50);
    }

    #[test]
    fn validate_rejects_inverted_tiers() {
        let mut config = TriplineConfig::default();
        config.events.cache.fresh_ms = config.events.cache.stale_ms;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("events.cache"));
    }

    #[test]
    fn validate_rejects_bad_urls_and_zero_limits() {
        let mut config = TriplineConfig::default();
        config.api.fallback_urls.push("not a url".into());
        assert!(config.validate().is_err());

        let mut config = TriplineConfig::default();
        config.fetch.max_concurrent = 0;
        assert!(config.validate().is_err());

        let mut config = TriplineConfig::default();
        config.fetch.rate_limit.window_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn service_retry_overrides_take_precedence() {
        let mut config = TriplineConfig::default();
        assert_eq!(config.read_retry_for(&config.events), config.fetch.read_retry);

        config.events.read_retry = Some(RetrySettings { max_retries: 1, ..RetrySettings::read() });
        assert_eq!(config.read_retry_for(&config.events).max_retries, 1);
        assert_eq!(config.write_retry_for(&config.events), RetrySettings::write());
    }

    #[test]
    fn log_format_parses_from_env_strings() {
        assert_eq!("JSON".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert!("xml".parse::<LogFormat>().is_err());
    }

    fn from_json(json: &str) -> TriplineConfig {
        serde_json::from_str(json).unwrap()
    }
}
