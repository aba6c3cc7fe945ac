//! Fetch layer constants
//!
//! Defaults for every tunable threshold. Deployment configuration may
//! override the numbers; the algorithms do not change.

// Upstream API
pub const DEFAULT_API_URL: &str = "http://localhost:8787/api";
pub const DEFAULT_USER_AGENT: &str = concat!("tripline/", env!("CARGO_PKG_VERSION"));

// Request execution
pub const DEFAULT_TIMEOUT_MS: u64 = 15_000;
pub const DEFAULT_MAX_CONCURRENT: usize = 3;
pub const DEFAULT_DISPATCH_DELAY_MS: u64 = 100;

// Rate limiting (sliding window)
pub const DEFAULT_RATE_LIMIT_MAX_REQUESTS: usize = 30;
pub const DEFAULT_RATE_LIMIT_WINDOW_MS: u64 = 60_000;

// Read retry: 3 retries on the primary URL, none on fallbacks
pub const DEFAULT_READ_MAX_RETRIES: u32 = 3;
pub const DEFAULT_READ_BASE_DELAY_MS: u64 = 1_000;
pub const DEFAULT_READ_MAX_JITTER_MS: u64 = 1_000;
pub const DEFAULT_FALLBACK_MAX_RETRIES: u32 = 0;

// Write retry
pub const DEFAULT_WRITE_MAX_RETRIES: u32 = 2;
pub const DEFAULT_WRITE_BASE_DELAY_MS: u64 = 1_500;
pub const DEFAULT_WRITE_MAX_JITTER_MS: u64 = 500;

pub const DEFAULT_MAX_BACKOFF_MS: u64 = 30_000;

// Cache tiers
pub const DEFAULT_FRESH_DURATION_MS: u64 = 10 * 60 * 1_000;
pub const DEFAULT_STALE_DURATION_MS: u64 = 30 * 60 * 1_000;
pub const DESTINATIONS_CACHE_MAX_ENTRIES: usize = 100;
pub const DESTINATIONS_CACHE_EVICT_FRACTION: f64 = 0.2;
pub const EVENTS_CACHE_MAX_ENTRIES: usize = 50;
pub const EVENTS_CACHE_EVICT_FRACTION: f64 = 0.1;

// Performance monitoring
pub const METRICS_BUFFER_CAPACITY: usize = 100;
pub const SLOW_REQUEST_THRESHOLD_MS: u64 = 3_000;

// Connectivity probe
pub const DEFAULT_PROBE_INTERVAL_MS: u64 = 30_000;
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 5_000;

// Configuration discovery
pub const CONFIG_ENV_PREFIX: &str = "TRIPLINE_";
pub const CONFIG_FILE_STEM: &str = "tripline";
