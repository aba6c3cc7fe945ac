//! Sliding-window rate limiting keyed by logical endpoint
//!
//! Each key owns the timestamps of the requests it admitted within the
//! trailing window. A check prunes expired timestamps, then admits and
//! records only while the count is below the threshold. Admitted entries are
//! never removed early, so `count(window) <= max_requests` always holds.
//!
//! Pruning is lazy: there is no background timer.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::debug;

use super::{Clock, SystemClock};

/// Configuration for the sliding-window limiter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimiterConfig {
    /// Requests admitted per key within one window
    pub max_requests: usize,
    /// Length of the trailing window
    pub window: Duration,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self { max_requests: 30, window: Duration::from_secs(60) }
    }
}

impl RateLimiterConfig {
    pub fn builder() -> RateLimiterConfigBuilder {
        RateLimiterConfigBuilder::new()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_requests == 0 {
            return Err("max_requests must be greater than 0".to_string());
        }
        if self.window.is_zero() {
            return Err("window must be greater than zero".to_string());
        }
        Ok(())
    }
}

/// Builder for RateLimiterConfig
#[derive(Debug, Default)]
pub struct RateLimiterConfigBuilder {
    config: RateLimiterConfig,
}

impl RateLimiterConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_requests(mut self, max_requests: usize) -> Self {
        self.config.max_requests = max_requests;
        self
    }

    pub fn window(mut self, window: Duration) -> Self {
        self.config.window = window;
        self
    }

    pub fn build(self) -> Result<RateLimiterConfig, String> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Per-key sliding-window admission control
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
///
/// use tripline_common::resilience::{RateLimiterConfig, SlidingWindowLimiter};
///
/// # fn example() -> Result<(), String> {
/// let config = RateLimiterConfig::builder().max_requests(2).window(Duration::from_secs(60)).build()?;
/// let limiter = SlidingWindowLimiter::new(config);
///
/// assert!(limiter.is_allowed("/api?endpoint=events"));
/// assert!(limiter.is_allowed("/api?endpoint=events"));
/// assert!(!limiter.is_allowed("/api?endpoint=events"));
/// assert!(limiter.is_allowed("/api?endpoint=destinations"));
/// # Ok(())
/// # }
/// ```
pub struct SlidingWindowLimiter<C: Clock = SystemClock> {
    config: RateLimiterConfig,
    windows: Mutex<HashMap<String, VecDeque<Instant>>>,
    clock: Arc<C>,
}

impl SlidingWindowLimiter<SystemClock> {
    pub fn new(config: RateLimiterConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> SlidingWindowLimiter<C> {
    pub fn with_clock(config: RateLimiterConfig, clock: C) -> Self {
        Self { config, windows: Mutex::new(HashMap::new()), clock: Arc::new(clock) }
    }

    pub fn config(&self) -> &RateLimiterConfig {
        &self.config
    }

    /// Admit and record a request for `key` if the window has room.
    ///
    /// A denied request is not recorded.
    pub fn is_allowed(&self, key: &str) -> bool {
        let now = self.clock.now();
        let mut windows = self.windows.lock();
        let length = self.config.window;
        windows.retain(|_, window| {
            prune(window, now, length);
            !window.is_empty()
        });
        let window = windows.entry(key.to_string()).or_default();

        if window.len() < self.config.max_requests {
            window.push_back(now);
            true
        } else {
            debug!(key, in_window = window.len(), max = self.config.max_requests, "rate limit reached");
            false
        }
    }

    /// When the oldest admitted request for `key` leaves the window.
    ///
    /// `None` when the key has nothing recorded in the current window.
    pub fn reset_time(&self, key: &str) -> Option<Instant> {
        let now = self.clock.now();
        let mut windows = self.windows.lock();
        let window = windows.get_mut(key)?;
        prune(window, now, self.config.window);
        let reset = window.front().map(|oldest| *oldest + self.config.window);
        if reset.is_none() {
            windows.remove(key);
        }
        reset
    }

    /// How long a caller denied admission should wait.
    pub fn retry_after(&self, key: &str) -> Duration {
        let now = self.clock.now();
        self.reset_time(key).map_or(Duration::ZERO, |reset| reset.saturating_duration_since(now))
    }

    /// Requests currently counted against `key`.
    pub fn in_window(&self, key: &str) -> usize {
        let now = self.clock.now();
        let mut windows = self.windows.lock();
        let count = windows.get_mut(key).map_or(0, |window| {
            prune(window, now, self.config.window);
            window.len()
        });
        if count == 0 {
            windows.remove(key);
        }
        count
    }

    /// Keys with at least one request still inside the window, as of the
    /// last admission check.
    pub fn tracked_keys(&self) -> usize {
        self.windows.lock().len()
    }

    /// Forget everything recorded for `key`.
    pub fn reset(&self, key: &str) {
        self.windows.lock().remove(key);
    }

    pub fn clear(&self) {
        self.windows.lock().clear();
    }
}

impl<C: Clock> std::fmt::Debug for SlidingWindowLimiter<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlidingWindowLimiter")
            .field("config", &self.config)
            .field("keys", &self.windows.lock().len())
            .finish()
    }
}

fn prune(window: &mut VecDeque<Instant>, now: Instant, length: Duration) {
    while let Some(oldest) = window.front() {
        if now.saturating_duration_since(*oldest) >= length {
            window.pop_front();
        } else {
            break;
        }
    }
}
