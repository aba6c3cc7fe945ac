//! Translation from configuration records to runtime primitives

use tripline_common::cache::TierConfig;
use tripline_common::resilience::{BackoffStrategy, Jitter, QueueConfig, RateLimiterConfig, RetryConfig};
use tripline_domain::{CacheSettings, FetchConfig, RateLimitSettings, RetrySettings, ServiceConfig, TriplineConfig};

/// `base * 2^attempt + jitter`, capped at `max_delay`.
pub fn retry_config(settings: &RetrySettings) -> RetryConfig {
    RetryConfig {
        max_retries: settings.max_retries,
        backoff: BackoffStrategy::doubling(settings.base_delay(), settings.max_delay()),
        jitter: Jitter::Additive(settings.max_jitter()),
    }
}

/// Budget for each fallback candidate: the read backoff shape with its own
/// retry count.
pub fn fallback_retry_config(fetch: &FetchConfig) -> RetryConfig {
    RetryConfig { max_retries: fetch.fallback_retries, ..retry_config(&fetch.read_retry) }
}

pub fn tier_config(settings: &CacheSettings) -> TierConfig {
    TierConfig {
        fresh: settings.fresh(),
        stale: settings.stale(),
        max_entries: settings.max_entries,
        evict_fraction: settings.evict_fraction,
    }
}

pub fn rate_limiter_config(settings: &RateLimitSettings) -> RateLimiterConfig {
    RateLimiterConfig { max_requests: settings.max_requests, window: settings.window() }
}

pub fn queue_config(fetch: &FetchConfig) -> QueueConfig {
    QueueConfig { max_concurrent: fetch.max_concurrent, dispatch_delay: fetch.dispatch_delay() }
}

/// Cache tiers and retry budgets for one resource family
#[derive(Debug, Clone, PartialEq)]
pub struct ServicePolicy {
    pub cache: TierConfig,
    pub read_retry: RetryConfig,
    pub write_retry: RetryConfig,
}

impl ServicePolicy {
    /// Shared fetch settings with `service` overrides applied.
    pub fn from_config(config: &TriplineConfig, service: &ServiceConfig) -> Self {
        Self {
            cache: tier_config(&service.cache),
            read_retry: retry_config(&config.read_retry_for(service)),
            write_retry: retry_config(&config.write_retry_for(service)),
        }
    }
}

impl Default for ServicePolicy {
    fn default() -> Self {
        Self {
            cache: TierConfig::default(),
            read_retry: retry_config(&RetrySettings::read()),
            write_retry: retry_config(&RetrySettings::write()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn read_defaults_map_to_doubling_backoff() {
        let retry = retry_config(&RetrySettings::read());
        assert_eq!(retry.max_retries, 3);
        assert_eq!(retry.backoff.calculate_delay(0), Duration::from_millis(1000));
        assert_eq!(retry.backoff.calculate_delay(2), Duration::from_millis(4000));
        assert_eq!(retry.jitter, Jitter::Additive(Duration::from_millis(1000)));
    }

    #[test]
    fn fallback_budget_is_one_attempt_by_default() {
        let fallback = fallback_retry_config(&FetchConfig::default());
        assert_eq!(fallback.max_attempts(), 1);
    }

    #[test]
    fn service_overrides_win() {
        let mut config = TriplineConfig::default();
        config.events.read_retry = Some(RetrySettings { max_retries: 1, ..RetrySettings::read() });

        let events = ServicePolicy::from_config(&config, &config.events);
        let destinations = ServicePolicy::from_config(&config, &config.destinations);

        assert_eq!(events.read_retry.max_retries, 1);
        assert_eq!(destinations.read_retry.max_retries, 3);
        assert_eq!(events.write_retry.max_retries, 2);
        assert_eq!(events.cache.max_entries, 50);
        assert_eq!(destinations.cache.max_entries, 100);
    }
}
