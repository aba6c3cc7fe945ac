//! Tier configuration and builder
//!
//! A tiered cache never stores a TTL on its entries. Each read compares the
//! entry age against two durations:
//!
//! | age                    | tier    |
//! |------------------------|---------|
//! | `< fresh`              | Fresh   |
//! | `fresh ..< stale`      | Stale   |
//! | `>= stale`             | Expired |

use std::time::Duration;

/// Configuration for [`TieredCache`](super::TieredCache)
#[derive(Debug, Clone, PartialEq)]
pub struct TierConfig {
    pub fresh: Duration,
    pub stale: Duration,
    /// Size cap; exceeding it triggers a batch eviction of the oldest entries
    pub max_entries: usize,
    /// Share of `max_entries` evicted per batch, in `[0, 1]`
    pub evict_fraction: f64,
}

impl Default for TierConfig {
    fn default() -> Self {
        Self {
            fresh: Duration::from_secs(10 * 60),
            stale: Duration::from_secs(30 * 60),
            max_entries: 100,
            evict_fraction: 0.2,
        }
    }
}

impl TierConfig {
    pub fn builder() -> TierConfigBuilder {
        TierConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.fresh >= self.stale {
            return Err(format!("fresh ({:?}) must be shorter than stale ({:?})", self.fresh, self.stale));
        }
        if self.max_entries == 0 {
            return Err("max_entries must be greater than 0".to_string());
        }
        if !(0.0..=1.0).contains(&self.evict_fraction) {
            return Err(format!("evict_fraction must be within [0, 1], got {}", self.evict_fraction));
        }
        Ok(())
    }

    /// Entries removed when the cap is exceeded by `excess`.
    pub(crate) fn eviction_batch(&self, excess: usize) -> usize {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
        let fraction = (self.max_entries as f64 * self.evict_fraction).ceil() as usize;
        excess.max(fraction)
    }
}

/// Builder for TierConfig
#[derive(Debug, Default)]
pub struct TierConfigBuilder {
    config: TierConfig,
}

impl TierConfigBuilder {
    pub fn fresh(mut self, fresh: Duration) -> Self {
        self.config.fresh = fresh;
        self
    }

    pub fn stale(mut self, stale: Duration) -> Self {
        self.config.stale = stale;
        self
    }

    pub fn max_entries(mut self, max_entries: usize) -> Self {
        self.config.max_entries = max_entries;
        self
    }

    pub fn evict_fraction(mut self, fraction: f64) -> Self {
        self.config.evict_fraction = fraction;
        self
    }

    pub fn build(self) -> Result<TierConfig, String> {
        self.config.validate()?;
        Ok(self.config)
    }
}
