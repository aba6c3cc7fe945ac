//! Cache statistics and metrics tracking

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters and occupancy for a [`TieredCache`](super::TieredCache)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TierStats {
    pub size: usize,
    pub max_entries: usize,
    pub fresh_hits: u64,
    pub stale_hits: u64,
    /// Lookups that found only an expired entry
    pub expired_hits: u64,
    pub misses: u64,
    pub inserts: u64,
    /// Entries removed by the size cap
    pub evictions: u64,
    /// Entries removed by the age sweep
    pub expirations: u64,
}

impl TierStats {
    /// Share of lookups served without a blocking fetch (fresh or stale).
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_rate(&self) -> f64 {
        let total = self.total_lookups();
        if total == 0 {
            0.0
        } else {
            (self.fresh_hits + self.stale_hits) as f64 / total as f64
        }
    }

    pub const fn total_lookups(&self) -> u64 {
        self.fresh_hits + self.stale_hits + self.expired_hits + self.misses
    }
}

/// Lock-free counters updated on every cache operation
#[derive(Debug, Default)]
pub(crate) struct MetricsCollector {
    fresh_hits: AtomicU64,
    stale_hits: AtomicU64,
    expired_hits: AtomicU64,
    misses: AtomicU64,
    inserts: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
}

impl MetricsCollector {
    pub(crate) fn record_fresh_hit(&self) {
        self.fresh_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_stale_hit(&self) {
        self.stale_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_expired_hit(&self) {
        self.expired_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_insert(&self) {
        self.inserts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_evictions(&self, count: usize) {
        self.evictions.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_expirations(&self, count: usize) {
        self.expirations.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, size: usize, max_entries: usize) -> TierStats {
        TierStats {
            size,
            max_entries,
            fresh_hits: self.fresh_hits.load(Ordering::Relaxed),
            stale_hits: self.stale_hits.load(Ordering::Relaxed),
            expired_hits: self.expired_hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            inserts: self.inserts.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
        }
    }
}
