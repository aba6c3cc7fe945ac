//! Tiered TTL cache core
//!
//! Reads classify entries by age ([`Freshness`]) without removing anything;
//! the caller decides what a stale or expired hit means. Writes are where
//! housekeeping happens: every insert sweeps entries past the stale limit
//! and, when the store is over its cap, evicts a batch of the oldest.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tracing::debug;

use super::config::TierConfig;
use super::stats::{MetricsCollector, TierStats};
use crate::resilience::{Clock, SystemClock};

/// Age tier of an entry at read time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Freshness {
    Fresh,
    Stale,
    Expired,
}

impl Freshness {
    pub fn of(age: Duration, config: &TierConfig) -> Self {
        if age < config.fresh {
            Self::Fresh
        } else if age < config.stale {
            Self::Stale
        } else {
            Self::Expired
        }
    }
}

/// A cached value and when it was written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry<V> {
    pub value: V,
    pub stored_at: Instant,
    pub etag: Option<String>,
}

/// Result of a [`TieredCache::lookup`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<V> {
    Fresh(V),
    Stale(V),
    Expired(V),
    Miss,
}

impl<V> Lookup<V> {
    pub const fn freshness(&self) -> Option<Freshness> {
        match self {
            Self::Fresh(_) => Some(Freshness::Fresh),
            Self::Stale(_) => Some(Freshness::Stale),
            Self::Expired(_) => Some(Freshness::Expired),
            Self::Miss => None,
        }
    }

    pub fn into_value(self) -> Option<V> {
        match self {
            Self::Fresh(value) | Self::Stale(value) | Self::Expired(value) => Some(value),
            Self::Miss => None,
        }
    }
}

/// Key/value store with fresh, stale and expired tiers
///
/// # Example
///
/// ```
/// use std::time::Duration;
///
/// use tripline_common::cache::{Lookup, TierConfig, TieredCache};
/// use tripline_common::resilience::MockClock;
///
/// let clock = MockClock::new();
/// let cache = TieredCache::with_clock(TierConfig::default(), clock.clone());
/// cache.insert("destinations".to_string(), 1);
///
/// clock.advance(Duration::from_secs(20 * 60));
/// assert_eq!(cache.lookup(&"destinations".to_string()), Lookup::Stale(1));
/// ```
pub struct TieredCache<K, V, C = SystemClock>
where
    K: Eq + Hash + Clone,
    V: Clone,
    C: Clock,
{
    entries: RwLock<HashMap<K, CacheEntry<V>>>,
    config: TierConfig,
    metrics: MetricsCollector,
    clock: C,
}

impl<K, V> TieredCache<K, V, SystemClock>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(config: TierConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<K, V, C> TieredCache<K, V, C>
where
    K: Eq + Hash + Clone,
    V: Clone,
    C: Clock,
{
    pub fn with_clock(config: TierConfig, clock: C) -> Self {
        Self { entries: RwLock::new(HashMap::new()), config, metrics: MetricsCollector::default(), clock }
    }

    pub const fn config(&self) -> &TierConfig {
        &self.config
    }

    /// Classify the entry for `key` by age. Never removes anything.
    pub fn lookup(&self, key: &K) -> Lookup<V> {
        let now = self.clock.now();
        let entries = self.entries.read();
        let Some(entry) = entries.get(key) else {
            self.metrics.record_miss();
            return Lookup::Miss;
        };

        let value = entry.value.clone();
        match Freshness::of(now.saturating_duration_since(entry.stored_at), &self.config) {
            Freshness::Fresh => {
                self.metrics.record_fresh_hit();
                Lookup::Fresh(value)
            }
            Freshness::Stale => {
                self.metrics.record_stale_hit();
                Lookup::Stale(value)
            }
            Freshness::Expired => {
                self.metrics.record_expired_hit();
                Lookup::Expired(value)
            }
        }
    }

    /// The raw entry for `key`, regardless of age. Does not touch metrics.
    pub fn peek(&self, key: &K) -> Option<CacheEntry<V>> {
        self.entries.read().get(key).cloned()
    }

    pub fn insert(&self, key: K, value: V) {
        self.insert_with_etag(key, value, None);
    }

    /// Store `value`, then sweep and trim the store.
    ///
    /// The entry timestamp never moves backwards for a given key.
    pub fn insert_with_etag(&self, key: K, value: V, etag: Option<String>) {
        let now = self.clock.now();
        let mut entries = self.entries.write();

        let stored_at = entries.get(&key).map_or(now, |previous| previous.stored_at.max(now));
        entries.insert(key.clone(), CacheEntry { value, stored_at, etag });
        self.metrics.record_insert();

        let expired = self.sweep(&mut entries, &key, now);
        let evicted = self.trim(&mut entries, &key);
        if expired > 0 || evicted > 0 {
            debug!(expired, evicted, size = entries.len(), "cache housekeeping after insert");
        }
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        self.entries.write().remove(key).map(|entry| entry.value)
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.read().contains_key(key)
    }

    /// Keys ordered oldest entry first.
    pub fn keys(&self) -> Vec<K> {
        let entries = self.entries.read();
        let mut keyed: Vec<(&K, Instant)> = entries.iter().map(|(k, e)| (k, e.stored_at)).collect();
        keyed.sort_by_key(|(_, stored_at)| *stored_at);
        keyed.into_iter().map(|(k, _)| k.clone()).collect()
    }

    /// Sum `weigh` over every cached value.
    pub fn weigh<F>(&self, weigh: F) -> usize
    where
        F: Fn(&V) -> usize,
    {
        self.entries.read().values().map(|entry| weigh(&entry.value)).sum()
    }

    /// Delete every entry older than the stale limit. Returns the count.
    pub fn cleanup_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| now.saturating_duration_since(entry.stored_at) < self.config.stale);
        let removed = before - entries.len();
        self.metrics.record_expirations(removed);
        removed
    }

    pub fn stats(&self) -> TierStats {
        self.metrics.snapshot(self.len(), self.config.max_entries)
    }

    fn sweep(&self, entries: &mut HashMap<K, CacheEntry<V>>, keep: &K, now: Instant) -> usize {
        let before = entries.len();
        entries.retain(|key, entry| {
            key == keep || now.saturating_duration_since(entry.stored_at) < self.config.stale
        });
        let removed = before - entries.len();
        self.metrics.record_expirations(removed);
        removed
    }

    fn trim(&self, entries: &mut HashMap<K, CacheEntry<V>>, keep: &K) -> usize {
        let Some(excess) = entries.len().checked_sub(self.config.max_entries).filter(|n| *n > 0) else {
            return 0;
        };

        let mut candidates: Vec<(K, Instant)> = entries
            .iter()
            .filter(|(key, _)| *key != keep)
            .map(|(key, entry)| (key.clone(), entry.stored_at))
            .collect();
        candidates.sort_by_key(|(_, stored_at)| *stored_at);

        let batch = self.config.eviction_batch(excess).min(candidates.len());
        for (key, _) in candidates.into_iter().take(batch) {
            entries.remove(&key);
        }
        self.metrics.record_evictions(batch);
        batch
    }
}

impl<K, V, C> std::fmt::Debug for TieredCache<K, V, C>
where
    K: Eq + Hash + Clone,
    V: Clone,
    C: Clock,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TieredCache").field("config", &self.config).field("size", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::MockClock;

    fn cache(max_entries: usize, evict_fraction: f64) -> (TieredCache<String, u32, MockClock>, MockClock) {
        let clock = MockClock::new();
        let config = TierConfig::builder()
            .fresh(Duration::from_secs(10 * 60))
            .stale(Duration::from_secs(30 * 60))
            .max_entries(max_entries)
            .evict_fraction(evict_fraction)
            .build()
            .unwrap();
        (TieredCache::with_clock(config, clock.clone()), clock)
    }

    /// Validates the tier boundaries scenario.
    ///
    /// Assertions:
    /// - Age 5m is fresh, 20m is stale, 40m is expired.
    /// - Boundaries are half-open: exactly `fresh` is already stale.
    #[test]
    fn test_lookup_classifies_by_age() {
        let (cache, clock) = cache(100, 0.2);
        let key = "k".to_string();
        cache.insert(key.clone(), 1);

        clock.advance_mins(5);
        assert_eq!(cache.lookup(&key), Lookup::Fresh(1));

        clock.advance_mins(5);
        assert_eq!(cache.lookup(&key), Lookup::Stale(1));

        clock.advance_mins(10);
        assert_eq!(cache.lookup(&key), Lookup::Stale(1));

        clock.advance_mins(20);
        assert_eq!(cache.lookup(&key), Lookup::Expired(1));
        assert_eq!(cache.lookup(&"other".to_string()), Lookup::Miss);

        let stats = cache.stats();
        assert_eq!((stats.fresh_hits, stats.stale_hits, stats.expired_hits, stats.misses), (1, 2, 1, 1));
    }

    #[test]
    fn test_lookup_does_not_remove_expired_entries() {
        let (cache, clock) = cache(100, 0.2);
        cache.insert("k".to_string(), 9);
        clock.advance_mins(45);

        assert_eq!(cache.lookup(&"k".to_string()).into_value(), Some(9));
        assert!(cache.peek(&"k".to_string()).is_some());
    }

    #[test]
    fn test_overwrite_refreshes_timestamp() {
        let (cache, clock) = cache(100, 0.2);
        let key = "k".to_string();
        cache.insert(key.clone(), 1);
        let first = cache.peek(&key).unwrap().stored_at;

        clock.advance_mins(15);
        cache.insert_with_etag(key.clone(), 2, Some("\"v2\"".into()));

        let entry = cache.peek(&key).unwrap();
        assert!(entry.stored_at > first);
        assert_eq!(entry.etag.as_deref(), Some("\"v2\""));
        assert_eq!(cache.lookup(&key), Lookup::Fresh(2));
    }

    #[test]
    fn test_insert_sweeps_entries_past_stale() {
        let (cache, clock) = cache(100, 0.2);
        cache.insert("old".to_string(), 1);
        clock.advance_mins(20);
        cache.insert("middle".to_string(), 2);
        clock.advance_mins(15);

        cache.insert("new".to_string(), 3);

        assert!(!cache.contains_key(&"old".to_string()));
        assert!(cache.contains_key(&"middle".to_string()));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.stats().expirations, 1);
    }

    /// Validates the size cap scenario.
    ///
    /// Assertions:
    /// - The store never ends an insert above its cap.
    /// - The most recently written entries survive.
    #[test]
    fn test_eviction_keeps_newest_entries_under_cap() {
        let (cache, clock) = cache(50, 0.1);
        for n in 0..120u32 {
            clock.advance_millis(10);
            cache.insert(format!("key-{n}"), n);
            assert!(cache.len() <= 50, "len {} after insert {n}", cache.len());
        }

        assert!(cache.contains_key(&"key-119".to_string()));
        assert!(cache.contains_key(&"key-118".to_string()));
        assert!(!cache.contains_key(&"key-0".to_string()));

        let keys = cache.keys();
        let newest: Vec<u32> = keys.iter().map(|k| k.trim_start_matches("key-").parse().unwrap()).collect();
        let min_kept = *newest.iter().min().unwrap();
        assert!(newest.iter().all(|n| *n >= min_kept));
        assert_eq!(newest.len(), (120 - min_kept) as usize);
    }

    #[test]
    fn test_eviction_batch_uses_fraction() {
        let (cache, clock) = cache(10, 0.2);
        for n in 0..11u32 {
            clock.advance_millis(1);
            cache.insert(format!("k{n}"), n);
        }
        // One over the cap evicts ceil(10 * 0.2) = 2.
        assert_eq!(cache.len(), 9);
        assert_eq!(cache.stats().evictions, 2);
        assert!(!cache.contains_key(&"k0".to_string()));
        assert!(!cache.contains_key(&"k1".to_string()));
    }

    #[test]
    fn test_just_written_entry_survives_full_eviction() {
        let (cache, _clock) = cache(1, 1.0);
        cache.insert("a".to_string(), 1);
        cache.insert("b".to_string(), 2);

        assert_eq!(cache.keys(), vec!["b".to_string()]);
    }

    #[test]
    fn test_clear_weigh_and_cleanup() {
        let (cache, clock) = cache(100, 0.2);
        cache.insert("a".to_string(), 3);
        cache.insert("b".to_string(), 4);
        assert_eq!(cache.weigh(|v| *v as usize), 7);

        clock.advance_mins(31);
        assert_eq!(cache.cleanup_expired(), 2);
        assert!(cache.is_empty());

        cache.insert("c".to_string(), 5);
        cache.clear();
        assert_eq!(cache.remove(&"c".to_string()), None);
        assert!(cache.is_empty());
    }
}
