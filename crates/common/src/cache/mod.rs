//! Tiered TTL cache for stale-while-revalidate reads
//!
//! Entries carry only their write time. Freshness is computed on every read
//! against two configured durations, giving three tiers:
//!
//! - **Fresh**: serve from cache, no network
//! - **Stale**: serve from cache, refresh in the background
//! - **Expired**: fetch before answering (but keep as a last resort)
//!
//! # Features
//!
//! - **Thread-safe**: `parking_lot::RwLock` around the map, never held across
//!   an `.await`
//! - **Bounded**: writes sweep entries past the stale limit and evict the
//!   oldest batch once the size cap is exceeded
//! - **Testable**: clock abstraction for deterministic tier tests
//!
//! # Example
//!
//! ```
//! use tripline_common::cache::{Lookup, TierConfig, TieredCache};
//!
//! let cache: TieredCache<String, String> = TieredCache::new(TierConfig::default());
//! cache.insert("https://api.example.com/?endpoint=events".into(), "[]".into());
//!
//! match cache.lookup(&"https://api.example.com/?endpoint=events".to_string()) {
//!     Lookup::Fresh(body) => assert_eq!(body, "[]"),
//!     other => panic!("unexpected {other:?}"),
//! }
//! ```

pub mod config;
pub mod core;
pub mod stats;

pub use config::{TierConfig, TierConfigBuilder};
pub use self::core::{CacheEntry, Freshness, Lookup, TieredCache};
pub use stats::TierStats;
