//! Modular common utilities shared across Tripline crates.
//!
//! Nothing in here knows about destinations, events or HTTP. The fetch
//! orchestrator in `tripline-core` composes these primitives.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: collections
//! - `runtime`: async infrastructure (tiered cache, resilience, request queue)
//! - `observability`: tracing (pulled in by `runtime`)

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation tier
// -----------------------------------------------------------------
#[cfg(feature = "foundation")]
pub mod collections;

// Runtime tier
// --------------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod cache;
#[cfg(feature = "runtime")]
pub mod resilience;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "runtime")]
pub use cache::{CacheEntry, Freshness, Lookup, TierConfig, TierConfigBuilder, TierStats, TieredCache};
#[cfg(feature = "foundation")]
pub use collections::RingBuffer;
#[cfg(feature = "runtime")]
pub use resilience::{
    BackoffStrategy, Clock, Jitter, MockClock, QueueConfig, QueueStats, RateLimiterConfig, RequestQueue,
    RetryConfig, RetryConfigBuilder, RetryDecision, RetryError, RetryExecutor, RetryOutcome,
    RetryPolicy, SlidingWindowLimiter, SystemClock,
};
