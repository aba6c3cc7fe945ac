//! Resilience primitives for the fetch layer
//!
//! - **Clock**: injectable time source so window and tier logic is testable
//! - **Rate limiter**: per-key sliding-window admission control
//! - **Retry**: exponential backoff with additive jitter and pluggable
//!   retry policies
//! - **Request queue**: bounded-concurrency FIFO executor with a dispatch
//!   delay between slot reuse
//!
//! These are generic over the error and payload types. The fetch
//! orchestrator in `tripline-core` wires them together for HTTP.

pub mod clock;
pub mod queue;
pub mod rate_limiter;
pub mod retry;

pub use clock::{Clock, MockClock, SystemClock};
pub use queue::{QueueConfig, QueueStats, RequestQueue};
pub use rate_limiter::{RateLimiterConfig, RateLimiterConfigBuilder, SlidingWindowLimiter};
pub use retry::{
    policies, BackoffStrategy, Jitter, RetryConfig, RetryConfigBuilder, RetryDecision, RetryError,
    RetryExecutor, RetryOutcome, RetryPolicy, RetryResult,
};
