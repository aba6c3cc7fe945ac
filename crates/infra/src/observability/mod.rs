//! Observability infrastructure: request metrics and logging
//!
//! - [`PerformanceMonitor`] keeps the outcome of the last hundred network
//!   attempts and summarises them on demand.
//! - [`init_logging`] installs the `tracing` subscriber for binaries.
//!
//! ## Locking
//!
//! The metric buffer sits behind a std mutex with explicit poison recovery:
//! a panic while recording must not take monitoring down with it.
//!
//! ```rust,ignore
//! let guard = match mutex.lock() {
//!     Ok(guard) => guard,
//!     Err(poison_err) => {
//!         tracing::warn!("Mutex poisoned, recovering");
//!         poison_err.into_inner()
//!     }
//! };
//! ```

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
pub use metrics::PerformanceMonitor;

/// Metrics error type
///
/// Recording never fails; only aggregate queries over an empty buffer or
/// with nonsensical arguments do.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MetricsError {
    /// Empty data set - cannot calculate aggregate metric
    #[error("Empty data: cannot calculate {metric}")]
    EmptyData {
        /// Metric name that failed (e.g., "P95", "P50")
        metric: &'static str,
    },

    /// Percentile outside `0.0..=1.0`
    #[error("Invalid percentile {0}: expected a fraction between 0 and 1")]
    InvalidPercentile(f64),
}

/// Result type for metrics operations
pub type MetricsResult<T> = Result<T, MetricsError>;
