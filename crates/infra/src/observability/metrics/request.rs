//! Request outcome metrics for the fetch layer
//!
//! Every network attempt (retries and fallbacks included) lands here as a
//! [`RequestMetric`]. The monitor keeps only the newest
//! [`METRICS_BUFFER_CAPACITY`] of them and derives [`PerformanceStats`]
//! from the buffer on every call, so the numbers always describe the
//! recent window rather than the process lifetime.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use reqwest::{Client, Request, Response};
use tokio::time::Instant;
use tripline_common::collections::RingBuffer;
use tripline_core::RequestObserver;
use tripline_domain::constants::{METRICS_BUFFER_CAPACITY, SLOW_REQUEST_THRESHOLD_MS};
use tripline_domain::{PerformanceStats, RequestMetric, RequestStatus};

use crate::observability::{MetricsError, MetricsResult};

/// Bounded history of request outcomes
#[derive(Debug)]
pub struct PerformanceMonitor {
    metrics: Mutex<RingBuffer<RequestMetric>>,
    slow_threshold: Duration,
}

impl Default for PerformanceMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl PerformanceMonitor {
    pub fn new() -> Self {
        Self::with_capacity(METRICS_BUFFER_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            metrics: Mutex::new(RingBuffer::new(capacity)),
            slow_threshold: Duration::from_millis(SLOW_REQUEST_THRESHOLD_MS),
        }
    }

    /// Append a metric, dropping the oldest when the buffer is full.
    pub fn record_request(&self, metric: RequestMetric) {
        self.lock("record_request").push(metric);
    }

    /// Summary of the buffered metrics.
    pub fn get_stats(&self) -> PerformanceStats {
        let metrics = self.lock("get_stats");
        let total = metrics.len();
        if total == 0 {
            return PerformanceStats::default();
        }

        let slow_ms = u64::try_from(self.slow_threshold.as_millis()).unwrap_or(u64::MAX);
        let mut duration_sum: u64 = 0;
        let mut succeeded = 0usize;
        let mut slow = 0usize;
        let mut timeouts = 0usize;

        for metric in metrics.iter() {
            duration_sum = duration_sum.saturating_add(metric.duration_ms);
            if metric.status.is_success() {
                succeeded += 1;
            }
            if metric.duration_ms > slow_ms {
                slow += 1;
            }
            if metric.status.is_timeout() {
                timeouts += 1;
            }
        }

        #[allow(clippy::cast_precision_loss)]
        let (average, rate) =
            (duration_sum as f64 / total as f64, succeeded as f64 / total as f64 * 100.0);

        PerformanceStats {
            total_requests: total,
            average_duration_ms: average,
            success_rate: rate,
            slow_requests: slow,
            failed_requests: total - succeeded,
            timeout_requests: timeouts,
        }
    }

    /// Up to `n` metrics, newest first.
    pub fn recent(&self, n: usize) -> Vec<RequestMetric> {
        self.lock("recent").newest(n).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock("len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.lock("clear").clear();
    }

    /// Get P50 (median) attempt duration in milliseconds
    pub fn p50_duration_ms(&self) -> MetricsResult<u64> {
        self.duration_percentile(0.50, "P50")
    }

    /// Get P95 attempt duration in milliseconds
    pub fn p95_duration_ms(&self) -> MetricsResult<u64> {
        self.duration_percentile(0.95, "P95")
    }

    /// Nearest-rank percentile over the buffered durations.
    fn duration_percentile(&self, percentile: f64, metric: &'static str) -> MetricsResult<u64> {
        if !(0.0..=1.0).contains(&percentile) {
            return Err(MetricsError::InvalidPercentile(percentile));
        }
        let mut durations: Vec<u64> = self.lock(metric).iter().map(|m| m.duration_ms).collect();
        if durations.is_empty() {
            return Err(MetricsError::EmptyData { metric });
        }
        durations.sort_unstable();

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
        let index = ((durations.len() as f64 * percentile) as usize).min(durations.len() - 1);
        Ok(durations[index])
    }

    /// Execute `request` on `client` and record the attempt.
    ///
    /// The response or error is handed back untouched; only the timing and
    /// outcome are observed.
    pub async fn monitored_fetch(&self, client: &Client, request: Request) -> reqwest::Result<Response> {
        let url = request.url().to_string();
        let method = request.method().to_string();
        let started = Instant::now();

        let result = client.execute(request).await;

        let status = match &result {
            Ok(response) => RequestStatus::Http(response.status().as_u16()),
            Err(err) if err.is_timeout() => RequestStatus::Timeout,
            Err(_) => RequestStatus::NetworkError,
        };
        self.record_request(RequestMetric {
            url,
            method,
            duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            status,
            timestamp: Utc::now(),
            retry_count: None,
        });
        result
    }

    fn lock(&self, operation: &'static str) -> MutexGuard<'_, RingBuffer<RequestMetric>> {
        match self.metrics.lock() {
            Ok(guard) => guard,
            Err(poison_err) => {
                tracing::warn!(
                    metric = "PerformanceMonitor::metrics",
                    operation,
                    "Mutex poisoned, recovering"
                );
                poison_err.into_inner()
            }
        }
    }
}

impl RequestObserver for PerformanceMonitor {
    fn record(&self, metric: RequestMetric) {
        self.record_request(metric);
    }
}
