//! Shared fetch plumbing
//!
//! One [`FetchRuntime`] per process: the transport, the request queue, the
//! rate limiter, the connection monitor and the tracker for background
//! revalidations. Each resource family gets its own
//! [`FetchOrchestrator`](super::FetchOrchestrator) and cache on top of it.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::Value;
use tokio::time::Instant;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, instrument, warn};
use tripline_common::resilience::{
    Clock, QueueConfig, QueueStats, RateLimiterConfig, RequestQueue, RetryConfig, RetryDecision,
    RetryExecutor, RetryPolicy, SlidingWindowLimiter, SystemClock,
};
use tripline_domain::constants::DEFAULT_TIMEOUT_MS;
use tripline_domain::{FetchConfig, FetchError, RequestMetric, RequestStatus, TriplineError};
use url::Url;

use super::envelope;
use super::ports::{HttpMethod, NoopObserver, RequestObserver, Transport, TransportResponse};
use super::query::{rate_limit_key, Endpoints};
use super::settings::{fallback_retry_config, queue_config, rate_limiter_config};
use crate::connectivity::ConnectionMonitor;

/// Retries whatever [`FetchError::is_retryable`] allows
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchRetryPolicy;

impl RetryPolicy<FetchError> for FetchRetryPolicy {
    fn should_retry(&self, error: &FetchError, _attempt: u32) -> RetryDecision {
        if error.is_retryable() {
            RetryDecision::Retry
        } else {
            RetryDecision::Stop
        }
    }
}

/// Shared transport, queue, limiter and background task set
pub struct FetchRuntime {
    transport: Arc<dyn Transport>,
    observer: Arc<dyn RequestObserver>,
    endpoints: Endpoints,
    limiter: SlidingWindowLimiter<Arc<dyn Clock>>,
    queue: RequestQueue,
    monitor: Arc<ConnectionMonitor>,
    clock: Arc<dyn Clock>,
    timeout: Duration,
    fallback_retry: RetryConfig,
    background: TaskTracker,
}

impl FetchRuntime {
    pub fn builder(transport: Arc<dyn Transport>, endpoints: Endpoints) -> FetchRuntimeBuilder {
        FetchRuntimeBuilder::new(transport, endpoints)
    }

    pub const fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub const fn monitor(&self) -> &Arc<ConnectionMonitor> {
        &self.monitor
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    pub const fn queue(&self) -> &RequestQueue {
        &self.queue
    }

    pub const fn limiter(&self) -> &SlidingWindowLimiter<Arc<dyn Clock>> {
        &self.limiter
    }

    pub fn queue_stats(&self) -> QueueStats {
        self.queue.stats()
    }

    /// Background revalidations currently running.
    pub fn background_tasks(&self) -> usize {
        self.background.len()
    }

    /// GET the first candidate that answers, with per-candidate retries.
    ///
    /// The primary gets `primary_retry`; each fallback gets the fallback
    /// budget. A rate-limit denial ends the whole call immediately. When
    /// every candidate fails the last error is returned.
    #[instrument(skip_all, fields(candidates = candidates.len()))]
    pub async fn perform_fetch(&self, candidates: &[Url], primary_retry: &RetryConfig) -> Result<Value, FetchError> {
        let mut last_error = None;

        for (index, url) in candidates.iter().enumerate() {
            let key = rate_limit_key(url);
            if !self.limiter.is_allowed(&key) {
                let retry_after = self.limiter.retry_after(&key);
                warn!(key = %key, retry_after_ms = retry_after.as_millis(), "request denied by rate limiter");
                return Err(FetchError::RateLimited { key, retry_after });
            }

            let retry = if index == 0 { primary_retry.clone() } else { self.fallback_retry.clone() };
            let executor = RetryExecutor::new(retry, FetchRetryPolicy);
            match executor.execute(|attempt| self.attempt(HttpMethod::Get, url, None, attempt)).await {
                Ok(body) => {
                    if index > 0 {
                        info!(url = %url, "served by fallback endpoint");
                    }
                    return Ok(body);
                }
                Err(err) => {
                    let attempts = err.attempts();
                    let err = err.into_inner();
                    warn!(url = %url, attempts, error = %err, "candidate endpoint failed");
                    last_error = Some(err);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| FetchError::Network("no candidate endpoints configured".to_string())))
    }

    /// POST `body` to `url` with the write retry budget. Writes are not
    /// rate limited and never fall back.
    #[instrument(skip_all, fields(url = %url))]
    pub async fn perform_write(&self, url: &Url, body: &Value, retry: &RetryConfig) -> Result<Value, FetchError> {
        let executor = RetryExecutor::new(retry.clone(), FetchRetryPolicy);
        executor
            .execute(|attempt| self.attempt(HttpMethod::Post, url, Some(body), attempt))
            .await
            .map_err(|err| {
                warn!(attempts = err.attempts(), error = %err, "write failed");
                err.into_inner()
            })
    }

    /// One request under the timeout. Always records a metric.
    pub(crate) async fn attempt(
        &self,
        method: HttpMethod,
        url: &Url,
        body: Option<&Value>,
        attempt: u32,
    ) -> Result<Value, FetchError> {
        let started = Instant::now();
        let call = async {
            match body {
                Some(body) => self.transport.post(url, body).await,
                None => self.transport.get(url).await,
            }
        };
        let outcome =
            tokio::time::timeout(self.timeout, call).await.unwrap_or_else(|_| Err(FetchError::Timeout(self.timeout)));
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let status = match &outcome {
            Ok(response) => RequestStatus::Http(response.status),
            Err(FetchError::Timeout(_)) => RequestStatus::Timeout,
            Err(err) => err.status().map_or(RequestStatus::NetworkError, RequestStatus::Http),
        };
        self.observer.record(RequestMetric {
            url: url.to_string(),
            method: method.as_str().to_string(),
            duration_ms,
            status,
            timestamp: Utc::now(),
            retry_count: Some(attempt),
        });

        let result = outcome.and_then(TransportResponse::into_json).and_then(|body| match method {
            HttpMethod::Get => envelope::ensure_read_succeeded(body),
            HttpMethod::Post => Ok(body),
        });
        if let Err(err) = &result {
            debug!(url = %url, attempt, duration_ms, error = %err, kind = %err.kind(), "attempt failed");
        }
        result
    }

    pub(crate) fn spawn_background<F>(&self, task: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        self.background.spawn(task);
    }

    /// Wait for every background revalidation spawned so far.
    pub async fn drain_background(&self) {
        self.background.close();
        self.background.wait().await;
        self.background.reopen();
    }
}

impl std::fmt::Debug for FetchRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchRuntime")
            .field("endpoints", &self.endpoints)
            .field("timeout", &self.timeout)
            .field("queue", &self.queue)
            .field("limiter", &self.limiter)
            .field("online", &self.monitor.is_online())
            .finish_non_exhaustive()
    }
}

/// Builder for [`FetchRuntime`]
pub struct FetchRuntimeBuilder {
    transport: Arc<dyn Transport>,
    endpoints: Endpoints,
    observer: Arc<dyn RequestObserver>,
    monitor: Option<Arc<ConnectionMonitor>>,
    clock: Arc<dyn Clock>,
    rate_limit: RateLimiterConfig,
    queue: QueueConfig,
    timeout: Duration,
    fallback_retry: RetryConfig,
}

impl FetchRuntimeBuilder {
    pub fn new(transport: Arc<dyn Transport>, endpoints: Endpoints) -> Self {
        Self {
            transport,
            endpoints,
            observer: Arc::new(NoopObserver),
            monitor: None,
            clock: Arc::new(SystemClock),
            rate_limit: RateLimiterConfig::default(),
            queue: QueueConfig::default(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            fallback_retry: RetryConfig::no_retry(),
        }
    }

    /// Apply timeout, concurrency, rate-limit and fallback settings.
    pub fn fetch_config(self, config: &FetchConfig) -> Self {
        self.timeout(config.timeout())
            .queue(queue_config(config))
            .rate_limit(rate_limiter_config(&config.rate_limit))
            .fallback_retry(fallback_retry_config(config))
    }

    pub fn observer(mut self, observer: Arc<dyn RequestObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn monitor(mut self, monitor: Arc<ConnectionMonitor>) -> Self {
        self.monitor = Some(monitor);
        self
    }

    /// Clock for cache ages and rate-limit windows.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.rate_limit = config;
        self
    }

    pub fn queue(mut self, config: QueueConfig) -> Self {
        self.queue = config;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn fallback_retry(mut self, config: RetryConfig) -> Self {
        self.fallback_retry = config;
        self
    }

    /// # Errors
    ///
    /// Returns `TriplineError::Config` if any component rejects its settings.
    pub fn build(self) -> tripline_domain::Result<FetchRuntime> {
        if self.timeout.is_zero() {
            return Err(TriplineError::Config("fetch timeout must be greater than zero".into()));
        }
        self.rate_limit.validate().map_err(|msg| TriplineError::Config(format!("rate limit: {msg}")))?;
        self.fallback_retry.validate().map_err(|msg| TriplineError::Config(format!("fallback retry: {msg}")))?;
        let queue = RequestQueue::new(self.queue).map_err(|msg| TriplineError::Config(format!("queue: {msg}")))?;

        Ok(FetchRuntime {
            transport: self.transport,
            observer: self.observer,
            endpoints: self.endpoints,
            limiter: SlidingWindowLimiter::with_clock(self.rate_limit, Arc::clone(&self.clock)),
            queue,
            monitor: self.monitor.unwrap_or_default(),
            clock: self.clock,
            timeout: self.timeout,
            fallback_retry: self.fallback_retry,
            background: TaskTracker::new(),
        })
    }
}
