//! In-memory doubles for the fetch ports
//!
//! Available to this crate's tests and, with the `test-utils` feature, to
//! downstream crates.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::time::Instant;
use tripline_domain::{FetchError, RequestMetric};
use url::Url;

use crate::fetch::{Endpoints, HttpMethod, RequestObserver, Transport, TransportResponse};

type Handler = dyn Fn(&Url, Option<&Value>) -> Result<TransportResponse, FetchError> + Send + Sync;

/// One request seen by [`FakeTransport`]
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: HttpMethod,
    pub url: Url,
    pub body: Option<Value>,
    /// Tokio time, so gaps are exact under a paused clock.
    pub at: Instant,
}

/// Transport answering from a closure and logging every call
pub struct FakeTransport {
    handler: Box<Handler>,
    latency: Duration,
    calls: Mutex<Vec<RecordedCall>>,
}

impl FakeTransport {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&Url, Option<&Value>) -> Result<TransportResponse, FetchError> + Send + Sync + 'static,
    {
        Self { handler: Box::new(handler), latency: Duration::ZERO, calls: Mutex::new(Vec::new()) }
    }

    /// Always answers 200 with `body`.
    pub fn json(body: Value) -> Self {
        Self::new(move |_, _| Ok(TransportResponse::ok(body.clone())))
    }

    /// Always answers with `status` and no body.
    pub fn status(status: u16) -> Self {
        Self::new(move |_, _| Ok(TransportResponse::new(status, None)))
    }

    /// Sleep this long before answering.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn calls_to_host(&self, host: &str) -> usize {
        self.calls.lock().iter().filter(|call| call.url.host_str() == Some(host)).count()
    }

    async fn respond(&self, method: HttpMethod, url: &Url, body: Option<&Value>) -> Result<TransportResponse, FetchError> {
        self.calls.lock().push(RecordedCall { method, url: url.clone(), body: body.cloned(), at: Instant::now() });
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        (self.handler)(url, body)
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn get(&self, url: &Url) -> Result<TransportResponse, FetchError> {
        self.respond(HttpMethod::Get, url, None).await
    }

    async fn post(&self, url: &Url, body: &Value) -> Result<TransportResponse, FetchError> {
        self.respond(HttpMethod::Post, url, Some(body)).await
    }
}

/// Observer that keeps every metric
#[derive(Debug, Default)]
pub struct RecordingObserver {
    metrics: Mutex<Vec<RequestMetric>>,
}

impl RecordingObserver {
    pub fn metrics(&self) -> Vec<RequestMetric> {
        self.metrics.lock().clone()
    }
}

impl RequestObserver for RecordingObserver {
    fn record(&self, metric: RequestMetric) {
        self.metrics.lock().push(metric);
    }
}

/// Endpoints from literal URLs.
///
/// # Panics
///
/// Panics if any URL is invalid.
pub fn endpoints(primary: &str, fallbacks: &[&str]) -> Endpoints {
    let parse = |raw: &str| Url::parse(raw).unwrap_or_else(|err| panic!("invalid test URL {raw}: {err}"));
    Endpoints::new(parse(primary), fallbacks.iter().map(|raw| parse(raw)).collect())
}
