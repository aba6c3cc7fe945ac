//! Port interfaces for the fetch layer
//!
//! The orchestrator only sees these traits; `tripline-infra` supplies the
//! reqwest transport and the performance monitor behind them.

use async_trait::async_trait;
use serde_json::Value;
use tripline_domain::{FetchError, RequestMetric, RequestStatus};
use url::Url;

/// HTTP verbs the fetch layer issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

/// A response that arrived, whatever its status
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    /// Parsed JSON body; `None` when the body was empty or not JSON.
    pub body: Option<Value>,
}

impl TransportResponse {
    pub const fn new(status: u16, body: Option<Value>) -> Self {
        Self { status, body }
    }

    /// 200 with a JSON body.
    pub const fn ok(body: Value) -> Self {
        Self::new(200, Some(body))
    }

    /// Same rule the performance monitor applies: 2xx and 3xx.
    ///
    /// reqwest follows redirects, so a 3xx only arrives when it was not
    /// followed (304, or the redirect limit). Without a JSON body it
    /// still fails as a payload error.
    pub const fn is_success(&self) -> bool {
        RequestStatus::Http(self.status).is_success()
    }

    /// The JSON body of a 2xx/3xx response, or the error the status maps to.
    pub fn into_json(self) -> Result<Value, FetchError> {
        if self.is_success() {
            return self.body.ok_or_else(|| FetchError::payload("Response body is not valid JSON"));
        }
        let detail = self.body.as_ref().and_then(|body| body.get("message")).and_then(Value::as_str);
        Err(FetchError::from_status(self.status, detail))
    }
}

/// Issues single HTTP requests
///
/// Implementations return `Ok` for every response that arrived, including
/// error statuses, and `Err` only when no response did. They must not retry
/// or apply their own deadline shorter than the orchestrator's.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &Url) -> Result<TransportResponse, FetchError>;

    async fn post(&self, url: &Url, body: &Value) -> Result<TransportResponse, FetchError>;
}

/// Receives one metric per network attempt
pub trait RequestObserver: Send + Sync {
    fn record(&self, metric: RequestMetric);
}

/// Observer that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl RequestObserver for NoopObserver {
    fn record(&self, _metric: RequestMetric) {}
}
