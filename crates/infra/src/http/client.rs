use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client as ReqwestClient, Method, RequestBuilder};
use serde_json::Value;
use tracing::debug;
use tripline_core::{Transport, TransportResponse};
use tripline_domain::constants::{DEFAULT_TIMEOUT_MS, DEFAULT_USER_AGENT};
use tripline_domain::{ApiConfig, FetchConfig, FetchError, TriplineError};
use url::Url;

use crate::errors::{fetch_error, InfraError};

/// Single-attempt HTTP client behind the [`Transport`] port.
///
/// Retries, fallbacks and rate limiting belong to the fetch orchestrator;
/// this type sends exactly one request per call and reports whatever came
/// back.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    timeout: Duration,
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> Result<Self, TriplineError> {
        Self::builder().build()
    }

    /// Client using the configured user agent and attempt timeout.
    pub fn from_config(api: &ApiConfig, fetch: &FetchConfig) -> Result<Self, TriplineError> {
        Self::builder().timeout(fetch.timeout()).user_agent(api.user_agent.clone()).build()
    }

    /// The underlying reqwest client, for callers that need raw requests.
    pub const fn inner(&self) -> &ReqwestClient {
        &self.client
    }

    /// Create a request builder using the underlying reqwest client.
    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Execute one request and read its body.
    ///
    /// Any status is `Ok`. The body is parsed as JSON; an empty or non-JSON
    /// body yields `body: None`.
    pub async fn send(&self, builder: RequestBuilder) -> Result<TransportResponse, FetchError> {
        let request = builder.build().map_err(|err| fetch_error(&err, Some(self.timeout)))?;
        let method = request.method().clone();
        let url = request.url().clone();
        debug!(%method, %url, "sending HTTP request");

        let response = self.client.execute(request).await.map_err(|err| {
            debug!(%method, %url, error = %err, "HTTP request failed");
            fetch_error(&err, Some(self.timeout))
        })?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(|err| fetch_error(&err, Some(self.timeout)))?;
        debug!(%method, %url, %status, bytes = bytes.len(), "received HTTP response");

        let body = if bytes.is_empty() { None } else { serde_json::from_slice::<Value>(&bytes).ok() };
        Ok(TransportResponse::new(status.as_u16(), body))
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn get(&self, url: &Url) -> Result<TransportResponse, FetchError> {
        self.send(self.client.get(url.clone())).await
    }

    async fn post(&self, url: &Url, body: &Value) -> Result<TransportResponse, FetchError> {
        self.send(self.client.post(url.clone()).json(body)).await
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient").field("timeout", &self.timeout).finish_non_exhaustive()
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    user_agent: String,
    default_headers: Option<reqwest::header::HeaderMap>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            default_headers: None,
        }
    }
}

impl HttpClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    pub fn default_headers(mut self, headers: reqwest::header::HeaderMap) -> Self {
        self.default_headers = Some(headers);
        self
    }

    pub fn build(self) -> Result<HttpClient, TriplineError> {
        let mut builder =
            ReqwestClient::builder().timeout(self.timeout).user_agent(self.user_agent).no_proxy();

        if let Some(headers) = self.default_headers {
            builder = builder.default_headers(headers);
        }

        let client = builder.build().map_err(|err| TriplineError::from(InfraError::from(err)))?;

        Ok(HttpClient { client, timeout: self.timeout })
    }
}
