//! Error types used throughout the application

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Statuses that end a retry loop for the URL that produced them.
pub const TERMINAL_CLIENT_STATUSES: [u16; 4] = [400, 401, 403, 404];

/// Main error type for Tripline
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum TriplineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Result type alias for Tripline operations
pub type Result<T> = std::result::Result<T, TriplineError>;

/// Coarse classification of a [`FetchError`], used for log fields and
/// metric labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchErrorKind {
    Network,
    Timeout,
    RateLimit,
    Client,
    Server,
    Payload,
    Rejected,
}

crate::impl_wire_name_conversions!(FetchErrorKind {
    Network => "network",
    Timeout => "timeout",
    RateLimit => "rate_limit",
    Client => "client",
    Server => "server",
    Payload => "payload",
    Rejected => "rejected",
});

/// Failure of a single logical fetch or submission.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FetchError {
    /// Transport failure before any response arrived (DNS, refused, reset).
    #[error("Network error: {0}")]
    Network(String),

    /// The attempt did not settle within its deadline.
    #[error("Request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// Admission denied by the local rate limiter.
    #[error("Rate limit exceeded for {key}, retry after {}s", .retry_after.as_secs().max(1))]
    RateLimited { key: String, retry_after: Duration },

    /// Non-success HTTP status, or a payload that could not be parsed.
    #[error("{message}")]
    Api { status: Option<u16>, message: String },

    /// The backend answered `success: false` to a write.
    #[error("Request rejected: {message}")]
    Rejected { message: String },
}

impl FetchError {
    /// Classify a non-success HTTP status.
    ///
    /// `detail` is the `message` field of the error body, when present.
    pub fn from_status(status: u16, detail: Option<&str>) -> Self {
        let message = match status {
            429 => "Rate limit exceeded by server (HTTP 429), please retry later".to_string(),
            s if s >= 500 => format!("Server unavailable (HTTP {s})"),
            s => match detail {
                Some(detail) if !detail.is_empty() => format!("HTTP error {s}: {detail}"),
                _ => format!("HTTP error {s}"),
            },
        };
        Self::Api { status: Some(status), message }
    }

    /// A response body that is not valid JSON or not a known shape.
    pub fn payload(message: impl Into<String>) -> Self {
        Self::Api { status: None, message: message.into() }
    }

    pub const fn kind(&self) -> FetchErrorKind {
        match self {
            Self::Network(_) => FetchErrorKind::Network,
            Self::Timeout(_) => FetchErrorKind::Timeout,
            Self::RateLimited { .. } => FetchErrorKind::RateLimit,
            Self::Api { status: Some(429), .. } => FetchErrorKind::RateLimit,
            Self::Api { status: Some(s), .. } if *s >= 500 => FetchErrorKind::Server,
            Self::Api { status: Some(_), .. } => FetchErrorKind::Client,
            Self::Api { status: None, .. } => FetchErrorKind::Payload,
            Self::Rejected { .. } => FetchErrorKind::Rejected,
        }
    }

    /// HTTP status carried by the error, if any.
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => *status,
            _ => None,
        }
    }

    /// Whether another attempt against the same URL may succeed.
    ///
    /// Network failures and timeouts always are. API errors are unless the
    /// status is one of [`TERMINAL_CLIENT_STATUSES`]. Local rate limiting and
    /// backend rejections never are.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) => true,
            Self::Api { status: Some(status), .. } => !TERMINAL_CLIENT_STATUSES.contains(status),
            Self::Api { status: None, .. } => true,
            Self::RateLimited { .. } | Self::Rejected { .. } => false,
        }
    }

    /// Suggested wait before the caller tries again.
    pub const fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after, .. } => Some(*retry_after),
            _ => None,
        }
    }
}
