//! Statistics types for the fetch layer
//!
//! - Per-request outcome metrics and the aggregate health summary
//! - Cache occupancy summary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/* -------------------------------------------------------------------------- */
/* Request Metrics */
/* -------------------------------------------------------------------------- */

/// Outcome of one network attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    /// A response arrived with this status code.
    Http(u16),
    Timeout,
    NetworkError,
}

impl RequestStatus {
    /// 2xx and 3xx count as success.
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Http(code) if *code >= 200 && *code < 400)
    }

    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }
}

/// One recorded network attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestMetric {
    pub url: String,
    pub method: String,
    pub duration_ms: u64,
    pub status: RequestStatus,
    pub timestamp: DateTime<Utc>,
    /// Zero-based attempt index within the retry loop that produced it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_count: Option<u32>,
}

/// Aggregate health over the metrics currently buffered
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceStats {
    pub total_requests: usize,
    pub average_duration_ms: f64,
    /// Percentage (0-100) of successful attempts; 0 when nothing recorded.
    pub success_rate: f64,
    pub slow_requests: usize,
    pub failed_requests: usize,
    pub timeout_requests: usize,
}

/* -------------------------------------------------------------------------- */
/* Cache Statistics */
/* -------------------------------------------------------------------------- */

/// Snapshot of a service cache
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub size: usize,
    pub keys: Vec<String>,
    /// Approximate bytes held by cached payloads.
    pub memory_usage: usize,
}
