//! Fetch orchestration: ports, addressing, envelope decoding and the
//! cache/queue/retry pipeline

pub mod envelope;
pub mod orchestrator;
pub mod ports;
pub mod query;
pub mod runtime;
pub mod settings;

pub use orchestrator::FetchOrchestrator;
pub use ports::{HttpMethod, NoopObserver, RequestObserver, Transport, TransportResponse};
pub use query::{rate_limit_key, Endpoints, ResourceQuery};
pub use runtime::{FetchRetryPolicy, FetchRuntime, FetchRuntimeBuilder};
pub use settings::ServicePolicy;
