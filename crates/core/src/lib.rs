//! # Tripline Core
//!
//! Fetch orchestration and domain services, free of I/O.
//!
//! This crate contains:
//! - Port traits for the HTTP transport and request metrics
//! - The connection monitor
//! - The cache/queue/retry/fallback fetch pipeline
//! - Destination and event services
//!
//! ## Architecture Principles
//! - Depends on `tripline-common` and `tripline-domain` only
//! - No HTTP client code; the transport is injected
//! - Every collaborator is constructed by the caller, never global

pub mod connectivity;
pub mod fetch;
pub mod services;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use connectivity::{ConnectionMonitor, ConnectivityEvent, Subscription};
pub use fetch::{
    Endpoints, FetchOrchestrator, FetchRuntime, FetchRuntimeBuilder, HttpMethod, NoopObserver, RequestObserver,
    ResourceQuery, ServicePolicy, Transport, TransportResponse,
};
pub use services::{DestinationService, EventService};
