//! # Tripline Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - The reqwest-backed [`Transport`](tripline_core::Transport)
//! - The request performance monitor
//! - Configuration loading (files and `TRIPLINE_*` environment)
//! - Logging initialisation
//! - The background connectivity probe
//!
//! ## Architecture
//! - Implements traits defined in `tripline-core`
//! - Contains all "impure" code (network, filesystem, environment)

pub mod config;
pub mod connectivity;
pub mod errors;
pub mod http;
pub mod observability;

// Re-export commonly used items
pub use config::{load, load_from_file, load_with_env, ConfigError};
pub use connectivity::ConnectivityProbe;
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder};
pub use observability::{init_logging, MetricsError, MetricsResult, PerformanceMonitor};
