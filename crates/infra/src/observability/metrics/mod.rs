//! Metrics collection modules

pub mod request;

pub use request::PerformanceMonitor;
