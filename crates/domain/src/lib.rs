//! # Tripline Domain
//!
//! Business domain types for the Tripline fetch layer.
//!
//! This crate contains:
//! - Listing records (destinations, events) and write payloads
//! - Fetch error taxonomy and the crate-wide `Result`
//! - Configuration structures with their defaults
//! - Request metric and statistics types
//!
//! ## Architecture
//! - No dependencies on other Tripline crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
