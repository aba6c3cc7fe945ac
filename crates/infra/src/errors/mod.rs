//! Infrastructure error plumbing

mod conversions;

pub use conversions::{fetch_error, InfraError};
