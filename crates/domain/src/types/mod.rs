//! Domain types and models
//!
//! Records exchanged with the upstream API plus the metric types produced
//! by the fetch layer.

pub mod booking;
pub mod listing;
pub mod stats;

mod serde_helpers;

pub use booking::{Feedback, FeedbackRequest, SubmissionReceipt, TransactionRecord, TransactionRequest};
pub use listing::{Destination, Event, Listing, ResourceEndpoint};
pub use stats::{CacheStats, PerformanceStats, RequestMetric, RequestStatus};
