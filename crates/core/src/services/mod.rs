//! Domain services built on the fetch orchestrator

pub mod destinations;
pub mod events;

pub use destinations::DestinationService;
pub use events::EventService;

use tripline_domain::{Result, TriplineError};

/// Trimmed `value`, or `InvalidInput` naming `field` when blank.
fn require<'a>(field: &str, value: &'a str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(TriplineError::InvalidInput(format!("{field} must not be empty")));
    }
    Ok(trimmed)
}
