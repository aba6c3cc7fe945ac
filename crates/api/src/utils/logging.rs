use std::time::Duration;

use tracing::{info, warn};
use tripline_domain::TriplineError;

/// Log the outcome of a command execution with structured fields.
///
/// `command` should be a stable identifier such as `"events::search"`.
#[inline]
pub fn log_command_execution(command: &str, elapsed: Duration, outcome: Result<(), &'static str>) {
    let duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

    match outcome {
        Ok(()) => info!(command, duration_ms, "command_execution_success"),
        Err(error_type) => warn!(command, duration_ms, error_type, "command_execution_failure"),
    }
}

/// Convert a `TriplineError` into a stable label suitable for logging.
#[inline]
pub fn error_label(error: &TriplineError) -> &'static str {
    match error {
        TriplineError::Config(_) => "config",
        TriplineError::Network(_) => "network",
        TriplineError::NotFound(_) => "not_found",
        TriplineError::InvalidInput(_) => "invalid_input",
        TriplineError::Internal(_) => "internal",
        TriplineError::Fetch(fetch) => fetch.kind().as_str(),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration as StdDuration;

    use tripline_domain::FetchError;

    use super::*;

    #[test]
    fn fetch_errors_are_labelled_by_kind() {
        let limited = TriplineError::Fetch(FetchError::RateLimited {
            key: "/api?endpoint=events".into(),
            retry_after: StdDuration::from_secs(3),
        });
        assert_eq!(error_label(&limited), "rate_limit");
        assert_eq!(error_label(&TriplineError::Fetch(FetchError::from_status(502, None))), "server");
        assert_eq!(error_label(&TriplineError::InvalidInput("rating".into())), "invalid_input");
    }
}
