//! Conversions from external infrastructure errors into domain errors.

use std::error::Error as _;
use std::time::Duration;

use reqwest::Error as HttpError;
use tripline_domain::{FetchError, TriplineError};

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub TriplineError);

impl From<InfraError> for TriplineError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<TriplineError> for InfraError {
    fn from(value: TriplineError) -> Self {
        Self(value)
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → FetchError */
/* -------------------------------------------------------------------------- */

/// Classify a reqwest failure for one attempt.
///
/// `deadline` is reported in [`FetchError::Timeout`]; reqwest does not say
/// which limit fired.
pub fn fetch_error(err: &HttpError, deadline: Option<Duration>) -> FetchError {
    if err.is_timeout() {
        return FetchError::Timeout(deadline.unwrap_or_default());
    }
    if err.is_decode() {
        return FetchError::payload(format!("Failed to decode response body: {err}"));
    }
    if let Some(status) = err.status() {
        return FetchError::from_status(status.as_u16(), None);
    }
    FetchError::Network(describe(err))
}

/// reqwest's top-level message omits the cause ("error sending request"),
/// so append the source chain.
fn describe(err: &HttpError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        if value.is_builder() {
            return Self(TriplineError::Config(format!("invalid HTTP client configuration: {}", describe(&value))));
        }
        Self(TriplineError::Fetch(fetch_error(&value, None)))
    }
}
