//! Command execution helpers
//!
//! Times a command, logs its outcome and hands back the result untouched.

use std::future::Future;

use tokio::time::Instant;
use tripline_domain::Result as DomainResult;

use crate::utils::logging::{error_label, log_command_execution};

/// Run `operation`, logging duration and outcome under `command`.
///
/// # Example
///
/// ```rust,ignore
/// let events = execute_logged("events::list", || ctx.events.fetch_events()).await?;
/// ```
pub async fn execute_logged<T, F, Fut>(command: &str, operation: F) -> DomainResult<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = DomainResult<T>>,
{
    let started = Instant::now();
    let result = operation().await;
    log_command_execution(command, started.elapsed(), result.as_ref().map(|_| ()).map_err(error_label));
    result
}
