//! Command handlers
//!
//! Each handler runs against an [`AppContext`] and returns the JSON the CLI
//! prints.

pub mod catalogue;
pub mod maintenance;

use serde::Serialize;
use serde_json::Value;
use tripline_domain::{Result, TriplineError};

use crate::cli::Command;
use crate::context::AppContext;

pub use catalogue::{destinations, events, feedback, transactions};
pub use maintenance::{purge, stats};

/// Dispatch a parsed command.
///
/// # Errors
///
/// Whatever the underlying service call returns.
pub async fn execute(ctx: &AppContext, command: &Command) -> Result<Value> {
    match command {
        Command::Destinations(args) => destinations(ctx, args).await,
        Command::Events(args) => events(ctx, args).await,
        Command::Feedback { event_id } => feedback(ctx, event_id).await,
        Command::Transactions => transactions(ctx).await,
        Command::Stats => stats(ctx),
        Command::Purge { target } => purge(ctx, *target).await,
    }
}

pub(crate) fn to_json<T: Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|err| TriplineError::Internal(format!("failed to encode output: {err}")))
}
