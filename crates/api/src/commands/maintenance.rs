//! Cache and health commands

use serde_json::{json, Value};
use tripline_domain::Result;

use super::to_json;
use crate::cli::PurgeTarget;
use crate::context::AppContext;

/// Health snapshot of this process.
///
/// Metrics only cover requests made by this process; a fresh CLI run
/// reports zeroes.
pub fn stats(ctx: &AppContext) -> Result<Value> {
    to_json(&ctx.stats())
}

pub async fn purge(ctx: &AppContext, target: PurgeTarget) -> Result<Value> {
    let mut purged = Vec::new();
    if matches!(target, PurgeTarget::Destinations | PurgeTarget::All) {
        ctx.destinations.purge_cache().await;
        purged.push("destinations");
    }
    if matches!(target, PurgeTarget::Events | PurgeTarget::All) {
        ctx.events.purge_cache().await;
        purged.push("events");
    }
    tracing::info!(?purged, "caches purged");
    Ok(json!({ "purged": purged }))
}
