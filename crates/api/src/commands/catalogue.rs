//! Read commands over the destination and event services

use serde_json::Value;
use tripline_domain::Result;

use super::to_json;
use crate::cli::{ListingArgs, Selector};
use crate::context::AppContext;
use crate::utils::command_helpers::execute_logged;

pub async fn destinations(ctx: &AppContext, args: &ListingArgs) -> Result<Value> {
    let service = &ctx.destinations;
    match args.selector() {
        Selector::All => to_json(&execute_logged("destinations::list", || service.fetch_destinations()).await?),
        Selector::Id(id) => {
            to_json(&execute_logged("destinations::by_id", || service.fetch_destination_by_id(id)).await?)
        }
        Selector::Slug(slug) => {
            to_json(&execute_logged("destinations::by_slug", || service.fetch_destination_by_slug(slug)).await?)
        }
        Selector::Category(category) => to_json(
            &execute_logged("destinations::by_category", || service.fetch_destinations_by_category(category))
                .await?,
        ),
        Selector::Limit(limit) => to_json(
            &execute_logged("destinations::with_limit", || service.fetch_destinations_with_limit(limit)).await?,
        ),
        Selector::Search(query) => {
            to_json(&execute_logged("destinations::search", || service.search_destinations(query)).await?)
        }
    }
}

pub async fn events(ctx: &AppContext, args: &ListingArgs) -> Result<Value> {
    let service = &ctx.events;
    match args.selector() {
        Selector::All => to_json(&execute_logged("events::list", || service.fetch_events()).await?),
        Selector::Id(id) => to_json(&execute_logged("events::by_id", || service.fetch_event_by_id(id)).await?),
        Selector::Slug(slug) => {
            to_json(&execute_logged("events::by_slug", || service.fetch_event_by_slug(slug)).await?)
        }
        Selector::Category(category) => {
            to_json(&execute_logged("events::by_category", || service.fetch_events_by_category(category)).await?)
        }
        Selector::Limit(limit) => {
            to_json(&execute_logged("events::with_limit", || service.fetch_events_with_limit(limit)).await?)
        }
        Selector::Search(query) => to_json(&execute_logged("events::search", || service.search_events(query)).await?),
    }
}

pub async fn feedback(ctx: &AppContext, event_id: &str) -> Result<Value> {
    to_json(&execute_logged("events::feedback", || ctx.events.fetch_feedback(event_id)).await?)
}

pub async fn transactions(ctx: &AppContext) -> Result<Value> {
    to_json(&execute_logged("destinations::transactions", || ctx.destinations.fetch_transactions()).await?)
}
