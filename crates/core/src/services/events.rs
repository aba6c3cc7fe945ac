//! Event listings and attendee feedback

use std::sync::Arc;

use tracing::debug;
use tripline_domain::{
    CacheStats, Event, Feedback, FeedbackRequest, Listing, ResourceEndpoint, Result, SubmissionReceipt,
    TriplineError,
};

use super::require;
use crate::fetch::envelope::{decode_list, decode_match, decode_receipt};
use crate::fetch::{FetchOrchestrator, FetchRuntime, ResourceQuery, ServicePolicy};

/// Reads events and submits feedback
#[derive(Debug, Clone)]
pub struct EventService {
    orchestrator: FetchOrchestrator,
}

impl EventService {
    pub fn new(runtime: Arc<FetchRuntime>, policy: ServicePolicy) -> Self {
        Self { orchestrator: FetchOrchestrator::new("events", runtime, policy) }
    }

    pub const fn orchestrator(&self) -> &FetchOrchestrator {
        &self.orchestrator
    }

    const fn query() -> ResourceQuery {
        ResourceQuery::new(ResourceEndpoint::Events)
    }

    pub async fn fetch_events(&self) -> Result<Vec<Event>> {
        let body = self.orchestrator.fetch_with_cache(&Self::query(), true).await?;
        Ok(decode_list(body))
    }

    pub async fn fetch_event_by_id(&self, id: &str) -> Result<Option<Event>> {
        let id = require("id", id)?;
        let body = self.orchestrator.fetch_with_cache(&Self::query().id(id), true).await?;
        Ok(decode_match(body, |event: &Event| event.id() == id))
    }

    pub async fn fetch_event_by_slug(&self, slug: &str) -> Result<Option<Event>> {
        let slug = require("slug", slug)?;
        let body = self.orchestrator.fetch_with_cache(&Self::query().slug(slug), true).await?;
        Ok(decode_match(body, |event: &Event| event.slug() == slug))
    }

    pub async fn fetch_events_with_limit(&self, limit: usize) -> Result<Vec<Event>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let body = self.orchestrator.fetch_with_cache(&Self::query().limit(limit), true).await?;
        let mut events: Vec<Event> = decode_list(body);
        events.truncate(limit);
        Ok(events)
    }

    pub async fn fetch_events_by_category(&self, category: &str) -> Result<Vec<Event>> {
        let category = require("category", category)?;
        let body = self.orchestrator.fetch_with_cache(&Self::query().category(category), true).await?;
        Ok(decode_list(body))
    }

    /// Full-text search. Never cached; a blank query returns nothing.
    pub async fn search_events(&self, query: &str) -> Result<Vec<Event>> {
        let query = query.trim();
        if query.is_empty() {
            debug!("blank event search, skipping request");
            return Ok(Vec::new());
        }
        let body = self.orchestrator.fetch_with_cache(&Self::query().search(query), false).await?;
        Ok(decode_list(body))
    }

    /// # Errors
    ///
    /// `InvalidInput` for a blank event id or comment, or a rating outside
    /// 1..=5. Otherwise as for any write.
    pub async fn submit_feedback(&self, request: &FeedbackRequest) -> Result<SubmissionReceipt> {
        require("eventId", &request.event_id)?;
        require("comment", &request.comment)?;
        if let Some(rating) = request.rating {
            if !(1..=5).contains(&rating) {
                return Err(TriplineError::InvalidInput(format!("rating must be between 1 and 5, got {rating}")));
            }
        }
        let body = serde_json::to_value(request)
            .map_err(|err| TriplineError::Internal(format!("failed to encode feedback: {err}")))?;

        let response = self.orchestrator.submit(&ResourceQuery::new(ResourceEndpoint::Feedback), &body).await?;
        Ok(decode_receipt(response)?)
    }

    /// Feedback left for one event, cached like other reads.
    pub async fn fetch_feedback(&self, event_id: &str) -> Result<Vec<Feedback>> {
        let event_id = require("eventId", event_id)?;
        let query = ResourceQuery::new(ResourceEndpoint::Feedback).event_id(event_id);
        let body = self.orchestrator.fetch_with_cache(&query, true).await?;
        let feedback: Vec<Feedback> = decode_list(body);
        Ok(feedback.into_iter().filter(|item| item.event_id.as_deref().map_or(true, |id| id == event_id)).collect())
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.orchestrator.cache_stats()
    }

    pub fn clear_cache(&self) {
        self.orchestrator.clear_cache();
    }

    pub async fn purge_cache(&self) {
        self.orchestrator.purge_cache(ResourceEndpoint::Events).await;
    }
}
