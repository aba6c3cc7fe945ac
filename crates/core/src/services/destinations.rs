//! Destination catalogue and bookings

use std::sync::Arc;

use tracing::debug;
use tripline_domain::{
    CacheStats, Destination, Listing, ResourceEndpoint, Result, SubmissionReceipt, TransactionRecord,
    TransactionRequest, TriplineError,
};

use super::require;
use crate::fetch::envelope::{decode_list, decode_match, decode_receipt};
use crate::fetch::{FetchOrchestrator, FetchRuntime, ResourceQuery, ServicePolicy};

/// Reads destinations and forwards booking transactions
#[derive(Debug, Clone)]
pub struct DestinationService {
    orchestrator: FetchOrchestrator,
}

impl DestinationService {
    pub fn new(runtime: Arc<FetchRuntime>, policy: ServicePolicy) -> Self {
        Self { orchestrator: FetchOrchestrator::new("destinations", runtime, policy) }
    }

    pub const fn orchestrator(&self) -> &FetchOrchestrator {
        &self.orchestrator
    }

    const fn query() -> ResourceQuery {
        ResourceQuery::new(ResourceEndpoint::Destinations)
    }

    pub async fn fetch_destinations(&self) -> Result<Vec<Destination>> {
        let body = self.orchestrator.fetch_with_cache(&Self::query(), true).await?;
        Ok(decode_list(body))
    }

    pub async fn fetch_destination_by_id(&self, id: &str) -> Result<Option<Destination>> {
        let id = require("id", id)?;
        let body = self.orchestrator.fetch_with_cache(&Self::query().id(id), true).await?;
        Ok(decode_match(body, |destination: &Destination| destination.id() == id))
    }

    pub async fn fetch_destination_by_slug(&self, slug: &str) -> Result<Option<Destination>> {
        let slug = require("slug", slug)?;
        let body = self.orchestrator.fetch_with_cache(&Self::query().slug(slug), true).await?;
        Ok(decode_match(body, |destination: &Destination| destination.slug() == slug))
    }

    /// At most `limit` destinations; the backend may ignore the hint, so the
    /// list is truncated here as well.
    pub async fn fetch_destinations_with_limit(&self, limit: usize) -> Result<Vec<Destination>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let body = self.orchestrator.fetch_with_cache(&Self::query().limit(limit), true).await?;
        let mut destinations: Vec<Destination> = decode_list(body);
        destinations.truncate(limit);
        Ok(destinations)
    }

    pub async fn fetch_destinations_by_category(&self, category: &str) -> Result<Vec<Destination>> {
        let category = require("category", category)?;
        let body = self.orchestrator.fetch_with_cache(&Self::query().category(category), true).await?;
        Ok(decode_list(body))
    }

    /// Full-text search. Never cached; a blank query returns nothing.
    pub async fn search_destinations(&self, query: &str) -> Result<Vec<Destination>> {
        let query = query.trim();
        if query.is_empty() {
            debug!("blank destination search, skipping request");
            return Ok(Vec::new());
        }
        let body = self.orchestrator.fetch_with_cache(&Self::query().search(query), false).await?;
        Ok(decode_list(body))
    }

    /// Forward a booking to the backend.
    ///
    /// # Errors
    ///
    /// Network and HTTP failures after the write retry budget, or
    /// `FetchError::Rejected` when the backend refuses the booking.
    pub async fn create_transaction(&self, request: &TransactionRequest) -> Result<SubmissionReceipt> {
        require("customerName", &request.customer_name)?;
        require("customerEmail", &request.customer_email)?;
        let body = serde_json::to_value(request)
            .map_err(|err| TriplineError::Internal(format!("failed to encode transaction: {err}")))?;

        let response =
            self.orchestrator.submit(&ResourceQuery::new(ResourceEndpoint::Transactions), &body).await?;
        Ok(decode_receipt(response)?)
    }

    /// Recorded transactions. Booking state changes often, so this is
    /// always fetched.
    pub async fn fetch_transactions(&self) -> Result<Vec<TransactionRecord>> {
        let body =
            self.orchestrator.fetch_with_cache(&ResourceQuery::new(ResourceEndpoint::Transactions), false).await?;
        Ok(decode_list(body))
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.orchestrator.cache_stats()
    }

    pub fn clear_cache(&self) {
        self.orchestrator.clear_cache();
    }

    pub async fn purge_cache(&self) {
        self.orchestrator.purge_cache(ResourceEndpoint::Destinations).await;
    }
}
