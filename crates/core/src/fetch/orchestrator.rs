//! Cache-aware fetching for one resource family
//!
//! Read path:
//!
//! 1. caching disabled: fetch through the queue, store nothing
//! 2. offline with any cached entry: serve it, no network
//! 3. fresh entry: serve it, no network
//! 4. stale entry: serve it and refresh once in the background
//! 5. expired or missing: fetch through the queue and store; if that fails
//!    and an entry exists, serve the entry instead of the error

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};
use tripline_common::cache::{Lookup, TierStats, TieredCache};
use tripline_common::resilience::{Clock, RetryConfig};
use tripline_domain::{CacheStats, FetchError, ResourceEndpoint};
use url::Url;

use super::ports::HttpMethod;
use super::query::ResourceQuery;
use super::runtime::FetchRuntime;
use super::settings::ServicePolicy;

type ResponseCache = TieredCache<String, Value, Arc<dyn Clock>>;

struct OrchestratorInner {
    name: &'static str,
    runtime: Arc<FetchRuntime>,
    cache: ResponseCache,
    read_retry: RetryConfig,
    write_retry: RetryConfig,
    revalidating: Mutex<HashSet<String>>,
}

/// Cache, queue and retry composition for one service. Clones share state.
#[derive(Clone)]
pub struct FetchOrchestrator {
    inner: Arc<OrchestratorInner>,
}

impl FetchOrchestrator {
    pub fn new(name: &'static str, runtime: Arc<FetchRuntime>, policy: ServicePolicy) -> Self {
        let cache = TieredCache::with_clock(policy.cache, runtime.clock());
        Self {
            inner: Arc::new(OrchestratorInner {
                name,
                runtime,
                cache,
                read_retry: policy.read_retry,
                write_retry: policy.write_retry,
                revalidating: Mutex::new(HashSet::new()),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    pub fn runtime(&self) -> &Arc<FetchRuntime> {
        &self.inner.runtime
    }

    /// Read `query`, consulting the cache unless `enable_cache` is false.
    #[instrument(skip_all, fields(service = self.inner.name, endpoint = %query.endpoint(), enable_cache = enable_cache))]
    pub async fn fetch_with_cache(&self, query: &ResourceQuery, enable_cache: bool) -> Result<Value, FetchError> {
        let inner = &self.inner;
        let candidates = inner.runtime.endpoints().candidates(query);
        let key = inner.runtime.endpoints().primary_for(query).to_string();

        if !enable_cache {
            return inner.fetch_queued(&candidates).await;
        }

        if !inner.runtime.monitor().is_online() {
            if let Some(entry) = inner.cache.peek(&key) {
                debug!(key = %key, "offline, serving cached entry");
                return Ok(entry.value);
            }
        }

        match inner.cache.lookup(&key) {
            Lookup::Fresh(value) => {
                debug!(key = %key, "cache hit (fresh)");
                Ok(value)
            }
            Lookup::Stale(value) => {
                debug!(key = %key, "cache hit (stale), revalidating in background");
                self.revalidate(key, candidates);
                Ok(value)
            }
            Lookup::Expired(_) | Lookup::Miss => match inner.fetch_queued(&candidates).await {
                Ok(value) => {
                    inner.cache.insert(key, value.clone());
                    Ok(value)
                }
                Err(err) => match inner.cache.peek(&key) {
                    Some(entry) => {
                        warn!(key = %key, error = %err, "fetch failed, serving last cached entry");
                        Ok(entry.value)
                    }
                    None => Err(err),
                },
            },
        }
    }

    /// POST `body` to the primary URL for `query`. Never cached.
    #[instrument(skip_all, fields(service = self.inner.name, endpoint = %query.endpoint()))]
    pub async fn submit(&self, query: &ResourceQuery, body: &Value) -> Result<Value, FetchError> {
        let inner = &self.inner;
        let url = inner.runtime.endpoints().primary_for(query);
        inner.runtime.queue().add(|| inner.runtime.perform_write(&url, body, &inner.write_retry)).await
    }

    pub fn cache_stats(&self) -> CacheStats {
        let cache = &self.inner.cache;
        CacheStats {
            size: cache.len(),
            keys: cache.keys(),
            memory_usage: cache.weigh(|value| serde_json::to_vec(value).map_or(0, |bytes| bytes.len())),
        }
    }

    pub fn tier_stats(&self) -> TierStats {
        self.inner.cache.stats()
    }

    pub fn clear_cache(&self) {
        self.inner.cache.clear();
        info!(service = self.inner.name, "cache cleared");
    }

    /// Clear the cache and ask the backend to drop its own copy of
    /// `endpoint`. The upstream request is best effort.
    pub async fn purge_cache(&self, endpoint: ResourceEndpoint) {
        self.clear_cache();

        let runtime = &self.inner.runtime;
        let url = runtime.endpoints().primary_for(&ResourceQuery::new(endpoint).action("purge"));
        match runtime.queue().add(|| runtime.attempt(HttpMethod::Get, &url, None, 0)).await {
            Ok(_) => info!(service = self.inner.name, "upstream cache purged"),
            Err(err) => warn!(service = self.inner.name, error = %err, "upstream purge failed"),
        }
    }

    /// Refresh `key` in the background unless a refresh is already running.
    fn revalidate(&self, key: String, candidates: Vec<Url>) {
        if !self.inner.revalidating.lock().insert(key.clone()) {
            debug!(key = %key, "revalidation already in flight");
            return;
        }

        let inner = Arc::clone(&self.inner);
        self.inner.runtime.spawn_background(async move {
            let _guard = RevalidationGuard { inner: &inner, key: &key };
            match inner.fetch_queued(&candidates).await {
                Ok(value) => {
                    inner.cache.insert(key.clone(), value);
                    debug!(key = %key, "background revalidation stored fresh data");
                }
                Err(err) => warn!(key = %key, error = %err, "background revalidation failed, keeping stale entry"),
            }
        });
    }
}

impl OrchestratorInner {
    async fn fetch_queued(&self, candidates: &[Url]) -> Result<Value, FetchError> {
        self.runtime.queue().add(|| self.runtime.perform_fetch(candidates, &self.read_retry)).await
    }
}

impl std::fmt::Debug for FetchOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchOrchestrator")
            .field("name", &self.inner.name)
            .field("cache", &self.inner.cache)
            .field("revalidating", &self.inner.revalidating.lock().len())
            .finish_non_exhaustive()
    }
}

/// Clears the in-flight marker however the refresh task ends.
struct RevalidationGuard<'a> {
    inner: &'a OrchestratorInner,
    key: &'a str,
}

impl Drop for RevalidationGuard<'_> {
    fn drop(&mut self) {
        self.inner.revalidating.lock().remove(self.key);
    }
}
