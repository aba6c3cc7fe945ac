//! Application context - dependency injection container
//!
//! One [`FetchRuntime`] (queue, rate limiter, connection monitor) is shared
//! by both services; each service owns its cache.

use std::sync::Arc;

use serde::Serialize;
use tripline_core::fetch::{Endpoints, FetchRuntime, ServicePolicy, Transport};
use tripline_core::{ConnectionMonitor, DestinationService, EventService};
use tripline_domain::{CacheStats, PerformanceStats, Result, TriplineConfig, TriplineError};
use tripline_infra::{ConnectivityProbe, HttpClient, PerformanceMonitor};

/// Application context - holds all services and dependencies
pub struct AppContext {
    pub config: TriplineConfig,
    pub monitor: Arc<ConnectionMonitor>,
    pub performance: Arc<PerformanceMonitor>,
    pub runtime: Arc<FetchRuntime>,
    pub destinations: DestinationService,
    pub events: EventService,
    probe: Option<ConnectivityProbe>,
}

impl AppContext {
    /// Wire the services over the reqwest transport.
    ///
    /// # Errors
    ///
    /// Returns `TriplineError::Config` if the configuration is invalid or
    /// the HTTP client cannot be built.
    pub fn new(config: TriplineConfig) -> Result<Self> {
        let transport = Arc::new(HttpClient::from_config(&config.api, &config.fetch)?);
        Self::with_transport(config, transport)
    }

    /// Wire the services over any transport.
    ///
    /// # Errors
    ///
    /// Returns `TriplineError::Config` if the configuration is invalid.
    pub fn with_transport(config: TriplineConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;

        let monitor = Arc::new(ConnectionMonitor::default());
        let performance = Arc::new(PerformanceMonitor::new());
        let endpoints = Endpoints::from_config(&config.api)?;
        let primary = config.api.primary_url()?;

        let runtime = Arc::new(
            FetchRuntime::builder(Arc::clone(&transport), endpoints)
                .fetch_config(&config.fetch)
                .observer(performance.clone())
                .monitor(Arc::clone(&monitor))
                .build()?,
        );

        let destinations =
            DestinationService::new(Arc::clone(&runtime), ServicePolicy::from_config(&config, &config.destinations));
        let events = EventService::new(Arc::clone(&runtime), ServicePolicy::from_config(&config, &config.events));

        let probe = config
            .connectivity
            .probe_enabled
            .then(|| ConnectivityProbe::new(transport, primary, Arc::clone(&monitor), &config.connectivity));

        tracing::info!(
            api = %config.api.base_url,
            fallbacks = config.api.fallback_urls.len(),
            probe = probe.is_some(),
            "application context ready"
        );

        Ok(Self { config, monitor, performance, runtime, destinations, events, probe })
    }

    /// Start the background connectivity probe, if enabled.
    ///
    /// Returns whether a probe is running afterwards.
    ///
    /// # Errors
    ///
    /// Returns `TriplineError::Internal` if the probe is already running.
    pub fn start_probe(&mut self) -> Result<bool> {
        match self.probe.as_mut() {
            Some(probe) => {
                probe.start().map_err(|err| TriplineError::Internal(err.to_string()))?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Stop the probe and wait for in-flight revalidations.
    pub async fn shutdown(&mut self) {
        if let Some(probe) = self.probe.as_mut().filter(|probe| probe.is_running()) {
            if let Err(err) = probe.stop().await {
                tracing::warn!(error = %err, "connectivity probe did not stop cleanly");
            }
        }
        self.runtime.drain_background().await;
        tracing::debug!("application context shut down");
    }

    pub fn probe_running(&self) -> bool {
        self.probe.as_ref().is_some_and(ConnectivityProbe::is_running)
    }

    pub fn stats(&self) -> AppStats {
        let queue = self.runtime.queue_stats();
        AppStats {
            online: self.monitor.is_online(),
            performance: self.performance.get_stats(),
            destinations_cache: self.destinations.cache_stats(),
            events_cache: self.events.cache_stats(),
            in_flight: queue.in_flight,
            queued: queue.queued,
            background_revalidations: self.runtime.background_tasks(),
        }
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("runtime", &self.runtime)
            .field("probe", &self.probe)
            .finish_non_exhaustive()
    }
}

/// Health snapshot printed by `tripline stats`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppStats {
    pub online: bool,
    pub performance: PerformanceStats,
    pub destinations_cache: CacheStats,
    pub events_cache: CacheStats,
    pub in_flight: usize,
    pub queued: usize,
    pub background_revalidations: usize,
}
