//! Periodic reachability probe for the primary API host
//!
//! Any HTTP response, whatever its status, means the host is reachable. A
//! transport error or a probe that outlives its timeout means it is not.
//! Each outcome is fed to the [`ConnectionMonitor`] as a connectivity event;
//! the monitor itself suppresses repeats.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use tripline_core::{ConnectionMonitor, ConnectivityEvent, Transport};
use tripline_domain::ConnectivityConfig;
use url::Url;

/// Probe lifecycle errors
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Connectivity probe is already running")]
    AlreadyRunning,

    #[error("Connectivity probe is not running")]
    NotRunning,

    #[error("Connectivity probe did not stop within {}ms", .0.as_millis())]
    StopTimeout(Duration),

    #[error("Connectivity probe task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Explicitly started background loop probing one URL
pub struct ConnectivityProbe {
    transport: Arc<dyn Transport>,
    target: Url,
    monitor: Arc<ConnectionMonitor>,
    interval: Duration,
    timeout: Duration,
    cancellation_token: CancellationToken,
    task_handle: Option<JoinHandle<()>>,
}

impl ConnectivityProbe {
    pub fn new(
        transport: Arc<dyn Transport>,
        target: Url,
        monitor: Arc<ConnectionMonitor>,
        config: &ConnectivityConfig,
    ) -> Self {
        Self {
            transport,
            target,
            monitor,
            interval: config.probe_interval(),
            timeout: config.probe_timeout(),
            cancellation_token: CancellationToken::new(),
            task_handle: None,
        }
    }

    /// Probe once and report the outcome to the monitor.
    ///
    /// Returns whether the host answered.
    pub async fn check_once(&self) -> bool {
        probe(&*self.transport, &self.target, self.timeout, &self.monitor).await
    }

    /// Spawn the probe loop. The first probe runs immediately.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::AlreadyRunning`] if the loop is active.
    #[instrument(skip(self), fields(target = %self.target))]
    pub fn start(&mut self) -> Result<(), ProbeError> {
        if self.is_running() {
            return Err(ProbeError::AlreadyRunning);
        }

        // Fresh token so the probe can restart after stop
        self.cancellation_token = CancellationToken::new();

        let transport = Arc::clone(&self.transport);
        let monitor = Arc::clone(&self.monitor);
        let target = self.target.clone();
        let (interval, timeout) = (self.interval, self.timeout);
        let cancel = self.cancellation_token.clone();

        self.task_handle = Some(tokio::spawn(async move {
            probe_loop(&*transport, &target, &monitor, interval, timeout, cancel).await;
        }));

        info!(interval_ms = interval.as_millis(), "Connectivity probe started");
        Ok(())
    }

    /// Cancel the loop and wait for it to finish.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::NotRunning`] if the loop is not active, or an
    /// error if the task does not wind down.
    #[instrument(skip(self), fields(target = %self.target))]
    pub async fn stop(&mut self) -> Result<(), ProbeError> {
        if !self.is_running() {
            return Err(ProbeError::NotRunning);
        }

        self.cancellation_token.cancel();

        if let Some(handle) = self.task_handle.take() {
            let join_timeout = self.timeout + Duration::from_secs(1);
            tokio::time::timeout(join_timeout, handle).await.map_err(|_| ProbeError::StopTimeout(join_timeout))??;
        }

        info!("Connectivity probe stopped");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.task_handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for ConnectivityProbe {
    fn drop(&mut self) {
        self.cancellation_token.cancel();
    }
}

impl std::fmt::Debug for ConnectivityProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectivityProbe")
            .field("target", &self.target.as_str())
            .field("interval", &self.interval)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

async fn probe_loop(
    transport: &dyn Transport,
    target: &Url,
    monitor: &ConnectionMonitor,
    interval: Duration,
    timeout: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                debug!("Connectivity probe loop cancelled");
                break;
            }
            _ = ticker.tick() => {
                probe(transport, target, timeout, monitor).await;
            }
        }
    }
}

async fn probe(transport: &dyn Transport, target: &Url, timeout: Duration, monitor: &ConnectionMonitor) -> bool {
    let reachable = match tokio::time::timeout(timeout, transport.get(target)).await {
        Ok(Ok(response)) => {
            debug!(status = response.status, "Connectivity probe answered");
            true
        }
        Ok(Err(err)) => {
            debug!(error = %err, "Connectivity probe failed");
            false
        }
        Err(_) => {
            debug!(timeout_ms = timeout.as_millis(), "Connectivity probe timed out");
            false
        }
    };

    let event = if reachable { ConnectivityEvent::Online } else { ConnectivityEvent::Offline };
    if monitor.handle_event(event) {
        if reachable {
            info!(url = %target, "API host reachable again");
        } else {
            warn!(url = %target, "API host unreachable, serving from cache");
        }
    }
    reachable
}
