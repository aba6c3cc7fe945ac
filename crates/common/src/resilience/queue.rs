//! Bounded-concurrency FIFO request queue
//!
//! [`RequestQueue::add`] runs a task once a slot is free and hands its
//! output straight back to the caller. At most `max_concurrent` tasks run
//! at once; waiters are admitted in submission order (tokio's semaphore is
//! fair). A finished task keeps its slot for `dispatch_delay` before the
//! next waiter is admitted, which spreads bursts out instead of firing them
//! all at the backend at once.
//!
//! The queue itself never fails a task. Errors are whatever the task
//! returns.

use std::future::Future;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, warn};

/// Configuration for the request queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueConfig {
    pub max_concurrent: usize,
    /// How long a slot stays taken after its task settles
    pub dispatch_delay: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self { max_concurrent: 3, dispatch_delay: Duration::from_millis(100) }
    }
}

impl QueueConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_concurrent == 0 {
            return Err("max_concurrent must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Point-in-time queue gauges
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueStats {
    pub max_concurrent: usize,
    pub in_flight: usize,
    pub queued: usize,
    pub completed: u64,
}

struct QueueInner {
    config: QueueConfig,
    semaphore: Arc<Semaphore>,
    in_flight: AtomicUsize,
    queued: AtomicUsize,
    completed: AtomicU64,
}

/// Bounded-concurrency executor. Clones share the same slots.
#[derive(Clone)]
pub struct RequestQueue {
    inner: Arc<QueueInner>,
}

impl RequestQueue {
    /// # Errors
    ///
    /// Returns an error message if the configuration is invalid.
    pub fn new(config: QueueConfig) -> Result<Self, String> {
        config.validate()?;
        let semaphore = Arc::new(Semaphore::new(config.max_concurrent));
        Ok(Self {
            inner: Arc::new(QueueInner {
                config,
                semaphore,
                in_flight: AtomicUsize::new(0),
                queued: AtomicUsize::new(0),
                completed: AtomicU64::new(0),
            }),
        })
    }

    pub fn config(&self) -> &QueueConfig {
        &self.inner.config
    }

    /// Run `task` once a slot is free and return its output.
    pub async fn add<F, Fut, T>(&self, task: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let waiting = WaitingGuard::enter(&self.inner);
        let permit = match Arc::clone(&self.inner.semaphore).acquire_owned().await {
            Ok(permit) => Some(permit),
            Err(err) => {
                // Only possible if the semaphore is closed, which this type never does.
                warn!(error = %err, "request queue semaphore unavailable, running task unbounded");
                None
            }
        };
        drop(waiting);

        let _slot = SlotGuard::occupy(&self.inner, permit);
        debug!(in_flight = self.in_flight(), queued = self.queued(), "dispatching queued task");
        task().await
    }

    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.load(Ordering::Acquire)
    }

    pub fn queued(&self) -> usize {
        self.inner.queued.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> QueueStats {
        QueueStats {
            max_concurrent: self.inner.config.max_concurrent,
            in_flight: self.in_flight(),
            queued: self.queued(),
            completed: self.inner.completed.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for RequestQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestQueue").field("config", &self.inner.config).field("stats", &self.stats()).finish()
    }
}

struct WaitingGuard<'a> {
    inner: &'a QueueInner,
}

impl<'a> WaitingGuard<'a> {
    fn enter(inner: &'a QueueInner) -> Self {
        inner.queued.fetch_add(1, Ordering::AcqRel);
        Self { inner }
    }
}

impl Drop for WaitingGuard<'_> {
    fn drop(&mut self) {
        self.inner.queued.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Holds a slot while the task runs. On drop (completion, panic or the
/// caller abandoning the future) the slot is released after the dispatch
/// delay.
struct SlotGuard {
    inner: Arc<QueueInner>,
    permit: Option<OwnedSemaphorePermit>,
}

impl SlotGuard {
    fn occupy(inner: &Arc<QueueInner>, permit: Option<OwnedSemaphorePermit>) -> Self {
        inner.in_flight.fetch_add(1, Ordering::AcqRel);
        Self { inner: Arc::clone(inner), permit }
    }
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        self.inner.in_flight.fetch_sub(1, Ordering::AcqRel);
        self.inner.completed.fetch_add(1, Ordering::Relaxed);

        let Some(permit) = self.permit.take() else { return };
        let delay = self.inner.config.dispatch_delay;
        if delay.is_zero() {
            return;
        }
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                tokio::time::sleep(delay).await;
                drop(permit);
            });
        }
    }
}
