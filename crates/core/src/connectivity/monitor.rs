//! Connection state with change notification
//!
//! The monitor holds a single boolean. Only [`ConnectivityEvent`]s move it,
//! and only an actual transition reaches subscribers. Callbacks run
//! synchronously on the thread that delivered the event, after the
//! subscriber lock has been released, so a callback may subscribe or
//! unsubscribe without deadlocking.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::{debug, info};

type StatusCallback = Arc<dyn Fn(bool) + Send + Sync>;

/// Signal from the platform (or a probe) about network reachability
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityEvent {
    Online,
    Offline,
}

impl ConnectivityEvent {
    pub const fn is_online(self) -> bool {
        matches!(self, Self::Online)
    }
}

struct MonitorInner {
    online: AtomicBool,
    next_id: AtomicU64,
    subscribers: Mutex<Vec<(u64, StatusCallback)>>,
}

/// Tracks whether the backend is believed reachable.
///
/// Construct one per composition root and share it by `Arc`.
pub struct ConnectionMonitor {
    inner: Arc<MonitorInner>,
}

impl Default for ConnectionMonitor {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ConnectionMonitor {
    pub fn new(initially_online: bool) -> Self {
        Self {
            inner: Arc::new(MonitorInner {
                online: AtomicBool::new(initially_online),
                next_id: AtomicU64::new(0),
                subscribers: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn is_online(&self) -> bool {
        self.inner.online.load(Ordering::Acquire)
    }

    /// Apply a connectivity event. Returns `true` if the state changed.
    pub fn handle_event(&self, event: ConnectivityEvent) -> bool {
        let online = event.is_online();
        let previous = self.inner.online.swap(online, Ordering::AcqRel);
        if previous == online {
            debug!(online, "connectivity event without state change");
            return false;
        }

        info!(online, "connection state changed");
        let callbacks: Vec<StatusCallback> =
            self.inner.subscribers.lock().iter().map(|(_, callback)| Arc::clone(callback)).collect();
        for callback in callbacks {
            callback(online);
        }
        true
    }

    /// Register `callback` for every future transition.
    pub fn on_status_change<F>(&self, callback: F) -> Subscription
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.subscribers.lock().push((id, Arc::new(callback)));
        Subscription { id, monitor: Arc::downgrade(&self.inner) }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.lock().len()
    }
}

impl std::fmt::Debug for ConnectionMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionMonitor")
            .field("online", &self.is_online())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Handle for one registered callback.
///
/// Dropping the handle keeps the callback registered; call
/// [`Subscription::unsubscribe`] to remove it.
#[must_use = "keep the subscription to be able to unsubscribe"]
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    monitor: Weak<MonitorInner>,
}

impl Subscription {
    /// Remove exactly this callback. A no-op once the monitor is gone.
    pub fn unsubscribe(self) {
        if let Some(inner) = self.monitor.upgrade() {
            inner.subscribers.lock().retain(|(id, _)| *id != self.id);
        }
    }
}
