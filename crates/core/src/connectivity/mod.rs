//! Online/offline state shared by the fetch layer and its callers

pub mod monitor;

pub use monitor::{ConnectionMonitor, ConnectivityEvent, Subscription};
