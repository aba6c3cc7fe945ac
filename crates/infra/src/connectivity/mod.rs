//! Background reachability checks feeding the connection monitor

pub mod probe;

pub use probe::{ConnectivityProbe, ProbeError};
