//! Global `tracing` subscriber setup
//!
//! Output goes to stderr so command output on stdout stays machine
//! readable. `RUST_LOG` wins over the configured level when set.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};
use tripline_domain::{LogFormat, LoggingConfig};

/// Install the global subscriber.
///
/// Returns `false` when a subscriber was already installed; the existing
/// one is left in place.
pub fn init_logging(config: &LoggingConfig) -> bool {
    let filter = env_filter(&config.level);
    let registry = tracing_subscriber::registry().with(filter);

    let result = match config.format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(false).with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Pretty => registry.with(fmt::layer().with_target(true).with_writer(std::io::stderr)).try_init(),
    };

    match result {
        Ok(()) => {
            tracing::debug!(level = %config.level, format = %config.format, "logging initialised");
            true
        }
        Err(_) => false,
    }
}

fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| configured_filter(level))
}

fn configured_filter(level: &str) -> EnvFilter {
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
}
