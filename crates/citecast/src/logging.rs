//! Process-wide logging setup.
//!
//! Library code logs through the `log` facade and opens `tracing` spans.
//! [`init_logging`] installs a `tracing-subscriber` registry and bridges
//! `log` records into it, so both end up in one formatted stream.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

use crate::config::{LogFormat, LoggingConfig};

/// Builds the filter: `LOG_LEVEL`, then `RUST_LOG`, then the configured level.
pub fn build_filter(config: &LoggingConfig) -> EnvFilter {
    let directive = std::env::var("LOG_LEVEL")
        .ok()
        .or_else(|| std::env::var("RUST_LOG").ok())
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| config.level.clone());

    EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs the global subscriber. Returns `false` if one was already set.
pub fn init_logging(config: &LoggingConfig) -> bool {
    let json = (config.format == LogFormat::Json)
        .then(|| fmt::layer().json().with_current_span(true));
    let compact = (config.format == LogFormat::Compact).then(|| fmt::layer().compact());
    let pretty = (config.format == LogFormat::Pretty).then(fmt::layer);

    let subscriber = Registry::default()
        .with(build_filter(config))
        .with(json)
        .with(compact)
        .with(pretty);

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        return false;
    }

    // `log` records from dependencies and from our own modules.
    let _ = tracing_log::LogTracer::init();
    true
}
