use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, util::TryInitError, EnvFilter,
};

use crate::config::{LogFormat, LoggingConfig};

// ============================================================================
// Telemetry - tracing subscriber setup
// ============================================================================

/// Install the global subscriber. `RUST_LOG` wins over the configured level
/// when both are set.
pub fn init(config: &LoggingConfig) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    match config.log_format {
        LogFormat::Compact => tracing_subscriber::registry()
            .with(fmt::layer().compact().with_target(true).with_thread_ids(true))
            .with(filter)
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(fmt::layer().json().with_current_span(true).with_target(true))
            .with(filter)
            .try_init(),
    }
}
