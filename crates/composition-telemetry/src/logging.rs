//! Structured logging.
//!
//! Plain output by default, JSON lines when asked for. Use [`log_event!`]
//! to tag lines with the context that produced them.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{TelemetryConfig, TelemetryError};

/// Install the global `tracing` subscriber.
///
/// # Errors
///
/// `LoggingInit` if the filter does not parse or a subscriber is already
/// installed.
pub fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;

    let registry = tracing_subscriber::registry().with(env_filter);

    if config.json_logs {
        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true);
        registry
            .with(json_layer)
            .try_init()
            .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_ansi(true);
        registry
            .with(fmt_layer)
            .try_init()
            .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;
    }

    tracing::info!(
        context = %config.context,
        json_logs = config.json_logs,
        "Logging initialized"
    );
    Ok(())
}

/// Log with the context name attached.
#[macro_export]
macro_rules! log_event {
    (info, $context:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::info!(context = $context, $($($field)*,)? $msg)
    };
    (warn, $context:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::warn!(context = $context, $($($field)*,)? $msg)
    };
    (error, $context:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::error!(context = $context, $($($field)*,)? $msg)
    };
    (debug, $context:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::debug!(context = $context, $($($field)*,)? $msg)
    };
}
