//! # Composition Telemetry
//!
//! Logging and metrics for processes hosting composed contexts.
//!
//! ## Components
//!
//! - **Logs**: `tracing-subscriber` with env filter, plain or JSON output
//! - **Metrics**: Prometheus counters fed by the bus through [`PrometheusBusMetrics`]
//!
//! ## Usage
//!
//! ```rust,ignore
//! use composition_telemetry::{init_telemetry, PrometheusBusMetrics, TelemetryConfig};
//!
//! let _guard = init_telemetry(TelemetryConfig::from_env())?;
//! let bus = Bus::builder(channel)
//!     .metrics(Arc::new(PrometheusBusMetrics))
//!     .build()?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SC_CONTEXT` | `main` | Context hosted by this process |
//! | `SC_LOG_LEVEL` | `info` | Log filter when `RUST_LOG` is unset |
//! | `SC_JSON_LOGS` | `false` | JSON lines instead of plain text |

mod config;
mod logging;
mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{
    encode_metrics, register_metrics, PrometheusBusMetrics, BUS_DELIVERED, BUS_DUPLICATES,
    BUS_HANDLER_FAILURES, BUS_PUBLISHED, BUS_PUBLISH_SUPPRESSED, BUS_RECEIVED, BUS_REJECTED,
    REGISTRY,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),
}

/// Register metrics, then install logging.
///
/// Returns a guard to hold for the lifetime of the application.
///
/// # Errors
///
/// See [`register_metrics`] and [`init_logging`].
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    register_metrics()?;
    init_logging(&config)?;

    Ok(TelemetryGuard { config })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    config: TelemetryConfig,
}

impl TelemetryGuard {
    #[must_use]
    pub fn config(&self) -> &TelemetryConfig {
        &self.config
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(context = %self.config.context, "Shutting down telemetry...");
    }
}
