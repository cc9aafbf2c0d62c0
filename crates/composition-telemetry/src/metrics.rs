//! Prometheus metrics for the composition bus.
//!
//! All metrics follow the naming convention: `sc_<component>_<metric>_total`

use composition_bus::{BusMetrics, RejectReason};
use lazy_static::lazy_static;
use prometheus::{Counter, CounterVec, Encoder, Opts, Registry, TextEncoder};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // PUBLISH SIDE
    // =========================================================================

    /// Envelopes handed to the channel adapter
    pub static ref BUS_PUBLISHED: Counter = Counter::new(
        "sc_bus_published_total",
        "Envelopes broadcast by this process"
    ).expect("metric creation failed");

    /// Publish calls dropped because publishing was off
    pub static ref BUS_PUBLISH_SUPPRESSED: Counter = Counter::new(
        "sc_bus_publish_suppressed_total",
        "Publish calls ignored while publishing was disabled"
    ).expect("metric creation failed");

    // =========================================================================
    // RECEIVE SIDE
    // =========================================================================

    /// Frames seen by an inbound hook
    pub static ref BUS_RECEIVED: Counter = Counter::new(
        "sc_bus_received_total",
        "Bus frames that reached an inbound hook"
    ).expect("metric creation failed");

    /// Frames dropped before dispatch, by reason
    pub static ref BUS_REJECTED: CounterVec = CounterVec::new(
        Opts::new("sc_bus_rejected_total", "Frames dropped before any handler ran"),
        &["reason"]  // malformed, foreign_marker, self_echo, not_listening, no_subscribers
    ).expect("metric creation failed");

    /// Successful handler invocations
    pub static ref BUS_DELIVERED: Counter = Counter::new(
        "sc_bus_delivered_total",
        "Handler invocations that returned Ok"
    ).expect("metric creation failed");

    /// Deliveries skipped because the subscriber already saw the token
    pub static ref BUS_DUPLICATES: Counter = Counter::new(
        "sc_bus_duplicates_total",
        "Deliveries skipped by token de-duplication"
    ).expect("metric creation failed");

    /// Handler errors and panics
    pub static ref BUS_HANDLER_FAILURES: Counter = Counter::new(
        "sc_bus_handler_failures_total",
        "Handler invocations that failed or panicked"
    ).expect("metric creation failed");
}

/// Register all metrics with the global registry.
///
/// Safe to call more than once.
///
/// # Errors
///
/// `MetricsInit` for any registry error other than a repeated registration.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(BUS_PUBLISHED.clone()),
        Box::new(BUS_PUBLISH_SUPPRESSED.clone()),
        Box::new(BUS_RECEIVED.clone()),
        Box::new(BUS_REJECTED.clone()),
        Box::new(BUS_DELIVERED.clone()),
        Box::new(BUS_DUPLICATES.clone()),
        Box::new(BUS_HANDLER_FAILURES.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }
    Ok(())
}

/// Encode all metrics as Prometheus text format.
///
/// # Errors
///
/// `MetricsInit` if encoding fails.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// [`BusMetrics`] backed by the global Prometheus counters.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrometheusBusMetrics;

impl BusMetrics for PrometheusBusMetrics {
    fn record_published(&self, _topic: &str) {
        BUS_PUBLISHED.inc();
    }

    fn record_publish_suppressed(&self) {
        BUS_PUBLISH_SUPPRESSED.inc();
    }

    fn record_received(&self) {
        BUS_RECEIVED.inc();
    }

    fn record_rejected(&self, reason: RejectReason) {
        BUS_REJECTED.with_label_values(&[reason.as_str()]).inc();
    }

    fn record_delivered(&self, _topic: &str) {
        BUS_DELIVERED.inc();
    }

    fn record_duplicate(&self) {
        BUS_DUPLICATES.inc();
    }

    fn record_handler_failure(&self, _topic: &str) {
        BUS_HANDLER_FAILURES.inc();
    }
}
