//! Metrics hooks for bus operations
//!
//! The bus reports what it does through [`BusMetrics`]. Every method has a
//! no-op default so implementations only override what they export.
//!
//! ## Usage
//!
//! ```ignore
//! use composition_bus::{Bus, Metrics};
//! use std::sync::Arc;
//!
//! let metrics = Arc::new(Metrics::new());
//! let bus = Bus::builder(channel).metrics(metrics.clone()).build()?;
//! // ...
//! let snapshot = metrics.snapshot();
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

/// Why an inbound frame did not reach any handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectReason {
    /// Not a bus envelope, or a bus envelope with a broken shape.
    Malformed,
    /// Bus envelope of another namespace.
    ForeignMarker,
    /// Sent by this very instance.
    SelfEcho,
    /// The instance is not listening.
    NotListening,
    /// Nobody here subscribes to the topic.
    NoSubscribers,
}

impl RejectReason {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Malformed => "malformed",
            Self::ForeignMarker => "foreign_marker",
            Self::SelfEcho => "self_echo",
            Self::NotListening => "not_listening",
            Self::NoSubscribers => "no_subscribers",
        }
    }
}

/// Instrumentation points of the bus.
pub trait BusMetrics: Send + Sync {
    /// An envelope was handed to the channel adapter.
    fn record_published(&self, _topic: &str) {}

    /// `publish` was called while publishing was off.
    fn record_publish_suppressed(&self) {}

    /// A frame reached the inbound handler.
    fn record_received(&self) {}

    /// A frame was dropped before any handler ran.
    fn record_rejected(&self, _reason: RejectReason) {}

    /// A handler ran successfully.
    fn record_delivered(&self, _topic: &str) {}

    /// A subscriber skipped a token it had already processed.
    fn record_duplicate(&self) {}

    /// A handler returned an error or panicked.
    fn record_handler_failure(&self, _topic: &str) {}
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpMetrics;

impl BusMetrics for NoOpMetrics {}

/// In-process atomic counters.
#[derive(Debug, Default)]
pub struct Metrics {
    pub published: AtomicU64,
    pub publish_suppressed: AtomicU64,
    pub received: AtomicU64,
    pub rejected: AtomicU64,
    pub self_echoes: AtomicU64,
    pub delivered: AtomicU64,
    pub duplicates: AtomicU64,
    pub handler_failures: AtomicU64,
}

impl Metrics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get current metrics snapshot
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            published: self.published.load(Ordering::Relaxed),
            publish_suppressed: self.publish_suppressed.load(Ordering::Relaxed),
            received: self.received.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            self_echoes: self.self_echoes.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            duplicates: self.duplicates.load(Ordering::Relaxed),
            handler_failures: self.handler_failures.load(Ordering::Relaxed),
        }
    }
}

impl BusMetrics for Metrics {
    fn record_published(&self, _topic: &str) {
        self.published.fetch_add(1, Ordering::Relaxed);
    }

    fn record_publish_suppressed(&self) {
        self.publish_suppressed.fetch_add(1, Ordering::Relaxed);
    }

    fn record_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    fn record_rejected(&self, reason: RejectReason) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
        if reason == RejectReason::SelfEcho {
            self.self_echoes.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn record_delivered(&self, _topic: &str) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    fn record_duplicate(&self) {
        self.duplicates.fetch_add(1, Ordering::Relaxed);
    }

    fn record_handler_failure(&self, _topic: &str) {
        self.handler_failures.fetch_add(1, Ordering::Relaxed);
    }
}

/// Point-in-time copy of [`Metrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub published: u64,
    pub publish_suppressed: u64,
    pub received: u64,
    pub rejected: u64,
    pub self_echoes: u64,
    pub delivered: u64,
    pub duplicates: u64,
    pub handler_failures: u64,
}
