//! # Dispatch Engine
//!
//! Resolves which local subscribers an envelope reaches and invokes them.
//!
//! ```text
//! frame ──► parse/marker ──► self-echo ──► listening ──► plan ──► deliver
//!                                                          │
//!                         levels "a", "a.b", "a.b.c" ◄─────┘
//! ```
//!
//! Planning happens under the registry lock and yields snapshots; delivery
//! runs without any lock held so handlers can re-enter the bus.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use bus_types::{topic, Message, Token};
use serde_json::Value;
use tracing::{debug, error, trace, warn};

use crate::error::BusError;
use crate::metrics::{BusMetrics, RejectReason};
use crate::registry::{Subscriber, TopicRegistry};

/// Arguments accepted by `publish`, resolved once at the API edge.
#[derive(Debug, Clone, PartialEq)]
pub enum PublishArgs {
    /// A topic plus an opaque payload.
    TopicAndData { topic: String, data: Value },
    /// A pre-built object carrying its own `topic` field.
    Envelope(Value),
}

impl PublishArgs {
    /// Turn the arguments into the `data` object of an envelope.
    ///
    /// # Errors
    ///
    /// `BusError::InvalidTopic` for an object form without a string topic.
    pub fn into_message(self) -> Result<Message, BusError> {
        match self {
            Self::TopicAndData { topic, data } => Ok(Message::new(topic, data)),
            Self::Envelope(value) => Ok(Message::from_object(value)?),
        }
    }
}

impl From<Value> for PublishArgs {
    fn from(value: Value) -> Self {
        Self::Envelope(value)
    }
}

impl<T: Into<String>> From<(T, Value)> for PublishArgs {
    fn from((topic, data): (T, Value)) -> Self {
        Self::TopicAndData {
            topic: topic.into(),
            data,
        }
    }
}

/// What happened to the subscribers reached by one envelope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Handlers that ran and returned `Ok`.
    pub delivered: usize,
    /// Subscribers that had already processed this token.
    pub duplicates: usize,
    /// Handlers that returned an error or panicked.
    pub failed: usize,
}

impl DeliveryReport {
    fn absorb(&mut self, other: Self) {
        self.delivered += other.delivered;
        self.duplicates += other.duplicates;
        self.failed += other.failed;
    }

    /// Number of subscribers the envelope reached, whatever the result.
    #[must_use]
    pub fn reached(&self) -> usize {
        self.delivered + self.duplicates + self.failed
    }
}

/// Result of handling one inbound frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Rejected(RejectReason),
    Delivered(DeliveryReport),
}

impl DispatchOutcome {
    #[must_use]
    pub fn report(&self) -> Option<DeliveryReport> {
        match self {
            Self::Delivered(report) => Some(*report),
            Self::Rejected(_) => None,
        }
    }
}

/// Subscribers for one level, with the message as they should see it.
pub(crate) struct Route {
    level: String,
    subscribers: Vec<Arc<Subscriber>>,
    message: Message,
}

/// Work out who receives `message`.
pub(crate) fn plan(registry: &TopicRegistry, message: &Message, hierarchical: bool) -> Vec<Route> {
    let published = message.topic.as_str();
    let mut routes = Vec::new();
    let mut push = |level: &str, seen_as: Message| {
        let subscribers = registry.snapshot(level);
        if !subscribers.is_empty() {
            routes.push(Route {
                level: level.to_string(),
                subscribers,
                message: seen_as,
            });
        }
    };

    if hierarchical {
        for level in topic::levels(published) {
            push(level.level, message.with_topic(level.remainder));
        }
    } else {
        push(published, message.clone());
    }
    routes
}

/// The subscribed level that owns a frame published on `published`.
///
/// With per-topic wiring every matching level has its own hook; only the
/// owner's hook dispatches, so one frame yields one plan. The owner is the
/// coarsest subscribed level, or the exact topic when matching is flat.
pub(crate) fn owning_level<'a>(
    registry: &TopicRegistry,
    published: &'a str,
    hierarchical: bool,
) -> Option<&'a str> {
    if !hierarchical {
        return registry.contains(published).then_some(published);
    }
    topic::levels(published)
        .map(|level| level.level)
        .find(|level| registry.contains(level))
}

/// Invoke every route, isolating handler failures.
pub(crate) fn deliver_routes(
    routes: &[Route],
    token: Option<&Token>,
    metrics: &dyn BusMetrics,
) -> DeliveryReport {
    let mut report = DeliveryReport::default();
    for route in routes {
        report.absorb(deliver(&route.level, &route.subscribers, &route.message, token, metrics));
    }
    report
}

fn deliver(
    level: &str,
    subscribers: &[Arc<Subscriber>],
    message: &Message,
    token: Option<&Token>,
    metrics: &dyn BusMetrics,
) -> DeliveryReport {
    let mut report = DeliveryReport::default();

    for subscriber in subscribers {
        if !subscriber.claim(token) {
            trace!(level, "Token already processed by subscriber");
            report.duplicates += 1;
            metrics.record_duplicate();
            continue;
        }

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            subscriber.handler().handle(message, token)
        }));

        match result {
            Ok(Ok(())) => {
                report.delivered += 1;
                metrics.record_delivered(level);
            }
            Ok(Err(e)) => {
                warn!(level, error = %e, "Handler failed");
                report.failed += 1;
                metrics.record_handler_failure(level);
            }
            Err(payload) => {
                error!(level, panic = panic_message(payload.as_ref()), "Handler panicked");
                report.failed += 1;
                metrics.record_handler_failure(level);
            }
        }
    }

    debug!(
        level,
        delivered = report.delivered,
        duplicates = report.duplicates,
        failed = report.failed,
        "Dispatched"
    );
    report
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}
