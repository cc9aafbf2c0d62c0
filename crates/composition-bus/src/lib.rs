//! # Composition Bus - Publish/Subscribe Between Composed Contexts
//!
//! Lets independently loaded contexts (tiles, panes, workers) exchange
//! topic-addressed messages over a shared broadcast medium without knowing
//! about each other.
//!
//! ## Dispatch Pipeline
//!
//! ```text
//! ┌──────────────┐  publish("a.b.c")  ┌─────────────────┐
//! │  Context A   │ ─────────────────► │ ChannelAdapter  │
//! └──────────────┘                    │ (LocalHub /     │
//!                                     │  broadcast)     │
//!                                     └────────┬────────┘
//!                                              │ frame
//!                                              ▼
//!                                     ┌─────────────────┐
//!                                     │   Context B     │
//!                                     │ marker? origin? │
//!                                     │ listening?      │
//!                                     │ "a" → "b.c"     │
//!                                     │ "a.b" → "c"     │
//!                                     │ "a.b.c" → ""    │
//!                                     └─────────────────┘
//! ```
//!
//! ## Guarantees
//!
//! - **Self-echo suppression:** an instance never handles frames it sent,
//!   unless `notify_self` is configured.
//! - **At-most-once per token:** a subscriber skips a token it has just
//!   processed, so duplicated frames reach it once.
//! - **Failure isolation:** a handler error or panic does not stop
//!   delivery to the remaining subscribers.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod activation;
pub mod bus;
pub mod channel;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod handler;
pub mod metrics;
pub mod registry;

// Re-export main types
pub use bus::{Bus, BusBuilder, BusState};
pub use bus_types::{topic, BusId, Envelope, EnvelopeError, Message, Token, TopicLevel};
pub use channel::{
    BroadcastChannel, BroadcastTransport, ChannelAdapter, HookId, InboundHook, LocalChannel,
    LocalHub,
};
pub use config::{BusConfig, WiringMode};
pub use dispatch::{DeliveryReport, DispatchOutcome, PublishArgs};
pub use error::{BusError, ChannelError, ConfigError, HandlerError};
pub use handler::{handler_fn, same_handler, HandlerRef, LoggingHandler, MessageHandler};
pub use metrics::{BusMetrics, Metrics, MetricsSnapshot, NoOpMetrics, RejectReason};

/// Frames buffered per endpoint on the broadcast transport.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
