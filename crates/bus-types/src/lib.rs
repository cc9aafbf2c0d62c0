//! # Bus Types Crate
//!
//! Types shared by every participant of the composition bus: identities,
//! topic arithmetic and the wire envelope.
//!
//! ## Design Principles
//!
//! - **Transport-neutral**: envelopes encode to `serde_json::Value` so any
//!   channel that can move JSON can carry them.
//! - **Opaque payloads**: only `data.topic` is ever interpreted.

pub mod envelope;
pub mod errors;
pub mod identity;
pub mod topic;

pub use envelope::{Envelope, Message};
pub use errors::EnvelopeError;
pub use identity::{BusId, Token};
pub use topic::TopicLevel;

/// Namespace used when none is configured.
pub const DEFAULT_NAMESPACE: &str = "SmartComposition";
