//! Error types for the composition bus

use bus_types::EnvelopeError;
use thiserror::Error;

/// Errors surfaced to callers of the bus API.
///
/// Routine misuse (empty topics, unknown handlers) is never an error; only
/// structurally invalid publish arguments and transport failures are.
#[derive(Debug, Error)]
pub enum BusError {
    #[error("Invalid topic: expected a string, found {found}")]
    InvalidTopic { found: String },

    #[error("Payload could not be encoded: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid envelope: {0}")]
    Envelope(EnvelopeError),
}

impl From<EnvelopeError> for BusError {
    fn from(err: EnvelopeError) -> Self {
        match err {
            EnvelopeError::InvalidTopic { found } => Self::InvalidTopic { found },
            other => Self::Envelope(other),
        }
    }
}

/// Errors from a channel adapter.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChannelError {
    /// No endpoint is left to receive frames.
    #[error("Channel closed")]
    Closed,
}

/// Configuration validation errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Namespace must not be empty")]
    EmptyNamespace,

    #[error("Namespace {0:?} must not contain whitespace or '.'")]
    InvalidNamespace(String),

    #[error("Channel capacity must be greater than zero")]
    ZeroCapacity,

    #[error("Unknown wiring mode: {0}")]
    UnknownWiring(String),
}

/// Failure reported by a subscriber's handler.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct HandlerError(pub String);

impl From<&str> for HandlerError {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for HandlerError {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(value: serde_json::Error) -> Self {
        Self(value.to_string())
    }
}
