//! # Error Types
//!
//! Errors raised while building or validating wire envelopes.

use thiserror::Error;

/// Errors related to envelope shape and publish arguments.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EnvelopeError {
    /// The frame has no string `type` marker.
    #[error("Frame carries no type marker")]
    MissingType,

    /// The frame belongs to another protocol sharing the transport.
    #[error("Foreign type marker: {found}")]
    ForeignMarker { found: String },

    /// The marker matched but the rest of the frame does not deserialize.
    #[error("Malformed envelope: {0}")]
    Malformed(String),

    /// An object-form publish did not carry a string `topic`.
    #[error("Invalid topic: expected a string, found {found}")]
    InvalidTopic { found: String },
}
