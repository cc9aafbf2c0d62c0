//! # Message Handlers
//!
//! Subscribers are `Arc<dyn MessageHandler>`. Handler identity is pointer
//! identity of the `Arc`, which is what makes "subscribe the same handler
//! twice" detectable and lets `unsubscribe` find the entry again.

use std::sync::Arc;

use bus_types::{Message, Token};
use tracing::info;

use crate::error::HandlerError;

/// Something that reacts to messages on a topic.
pub trait MessageHandler: Send + Sync {
    /// Handle one delivery. `message.topic` is the remainder below the
    /// subscribed level.
    fn handle(&self, message: &Message, token: Option<&Token>) -> Result<(), HandlerError>;
}

impl<F> MessageHandler for F
where
    F: Fn(&Message, Option<&Token>) -> Result<(), HandlerError> + Send + Sync,
{
    fn handle(&self, message: &Message, token: Option<&Token>) -> Result<(), HandlerError> {
        self(message, token)
    }
}

/// Shared handle to a handler.
pub type HandlerRef = Arc<dyn MessageHandler>;

/// Wrap a closure as a `HandlerRef`.
pub fn handler_fn<F>(f: F) -> HandlerRef
where
    F: Fn(&Message, Option<&Token>) -> Result<(), HandlerError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Whether two handles point at the same handler.
#[must_use]
pub fn same_handler(a: &HandlerRef, b: &HandlerRef) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// Fallback used when `subscribe` is called without a handler.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

impl MessageHandler for LoggingHandler {
    fn handle(&self, message: &Message, token: Option<&Token>) -> Result<(), HandlerError> {
        info!(
            topic = %message.topic,
            token = token.map(Token::as_str).unwrap_or_default(),
            fields = ?message.fields,
            "Received message"
        );
        Ok(())
    }
}
