//! # Topic Registry
//!
//! Per-instance mapping from topic to its ordered subscriber list. The
//! registry is the only place subscription state is mutated; dispatch works
//! on snapshots so handlers may subscribe or unsubscribe mid-delivery.

use std::collections::HashMap;
use std::sync::Arc;

use bus_types::{topic, Token};
use parking_lot::Mutex;

use crate::handler::{same_handler, HandlerRef};

/// One handler registered on one topic.
pub struct Subscriber {
    handler: HandlerRef,

    /// Token of the most recent message this subscriber processed.
    last_token: Mutex<Option<Token>>,
}

impl Subscriber {
    fn new(handler: HandlerRef) -> Self {
        Self {
            handler,
            last_token: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn handler(&self) -> &HandlerRef {
        &self.handler
    }

    /// Claim delivery of `token` for this subscriber.
    ///
    /// Returns `false` when the same token was the last one processed.
    /// Missing tokens are never de-duplicated.
    pub fn claim(&self, token: Option<&Token>) -> bool {
        let mut last = self.last_token.lock();
        match (last.as_ref(), token) {
            (Some(seen), Some(incoming)) if seen == incoming => false,
            (_, incoming) => {
                *last = incoming.cloned();
                true
            }
        }
    }

    #[must_use]
    pub fn last_token(&self) -> Option<Token> {
        self.last_token.lock().clone()
    }
}

impl std::fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscriber")
            .field("last_token", &*self.last_token.lock())
            .finish_non_exhaustive()
    }
}

/// Result of a registry mutation, used to drive per-topic wiring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryChange {
    /// Empty topic; nothing happened.
    Ignored,
    /// The pair already existed.
    Duplicate,
    /// A subscriber was added. `first` is set when the topic was new.
    Added { first: bool },
    /// A subscriber was removed. `last` is set when the topic is now gone.
    Removed { last: bool },
    /// No matching subscriber.
    NotFound,
}

/// Topic to subscriber list.
#[derive(Debug, Default)]
pub struct TopicRegistry {
    topics: HashMap<String, Vec<Arc<Subscriber>>>,
}

impl TopicRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `topic`, at most once per pair.
    pub fn subscribe(&mut self, topic: &str, handler: HandlerRef) -> RegistryChange {
        if !topic::is_valid(topic) {
            return RegistryChange::Ignored;
        }

        let first = !self.topics.contains_key(topic);
        let subscribers = self.topics.entry(topic.to_string()).or_default();
        if subscribers
            .iter()
            .any(|s| same_handler(s.handler(), &handler))
        {
            return RegistryChange::Duplicate;
        }

        subscribers.push(Arc::new(Subscriber::new(handler)));
        RegistryChange::Added { first }
    }

    /// Remove the first entry for `(topic, handler)`.
    pub fn unsubscribe(&mut self, topic: &str, handler: &HandlerRef) -> RegistryChange {
        if !topic::is_valid(topic) {
            return RegistryChange::Ignored;
        }
        let Some(subscribers) = self.topics.get_mut(topic) else {
            return RegistryChange::NotFound;
        };
        let Some(index) = subscribers
            .iter()
            .position(|s| same_handler(s.handler(), handler))
        else {
            return RegistryChange::NotFound;
        };

        subscribers.remove(index);
        let last = subscribers.is_empty();
        if last {
            self.topics.remove(topic);
        }
        RegistryChange::Removed { last }
    }

    /// Stable copy of the subscribers for `topic`, in registration order.
    #[must_use]
    pub fn snapshot(&self, topic: &str) -> Vec<Arc<Subscriber>> {
        self.topics.get(topic).cloned().unwrap_or_default()
    }

    /// Topics with at least one subscriber.
    #[must_use]
    pub fn topics(&self) -> Vec<String> {
        let mut topics: Vec<String> = self.topics.keys().cloned().collect();
        topics.sort();
        topics
    }

    #[must_use]
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.topics.get(topic).map_or(0, Vec::len)
    }

    #[must_use]
    pub fn contains(&self, topic: &str) -> bool {
        self.topics.contains_key(topic)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }
}
