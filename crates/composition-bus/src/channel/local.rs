//! Same-process synchronous transport.
//!
//! A [`LocalHub`] plays the role of the shared window: every endpoint
//! attached to it sees every frame, delivered synchronously inside
//! `broadcast` before it returns.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde_json::Value;
use tracing::trace;

use super::{ChannelAdapter, HookId, HookSet, InboundHook};
use crate::error::ChannelError;

/// Shared medium that endpoints attach to.
#[derive(Debug, Clone, Default)]
pub struct LocalHub {
    endpoints: Arc<Mutex<Vec<Weak<LocalChannel>>>>,
}

impl LocalHub {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// New endpoint whose own broadcasts reach its own hooks.
    #[must_use]
    pub fn endpoint(&self) -> Arc<LocalChannel> {
        self.attach(true)
    }

    /// New endpoint that is never notified of its own broadcasts.
    #[must_use]
    pub fn endpoint_without_loopback(&self) -> Arc<LocalChannel> {
        self.attach(false)
    }

    fn attach(&self, loopback: bool) -> Arc<LocalChannel> {
        let channel = Arc::new(LocalChannel {
            hub: self.clone(),
            hooks: HookSet::new(),
            loopback,
        });
        self.endpoints.lock().push(Arc::downgrade(&channel));
        channel
    }

    /// Live endpoints.
    #[must_use]
    pub fn endpoint_count(&self) -> usize {
        self.live().len()
    }

    /// Push a frame from outside any endpoint (e.g. an unrelated script
    /// sharing the medium). Every endpoint sees it.
    pub fn inject(&self, frame: &Value) -> usize {
        self.deliver(frame, None)
    }

    fn live(&self) -> Vec<Arc<LocalChannel>> {
        let mut endpoints = self.endpoints.lock();
        endpoints.retain(|weak| weak.strong_count() > 0);
        endpoints.iter().filter_map(Weak::upgrade).collect()
    }

    fn deliver(&self, frame: &Value, sender: Option<&LocalChannel>) -> usize {
        let mut reached = 0;
        for endpoint in self.live() {
            let is_sender = sender.is_some_and(|s| std::ptr::eq(s, endpoint.as_ref()));
            if is_sender && !endpoint.loopback {
                continue;
            }
            endpoint.hooks.fire(frame);
            reached += 1;
        }
        reached
    }
}

/// One context's endpoint on a [`LocalHub`].
#[derive(Debug)]
pub struct LocalChannel {
    hub: LocalHub,
    hooks: HookSet,
    loopback: bool,
}

impl LocalChannel {
    #[must_use]
    pub fn hub(&self) -> &LocalHub {
        &self.hub
    }
}

impl ChannelAdapter for LocalChannel {
    fn broadcast(&self, frame: Value) -> Result<usize, ChannelError> {
        let reached = self.hub.deliver(&frame, Some(self));
        trace!(reached, "Local frame delivered");
        Ok(reached)
    }

    fn on_receive(&self, hook: InboundHook) -> HookId {
        self.hooks.add(hook)
    }

    fn remove_hook(&self, id: HookId) -> bool {
        self.hooks.remove(id)
    }

    fn hook_count(&self) -> usize {
        self.hooks.len()
    }

    fn loops_back(&self) -> bool {
        self.loopback
    }
}
