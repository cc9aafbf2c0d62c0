//! # Activation Controller
//!
//! Owns the hooks a bus instance has attached to its channel adapter.
//! In `Global` mode there is a single hook; in `PerTopic` mode there is one
//! per subscribed topic, so the number of live hooks tracks the number of
//! topics in use.

use std::collections::HashMap;

use tracing::debug;

use crate::channel::{ChannelAdapter, HookId, InboundHook};
use crate::config::WiringMode;

/// Hook wiring state of one bus instance.
#[derive(Debug)]
pub struct Activation {
    mode: WiringMode,
    active: bool,
    ever_active: bool,
    global: Option<HookId>,
    per_topic: HashMap<String, HookId>,
}

impl Activation {
    #[must_use]
    pub fn new(mode: WiringMode) -> Self {
        Self {
            mode,
            active: false,
            ever_active: false,
            global: None,
            per_topic: HashMap::new(),
        }
    }

    /// Wire the instance. `make_hook(None)` builds the global hook,
    /// `make_hook(Some(topic))` a topic-scoped one. The topic set is
    /// re-derived from `topics` on every activation.
    pub fn activate<F>(&mut self, adapter: &dyn ChannelAdapter, topics: &[String], make_hook: F)
    where
        F: Fn(Option<&str>) -> InboundHook,
    {
        if self.active {
            return;
        }
        self.active = true;
        self.ever_active = true;

        match self.mode {
            WiringMode::Global => {
                self.global = Some(adapter.on_receive(make_hook(None)));
            }
            WiringMode::PerTopic => {
                for topic in topics {
                    self.wire(adapter, topic, &make_hook);
                }
            }
        }
        debug!(mode = ?self.mode, hooks = self.wired_hooks(), "Listener activated");
    }

    /// Remove every hook this instance attached.
    pub fn deactivate(&mut self, adapter: &dyn ChannelAdapter) {
        if !self.active {
            return;
        }
        self.active = false;

        if let Some(id) = self.global.take() {
            adapter.remove_hook(id);
        }
        for (_, id) in self.per_topic.drain() {
            adapter.remove_hook(id);
        }
        debug!(mode = ?self.mode, "Listener deactivated");
    }

    /// First subscriber for `topic` arrived.
    pub fn topic_added<F>(&mut self, adapter: &dyn ChannelAdapter, topic: &str, make_hook: F)
    where
        F: Fn(Option<&str>) -> InboundHook,
    {
        if self.active && self.mode == WiringMode::PerTopic {
            self.wire(adapter, topic, &make_hook);
        }
    }

    /// Last subscriber for `topic` left.
    pub fn topic_removed(&mut self, adapter: &dyn ChannelAdapter, topic: &str) {
        if self.mode != WiringMode::PerTopic {
            return;
        }
        if let Some(id) = self.per_topic.remove(topic) {
            adapter.remove_hook(id);
            debug!(topic, "Topic unwired");
        }
    }

    fn wire<F>(&mut self, adapter: &dyn ChannelAdapter, topic: &str, make_hook: &F)
    where
        F: Fn(Option<&str>) -> InboundHook,
    {
        if self.per_topic.contains_key(topic) {
            return;
        }
        let id = adapter.on_receive(make_hook(Some(topic)));
        self.per_topic.insert(topic.to_string(), id);
        debug!(topic, "Topic wired");
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whether the instance has ever been activated.
    #[must_use]
    pub fn ever_active(&self) -> bool {
        self.ever_active
    }

    #[must_use]
    pub fn mode(&self) -> WiringMode {
        self.mode
    }

    #[must_use]
    pub fn wired_hooks(&self) -> usize {
        usize::from(self.global.is_some()) + self.per_topic.len()
    }

    #[must_use]
    pub fn is_wired(&self, topic: &str) -> bool {
        self.per_topic.contains_key(topic)
    }
}
