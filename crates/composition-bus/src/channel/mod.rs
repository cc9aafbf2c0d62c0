//! # Channel Adapters
//!
//! The only code that touches a transport. An adapter moves raw JSON frames
//! and fires inbound hooks; it knows nothing about topics, tokens or origins.
//!
//! - [`LocalHub`] / [`LocalChannel`]: same-process synchronous emitter
//! - [`BroadcastTransport`] / [`BroadcastChannel`]: `tokio::sync::broadcast`

mod broadcast;
mod local;

pub use broadcast::{BroadcastChannel, BroadcastTransport};
pub use local::{LocalChannel, LocalHub};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

use crate::error::ChannelError;

/// Callback invoked for every inbound frame.
pub type InboundHook = Arc<dyn Fn(&Value) + Send + Sync>;

/// Handle returned by [`ChannelAdapter::on_receive`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HookId(u64);

/// Transport-facing seam of the bus.
pub trait ChannelAdapter: Send + Sync {
    /// Push a frame onto the shared transport.
    ///
    /// Returns how many endpoints the transport handed the frame to.
    fn broadcast(&self, frame: Value) -> Result<usize, ChannelError>;

    /// Attach an inbound hook.
    fn on_receive(&self, hook: InboundHook) -> HookId;

    /// Detach a hook. Returns whether it was attached.
    fn remove_hook(&self, id: HookId) -> bool;

    /// Number of attached hooks.
    fn hook_count(&self) -> usize;

    /// Whether a frame broadcast from this endpoint also reaches its own hooks.
    fn loops_back(&self) -> bool {
        true
    }
}

/// Hook list shared by the adapters.
///
/// `fire` invokes a snapshot so hooks may attach or detach hooks, or
/// broadcast again, while being invoked.
#[derive(Default)]
pub struct HookSet {
    hooks: Mutex<Vec<(HookId, InboundHook)>>,
    next_id: AtomicU64,
}

impl HookSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, hook: InboundHook) -> HookId {
        let id = HookId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.hooks.lock().push((id, hook));
        id
    }

    pub fn remove(&self, id: HookId) -> bool {
        let mut hooks = self.hooks.lock();
        let before = hooks.len();
        hooks.retain(|(hook_id, _)| *hook_id != id);
        hooks.len() != before
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.hooks.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invoke every hook attached at the time of the call.
    pub fn fire(&self, frame: &Value) {
        let snapshot: Vec<InboundHook> = self
            .hooks
            .lock()
            .iter()
            .map(|(_, hook)| Arc::clone(hook))
            .collect();
        for hook in snapshot {
            hook(frame);
        }
    }
}

impl std::fmt::Debug for HookSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookSet").field("hooks", &self.len()).finish()
    }
}
