//! `tokio::sync::broadcast` backed transport.
//!
//! Each context attaches its own endpoint, which owns one receiver on the
//! shared channel. Frames are pumped into the endpoint's hooks either by
//! the async [`BroadcastChannel::run`] loop or by [`BroadcastChannel::drain`]
//! for callers that drive delivery themselves.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use tracing::{debug, warn};

use super::{ChannelAdapter, HookId, HookSet, InboundHook};
use crate::error::ChannelError;
use crate::DEFAULT_CHANNEL_CAPACITY;

/// The shared broadcast medium. Cheap to clone.
#[derive(Debug, Clone)]
pub struct BroadcastTransport {
    sender: broadcast::Sender<Value>,
    capacity: usize,
}

impl BroadcastTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// # Panics
    ///
    /// Panics if `capacity` is zero, like `tokio::sync::broadcast::channel`.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender, capacity }
    }

    /// Attach a new endpoint. It sees every frame sent after this call.
    #[must_use]
    pub fn attach(&self) -> Arc<BroadcastChannel> {
        Arc::new(BroadcastChannel {
            sender: self.sender.clone(),
            receiver: Mutex::new(Some(self.sender.subscribe())),
            hooks: HookSet::new(),
        })
    }

    /// Send a frame that does not come from any endpoint.
    pub fn inject(&self, frame: Value) -> usize {
        self.sender.send(frame).unwrap_or(0)
    }

    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for BroadcastTransport {
    fn default() -> Self {
        Self::new()
    }
}

/// One context's endpoint on a [`BroadcastTransport`].
pub struct BroadcastChannel {
    sender: broadcast::Sender<Value>,
    /// Taken by `run`; `drain` only works while it is still here.
    receiver: Mutex<Option<broadcast::Receiver<Value>>>,
    hooks: HookSet,
}

impl BroadcastChannel {
    /// Deliver every frame queued for this endpoint. Returns how many.
    pub fn drain(&self) -> usize {
        let frames = {
            let mut guard = self.receiver.lock();
            let Some(receiver) = guard.as_mut() else {
                return 0;
            };
            let mut frames = Vec::new();
            loop {
                match receiver.try_recv() {
                    Ok(frame) => frames.push(frame),
                    Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                        warn!(skipped, "Endpoint lagged, frames dropped");
                    }
                    Err(_) => break,
                }
            }
            frames
        };

        for frame in &frames {
            self.hooks.fire(frame);
        }
        frames.len()
    }

    /// Pump frames into the hooks until the transport closes.
    ///
    /// This should be spawned as a background task.
    pub async fn run(self: Arc<Self>) {
        let Some(receiver) = self.receiver.lock().take() else {
            warn!("Broadcast endpoint is already running");
            return;
        };

        let mut stream = BroadcastStream::new(receiver);
        while let Some(item) = stream.next().await {
            match item {
                Ok(frame) => self.hooks.fire(&frame),
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    warn!(skipped, "Endpoint lagged, frames dropped");
                }
            }
        }
        debug!("Broadcast transport closed");
    }
}

impl ChannelAdapter for BroadcastChannel {
    fn broadcast(&self, frame: Value) -> Result<usize, ChannelError> {
        match self.sender.send(frame) {
            Ok(receivers) => Ok(receivers),
            Err(_) => {
                debug!("Frame dropped, no endpoint is receiving");
                Err(ChannelError::Closed)
            }
        }
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
}

impl std::fmt::Debug for BroadcastChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BroadcastChannel")
            .field("hooks", &self.hooks.len())
            .field("running", &self.receiver.lock().is_none())
            .finish()
    }
}
