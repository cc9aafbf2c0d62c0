//! # Bus Instance
//!
//! One participant's view of the bus: its identity, its topic registry,
//! its listening/publishing flags and the hooks it has attached to its
//! channel adapter.
//!
//! ```text
//! Uninitialized ──build──► Initialized ──activate──► Listening
//!                                                     ▲     │
//!                                          activate   │     │ deactivate
//!                                                     │     ▼
//!                                                  NotListening
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock, Weak};

use bus_types::{topic, BusId, Envelope, EnvelopeError, Token};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, trace};

use crate::activation::Activation;
use crate::channel::{ChannelAdapter, InboundHook};
use crate::config::BusConfig;
use crate::dispatch::{self, DispatchOutcome, PublishArgs};
use crate::error::BusError;
use crate::handler::{handler_fn, HandlerRef, LoggingHandler};
use crate::metrics::{BusMetrics, NoOpMetrics, RejectReason};
use crate::registry::{RegistryChange, TopicRegistry};
use crate::{HandlerError, Message};

/// Lifecycle state of a bus instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusState {
    /// Built, never activated.
    Initialized,
    /// Hooks attached and listening flag set.
    Listening,
    /// Deactivated, or the listening flag is off.
    NotListening,
}

/// Builder for [`Bus`].
pub struct BusBuilder {
    adapter: Arc<dyn ChannelAdapter>,
    config: BusConfig,
    metrics: Option<Arc<dyn BusMetrics>>,
    default_handler: Option<HandlerRef>,
}

impl BusBuilder {
    #[must_use]
    pub fn config(mut self, config: BusConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn metrics(mut self, metrics: Arc<dyn BusMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Handler used when `subscribe` is called without one.
    #[must_use]
    pub fn default_handler(mut self, handler: HandlerRef) -> Self {
        self.default_handler = Some(handler);
        self
    }

    /// # Errors
    ///
    /// `BusError::Config` when the configuration does not validate.
    pub fn build(self) -> Result<Bus, BusError> {
        self.config.validate()?;

        let inner = BusInner {
            marker: self.config.marker(),
            identity: OnceLock::new(),
            registry: RwLock::new(TopicRegistry::new()),
            activation: Mutex::new(Activation::new(self.config.wiring)),
            listening: AtomicBool::new(false),
            publishing: AtomicBool::new(self.config.publishing),
            default_handler: self
                .default_handler
                .unwrap_or_else(|| Arc::new(LoggingHandler)),
            metrics: self.metrics.unwrap_or_else(|| Arc::new(NoOpMetrics)),
            adapter: self.adapter,
            config: self.config,
        };
        Ok(Bus {
            inner: Arc::new(inner),
        })
    }
}

/// Handle to a bus instance. Clones share the same instance.
#[derive(Clone)]
pub struct Bus {
    inner: Arc<BusInner>,
}

struct BusInner {
    config: BusConfig,
    marker: String,
    identity: OnceLock<BusId>,
    adapter: Arc<dyn ChannelAdapter>,
    registry: RwLock<TopicRegistry>,
    activation: Mutex<Activation>,
    listening: AtomicBool,
    publishing: AtomicBool,
    default_handler: HandlerRef,
    metrics: Arc<dyn BusMetrics>,
}

impl Bus {
    /// Start building a bus on `adapter` with default configuration.
    pub fn builder(adapter: Arc<dyn ChannelAdapter>) -> BusBuilder {
        BusBuilder {
            adapter,
            config: BusConfig::default(),
            metrics: None,
            default_handler: None,
        }
    }

    /// Build a bus with `config` and no metrics.
    ///
    /// # Errors
    ///
    /// `BusError::Config` when the configuration does not validate.
    pub fn new(config: BusConfig, adapter: Arc<dyn ChannelAdapter>) -> Result<Self, BusError> {
        Self::builder(adapter).config(config).build()
    }

    /// Make sure the identity exists. Calling it again changes nothing.
    pub fn init(&self) -> &Self {
        let _ = self.id();
        self
    }

    /// The instance id, generated on first use.
    pub fn id(&self) -> &BusId {
        self.inner.id()
    }

    // =========================================================================
    // TOPIC REGISTRY
    // =========================================================================

    /// Register `handler` (or the default handler) under `topic`.
    ///
    /// Empty topics and repeated `(topic, handler)` pairs are ignored.
    pub fn subscribe(&self, topic: &str, handler: Option<&HandlerRef>) -> &Self {
        let handler = handler
            .cloned()
            .unwrap_or_else(|| self.inner.default_handler.clone());

        let mut activation = self.inner.activation.lock();
        let change = self.inner.registry.write().subscribe(topic, handler);
        if change == (RegistryChange::Added { first: true }) {
            activation.topic_added(self.inner.adapter.as_ref(), topic, |scope| {
                BusInner::hook(&self.inner, scope)
            });
        }
        drop(activation);

        debug!(bus_id = %self.id(), topic, change = ?change, "Subscribe");
        self
    }

    /// Remove the first `(topic, handler)` entry. Unknown pairs are ignored.
    pub fn unsubscribe(&self, topic: &str, handler: Option<&HandlerRef>) -> &Self {
        let handler = handler
            .cloned()
            .unwrap_or_else(|| self.inner.default_handler.clone());

        let mut activation = self.inner.activation.lock();
        let change = self.inner.registry.write().unsubscribe(topic, &handler);
        if change == (RegistryChange::Removed { last: true }) {
            activation.topic_removed(self.inner.adapter.as_ref(), topic);
        }
        drop(activation);

        debug!(bus_id = %self.id(), topic, change = ?change, "Unsubscribe");
        self
    }

    /// Subscribe a closure and return its handle for a later `unsubscribe`.
    pub fn on<F>(&self, topic: &str, f: F) -> HandlerRef
    where
        F: Fn(&Message, Option<&Token>) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        let handler = handler_fn(f);
        self.subscribe(topic, Some(&handler));
        handler
    }

    // =========================================================================
    // PUBLISHING
    // =========================================================================

    /// Publish `data` on `topic`.
    ///
    /// Returns the token used, or `None` when nothing was sent (empty topic
    /// or publishing switched off).
    ///
    /// # Errors
    ///
    /// `Serialization` if `data` cannot become JSON, `Channel` if the
    /// transport refuses the frame.
    pub fn publish<T: Serialize>(&self, topic: &str, data: T) -> Result<Option<Token>, BusError> {
        let data = serde_json::to_value(data)?;
        self.publish_with((topic, data), None)
    }

    /// Publish either form of [`PublishArgs`], optionally reusing a token.
    ///
    /// # Errors
    ///
    /// `InvalidTopic` when an object form carries no string topic, plus the
    /// errors of [`Bus::publish`].
    pub fn publish_with(
        &self,
        args: impl Into<PublishArgs>,
        token: Option<Token>,
    ) -> Result<Option<Token>, BusError> {
        let message = args.into().into_message()?;
        if !topic::is_valid(&message.topic) {
            trace!("Publish with empty topic ignored");
            return Ok(None);
        }
        if !self.is_publishing() {
            debug!(bus_id = %self.id(), topic = %message.topic, "Publishing disabled, message dropped");
            self.inner.metrics.record_publish_suppressed();
            return Ok(None);
        }

        let token = token
            .filter(|t| !t.is_empty())
            .unwrap_or_else(Token::generate);
        let envelope = Envelope::new(
            self.inner.marker.clone(),
            self.id().clone(),
            token.clone(),
            message,
        );

        let reached = self.inner.adapter.broadcast(envelope.to_value()?)?;
        self.inner.metrics.record_published(envelope.topic());
        debug!(
            bus_id = %self.id(),
            topic = %envelope.topic(),
            token = %token,
            reached,
            "Published"
        );

        if self.inner.config.notify_self {
            self.inner.dispatch_local(&envelope);
        }
        Ok(Some(token))
    }

    // =========================================================================
    // INBOUND
    // =========================================================================

    /// Handle one raw frame as the global inbound hook would.
    pub fn receive(&self, frame: &Value) -> DispatchOutcome {
        self.inner.handle_frame(frame, None)
    }

    // =========================================================================
    // ACTIVATION & FLAGS
    // =========================================================================

    /// Attach hooks to the adapter and start listening.
    pub fn activate_listener(&self) -> &Self {
        let mut activation = self.inner.activation.lock();
        let topics = self.inner.registry.read().topics();
        activation.activate(self.inner.adapter.as_ref(), &topics, |scope| {
            BusInner::hook(&self.inner, scope)
        });
        drop(activation);

        self.inner.listening.store(true, Ordering::SeqCst);
        self
    }

    /// Detach every hook and stop listening. Subscriptions are kept.
    pub fn deactivate_listener(&self) -> &Self {
        self.inner.listening.store(false, Ordering::SeqCst);
        self.inner
            .activation
            .lock()
            .deactivate(self.inner.adapter.as_ref());
        self
    }

    /// Toggle listening without touching hooks.
    pub fn set_listening(&self, listening: bool) -> &Self {
        self.inner.listening.store(listening, Ordering::SeqCst);
        self
    }

    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.inner.listening.load(Ordering::SeqCst)
    }

    /// Toggle publishing. While off, `publish` sends nothing.
    pub fn set_publishing(&self, publishing: bool) -> &Self {
        self.inner.publishing.store(publishing, Ordering::SeqCst);
        self
    }

    #[must_use]
    pub fn is_publishing(&self) -> bool {
        self.inner.publishing.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn state(&self) -> BusState {
        let activation = self.inner.activation.lock();
        if !activation.ever_active() {
            BusState::Initialized
        } else if activation.is_active() && self.is_listening() {
            BusState::Listening
        } else {
            BusState::NotListening
        }
    }

    // =========================================================================
    // INTROSPECTION
    // =========================================================================

    /// Topics with at least one local subscriber.
    #[must_use]
    pub fn topics(&self) -> Vec<String> {
        self.inner.registry.read().topics()
    }

    #[must_use]
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.inner.registry.read().subscriber_count(topic)
    }

    /// Hooks this instance currently has on its adapter.
    #[must_use]
    pub fn wired_hooks(&self) -> usize {
        self.inner.activation.lock().wired_hooks()
    }

    #[must_use]
    pub fn config(&self) -> &BusConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn adapter(&self) -> &Arc<dyn ChannelAdapter> {
        &self.inner.adapter
    }
}

impl std::fmt::Debug for Bus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bus")
            .field("id", self.id())
            .field("listening", &self.is_listening())
            .field("publishing", &self.is_publishing())
            .field("topics", &self.topics())
            .finish()
    }
}

impl BusInner {
    fn id(&self) -> &BusId {
        self.identity
            .get_or_init(|| BusId::generate(&self.config.namespace))
    }

    /// Inbound hook holding only a weak reference to the instance.
    fn hook(this: &Arc<Self>, scope: Option<&str>) -> InboundHook {
        let weak: Weak<Self> = Arc::downgrade(this);
        let scope = scope.map(str::to_string);
        Arc::new(move |frame: &Value| {
            if let Some(inner) = weak.upgrade() {
                inner.handle_frame(frame, scope.as_deref());
            }
        })
    }

    fn handle_frame(&self, frame: &Value, scope: Option<&str>) -> DispatchOutcome {
        let envelope = match Envelope::parse(frame, &self.marker) {
            Ok(envelope) => envelope,
            Err(EnvelopeError::ForeignMarker { found }) => {
                trace!(marker = %found, "Foreign frame ignored");
                return self.reject(RejectReason::ForeignMarker);
            }
            Err(e) => {
                trace!(error = %e, "Malformed frame ignored");
                return self.reject(RejectReason::Malformed);
            }
        };

        // Of the topic-scoped hooks a frame matches, only the owner goes on.
        if let Some(level) = scope {
            let owner = {
                let registry = self.registry.read();
                dispatch::owning_level(&registry, envelope.topic(), self.config.hierarchical)
                    .map(str::to_string)
            };
            if owner.as_deref() != Some(level) {
                return DispatchOutcome::Rejected(RejectReason::NoSubscribers);
            }
        }

        self.metrics.record_received();

        if envelope.origin.as_ref() == Some(self.id()) {
            trace!(topic = %envelope.topic(), "Own broadcast ignored");
            return self.reject(RejectReason::SelfEcho);
        }
        if !self.listening.load(Ordering::SeqCst) {
            trace!(topic = %envelope.topic(), "Not listening, frame dropped");
            return self.reject(RejectReason::NotListening);
        }

        self.dispatch(&envelope)
    }

    /// Deliver an own publish directly, for transports that never loop back.
    fn dispatch_local(&self, envelope: &Envelope) {
        if self.listening.load(Ordering::SeqCst) {
            self.dispatch(envelope);
        }
    }

    fn dispatch(&self, envelope: &Envelope) -> DispatchOutcome {
        let routes = {
            let registry = self.registry.read();
            dispatch::plan(&registry, &envelope.data, self.config.hierarchical)
        };
        if routes.is_empty() {
            return self.reject(RejectReason::NoSubscribers);
        }

        let report = dispatch::deliver_routes(&routes, envelope.effective_token(), self.metrics.as_ref());
        debug!(
            bus_id = %self.id(),
            origin = envelope.origin.as_ref().map(BusId::as_str).unwrap_or_default(),
            topic = %envelope.topic(),
            delivered = report.delivered,
            "Envelope dispatched"
        );
        DispatchOutcome::Delivered(report)
    }

    fn reject(&self, reason: RejectReason) -> DispatchOutcome {
        self.metrics.record_rejected(reason);
        DispatchOutcome::Rejected(reason)
    }
}

impl Drop for BusInner {
    fn drop(&mut self) {
        self.activation.get_mut().deactivate(self.adapter.as_ref());
    }
}
