//! # Integration Tests
//!
//! Every scenario builds several independent bus instances on one shared
//! transport, the way separately loaded contexts would meet in practice.

pub mod cross_context;
pub mod handoff;
pub mod hierarchy;

#[cfg(test)]
pub(crate) mod fixtures {
    use std::sync::Arc;

    use composition_bus::{Bus, BusConfig, HandlerRef, LocalHub, Message, Token};
    use parking_lot::Mutex;
    use serde_json::Value;

    /// What a recording handler saw: topic as delivered, payload, token.
    pub type Seen = Arc<Mutex<Vec<(String, Option<Value>, Option<Token>)>>>;

    pub fn context(hub: &LocalHub, config: BusConfig) -> Bus {
        let bus = Bus::new(config, hub.endpoint()).expect("valid config");
        bus.activate_listener();
        bus
    }

    pub fn record(bus: &Bus, topic: &str) -> (HandlerRef, Seen) {
        let seen: Seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let handler = bus.on(topic, move |m: &Message, token: Option<&Token>| {
            sink.lock()
                .push((m.topic.clone(), m.data().cloned(), token.cloned()));
            Ok(())
        });
        (handler, seen)
    }
}
