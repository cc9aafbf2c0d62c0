//! # Tile Hand-off Tests
//!
//! ```text
//! [TileHost wall] ──move-tile{client: "pad"}──→ [bus] ──→ [TileHost pad]    → rebuilt
//!                                                    └──→ [TileHost laptop] → ignored
//! ```
//!
//! Runs the hand-off over the broadcast transport with Prometheus counters
//! attached, the way the runtime binary wires it.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use composition_bus::{BroadcastChannel, BroadcastTransport, Bus, BusConfig};
    use composition_telemetry::{
        encode_metrics, register_metrics, PrometheusBusMetrics, BUS_DELIVERED, BUS_PUBLISHED,
    };
    use parking_lot::Mutex;
    use serde_json::json;
    use tile_handoff::{Client, ClientDirectory, HandoffError, Tile, TileHost};

    struct Room {
        endpoints: Vec<Arc<BroadcastChannel>>,
        hosts: Vec<TileHost>,
    }

    impl Room {
        fn new(ids: &[&str]) -> Self {
            let transport = BroadcastTransport::with_capacity(32);
            let clients: Vec<Client> = ids
                .iter()
                .map(|id| Client::new(*id, id.to_uppercase(), "screen"))
                .collect();
            let mut endpoints = Vec::new();
            let mut hosts = Vec::new();
            for id in ids {
                let endpoint = transport.attach();
                let bus = Bus::builder(endpoint.clone())
                    .config(BusConfig::default())
                    .metrics(Arc::new(PrometheusBusMetrics))
                    .build()
                    .unwrap();
                bus.activate_listener();
                hosts.push(TileHost::new(
                    bus,
                    ClientDirectory::new(*id).with_clients(clients.clone()),
                ));
                endpoints.push(endpoint);
            }
            Self { endpoints, hosts }
        }

        fn pump(&self) {
            for endpoint in &self.endpoints {
                endpoint.drain();
            }
        }
    }

    fn collect(host: &TileHost) -> Arc<Mutex<Vec<Tile>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        host.on_arrival(move |tile| sink.lock().push(tile));
        seen
    }

    fn note(text: &str) -> Tile {
        Tile {
            tag: "SC-NOTE".into(),
            width: "100px".into(),
            height: "80px".into(),
            state: json!({ "text": text }),
            content: text.into(),
        }
    }

    #[test]
    fn test_hand_off_over_broadcast() {
        register_metrics().unwrap();
        let published_before = BUS_PUBLISHED.get();
        let delivered_before = BUS_DELIVERED.get();

        let room = Room::new(&["wall", "pad", "laptop"]);
        let at_pad = collect(&room.hosts[1]);
        let at_laptop = collect(&room.hosts[2]);

        assert!(room.hosts[0].move_tile(&note("hi"), "pad").unwrap());
        room.pump();

        let arrived = at_pad.lock();
        assert_eq!(arrived.len(), 1);
        assert_eq!(arrived[0].state, json!({"text": "hi"}));
        assert_eq!(arrived[0].tag, "sc-note");
        assert!(at_laptop.lock().is_empty());

        assert!(BUS_PUBLISHED.get() >= published_before + 1.0);
        // Both pad and laptop decode successfully; only pad keeps the tile.
        assert!(BUS_DELIVERED.get() >= delivered_before + 2.0);
        assert!(encode_metrics().unwrap().contains("sc_bus_published_total"));
    }

    #[test]
    fn test_tile_travels_on_and_back() {
        let room = Room::new(&["wall", "pad"]);
        let at_wall = collect(&room.hosts[0]);
        let at_pad = collect(&room.hosts[1]);

        room.hosts[0].move_tile(&note("first"), "pad").unwrap();
        room.pump();
        let tile = at_pad.lock().pop().expect("tile at pad");

        room.hosts[1].move_tile(&tile, "wall").unwrap();
        room.pump();
        assert_eq!(at_wall.lock().len(), 1);
        assert_eq!(at_wall.lock()[0].content, "first");
    }

    #[test]
    fn test_refused_moves_send_nothing() {
        let room = Room::new(&["wall", "pad"]);
        let at_pad = collect(&room.hosts[1]);

        assert!(matches!(
            room.hosts[0].move_tile(&note("x"), "wall"),
            Err(HandoffError::SameClient(_))
        ));
        assert!(matches!(
            room.hosts[0].move_tile(&note("x"), "kiosk"),
            Err(HandoffError::UnknownClient(_))
        ));
        room.pump();
        assert!(at_pad.lock().is_empty());
    }

    #[test]
    fn test_publishing_off_keeps_tile_home() {
        let room = Room::new(&["wall", "pad"]);
        let at_pad = collect(&room.hosts[1]);

        room.hosts[0].toggle_publishing();
        assert!(!room.hosts[0].move_tile(&note("x"), "pad").unwrap());
        room.pump();
        assert!(at_pad.lock().is_empty());
    }
}
