//! # Hierarchical Topic Tests
//!
//! ```text
//! publish "room.tile.move"
//!   "room"            sees "tile.move"
//!   "room.tile"       sees "move"
//!   "room.tile.move"  sees ""
//!   "room.chat"       sees nothing
//! ```
//!
//! Receivers with different wiring modes and hierarchy settings share one
//! hub; each one applies its own settings to the same frame.

#[cfg(test)]
mod tests {
    use composition_bus::{BusConfig, LocalHub, WiringMode};
    use serde_json::json;

    use crate::integration::fixtures::{context, record};

    fn topics(seen: &crate::integration::fixtures::Seen) -> Vec<String> {
        seen.lock().iter().map(|(topic, _, _)| topic.clone()).collect()
    }

    #[test]
    fn test_levels_seen_by_each_wiring_mode() {
        let hub = LocalHub::new();
        let sender = context(&hub, BusConfig::default());

        for wiring in [WiringMode::Global, WiringMode::PerTopic] {
            let receiver = context(&hub, BusConfig::default().with_wiring(wiring));
            let (_, room) = record(&receiver, "room");
            let (_, tile) = record(&receiver, "room.tile");
            let (_, exact) = record(&receiver, "room.tile.move");
            let (_, chat) = record(&receiver, "room.chat");

            sender
                .publish("room.tile.move", json!({"x": 10, "y": 20}))
                .unwrap();

            assert_eq!(topics(&room), vec!["tile.move"], "{wiring:?}");
            assert_eq!(topics(&tile), vec!["move"], "{wiring:?}");
            assert_eq!(topics(&exact), vec![""], "{wiring:?}");
            assert!(chat.lock().is_empty(), "{wiring:?}");
        }
    }

    #[test]
    fn test_flat_receiver_next_to_hierarchical_one() {
        let hub = LocalHub::new();
        let sender = context(&hub, BusConfig::default());
        let flat = context(&hub, BusConfig::default().with_hierarchical(false));
        let nested = context(&hub, BusConfig::default());

        let (_, flat_room) = record(&flat, "room");
        let (_, flat_exact) = record(&flat, "room.tile");
        let (_, nested_room) = record(&nested, "room");

        sender.publish("room.tile", json!(null)).unwrap();

        assert!(flat_room.lock().is_empty());
        assert_eq!(topics(&flat_exact), vec!["room.tile"]);
        assert_eq!(topics(&nested_room), vec!["tile"]);
    }

    #[test]
    fn test_segment_boundaries_respected() {
        let hub = LocalHub::new();
        let sender = context(&hub, BusConfig::default());
        let receiver = context(&hub, BusConfig::default());
        let (_, room) = record(&receiver, "room");

        sender.publish("roomba.dock", json!(null)).unwrap();
        sender.publish("room", json!(null)).unwrap();

        assert_eq!(topics(&room), vec![""]);
    }

    #[test]
    fn test_same_handler_on_two_levels_runs_once_per_token() {
        let hub = LocalHub::new();
        let sender = context(&hub, BusConfig::default());
        let receiver = context(&hub, BusConfig::default().with_wiring(WiringMode::Global));
        let (handler, seen) = record(&receiver, "room");
        receiver.subscribe("room.tile", Some(&handler));

        sender.publish("room.tile", json!(1)).unwrap();

        // Each registration is its own subscriber with its own token memory.
        assert_eq!(topics(&seen), vec!["tile", ""]);
    }

    #[test]
    fn test_payload_identical_at_every_level() {
        let hub = LocalHub::new();
        let sender = context(&hub, BusConfig::default());
        let receiver = context(&hub, BusConfig::default());
        let logs: Vec<_> = ["a", "a.b", "a.b.c", "a.b.c.d"]
            .iter()
            .map(|topic| record(&receiver, topic).1)
            .collect();

        let payload = json!({"nested": {"list": [1, 2, 3]}, "flag": true});
        sender.publish("a.b.c.d", payload.clone()).unwrap();

        for log in &logs {
            assert_eq!(log.lock()[0].1.as_ref(), Some(&payload));
        }
    }
}
