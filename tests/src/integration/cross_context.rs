//! # Cross-Context Delivery Tests
//!
//! ```text
//! [Context A] ──publish──→ [LocalHub / broadcast] ──→ [Context B]
//!      ↑                                          └──→ [Context C]
//!      └──────────── own frame (ignored) ───────────────┘
//! ```
//!
//! ## Test Categories
//!
//! 1. **Fan-out**: every other context receives, the sender does not
//! 2. **Isolation**: namespaces do not see each other
//! 3. **Tokens**: redelivered frames are handled once
//! 4. **Re-entrancy**: handlers publish and unsubscribe while dispatching
//! 5. **Failures**: a failing context does not disturb the others

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use composition_bus::{
        BroadcastTransport, Bus, BusConfig, ChannelAdapter, DispatchOutcome, HandlerError,
        LocalHub, Metrics, RejectReason, Token, WiringMode,
    };
    use serde_json::json;

    use crate::integration::fixtures::{context, record};

    #[test]
    fn test_fan_out_skips_sender() {
        let hub = LocalHub::new();
        let (a, b, c) = (
            context(&hub, BusConfig::default()),
            context(&hub, BusConfig::default()),
            context(&hub, BusConfig::default().with_wiring(WiringMode::Global)),
        );
        let (_, at_a) = record(&a, "layout.changed");
        let (_, at_b) = record(&b, "layout.changed");
        let (_, at_c) = record(&c, "layout.changed");

        let token = a
            .publish("layout.changed", json!({"columns": 3}))
            .unwrap()
            .expect("published");

        assert!(at_a.lock().is_empty());
        for seen in [&at_b, &at_c] {
            let seen = seen.lock();
            assert_eq!(seen.len(), 1);
            assert_eq!(seen[0].1, Some(json!({"columns": 3})));
            assert_eq!(seen[0].2.as_ref(), Some(&token));
        }
    }

    #[test]
    fn test_ids_are_unique_per_context() {
        let hub = LocalHub::new();
        let ids: Vec<String> = (0..16)
            .map(|_| context(&hub, BusConfig::default()).id().to_string())
            .collect();
        let mut unique = ids.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), ids.len());
    }

    #[test]
    fn test_namespaces_are_isolated() {
        let hub = LocalHub::new();
        let ours = context(&hub, BusConfig::default());
        let theirs = context(&hub, BusConfig::default().with_namespace("OtherApp"));
        let (_, at_ours) = record(&ours, "t");
        let (_, at_theirs) = record(&theirs, "t");

        theirs.publish("t", json!(1)).unwrap();
        assert!(at_ours.lock().is_empty());

        ours.publish("t", json!(2)).unwrap();
        assert!(at_theirs.lock().is_empty());

        let frame = json!({
            "type": "OtherApp.message",
            "origin": "OtherApp.x",
            "data": {"topic": "t"}
        });
        assert_eq!(
            ours.receive(&frame),
            DispatchOutcome::Rejected(RejectReason::ForeignMarker)
        );
    }

    #[test]
    fn test_reused_token_is_handled_once() {
        let hub = LocalHub::new();
        let a = context(&hub, BusConfig::default());
        let b = context(&hub, BusConfig::default());
        let (_, seen) = record(&b, "t");

        let token = Token::from("retry-1");
        a.publish_with(("t", json!(1)), Some(token.clone())).unwrap();
        a.publish_with(("t", json!(1)), Some(token)).unwrap();
        assert_eq!(seen.lock().len(), 1);

        a.publish("t", json!(2)).unwrap();
        assert_eq!(seen.lock().len(), 2);
    }

    #[test]
    fn test_frames_without_token_always_deliver() {
        let hub = LocalHub::new();
        let b = context(&hub, BusConfig::default());
        let (_, seen) = record(&b, "t");
        let frame = json!({
            "type": "SmartComposition.message",
            "origin": "SmartComposition.legacy",
            "data": {"topic": "t", "data": 1}
        });

        hub.inject(&frame);
        hub.inject(&frame);

        let seen = seen.lock();
        assert_eq!(seen.len(), 2);
        assert!(seen.iter().all(|(_, _, token)| token.is_none()));
    }

    #[test]
    fn test_frames_without_origin_are_delivered() {
        let hub = LocalHub::new();
        let b = context(&hub, BusConfig::default());
        let (_, seen) = record(&b, "t");

        hub.inject(&json!({
            "type": "SmartComposition.message",
            "token": "anon-1",
            "data": {"topic": "t", "data": "anonymous"}
        }));

        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].1, Some(json!("anonymous")));
    }

    #[test]
    fn test_handler_can_reply_while_dispatching() {
        let hub = LocalHub::new();
        let a = context(&hub, BusConfig::default());
        let b = context(&hub, BusConfig::default());

        let responder = b.clone();
        b.on("ping", move |m, _| {
            let n = m.data().and_then(|v| v.as_i64()).unwrap_or_default();
            responder
                .publish("pong", json!(n + 1))
                .map_err(|e| HandlerError(e.to_string()))?;
            Ok(())
        });
        let (_, pongs) = record(&a, "pong");

        a.publish("ping", json!(41)).unwrap();

        assert_eq!(pongs.lock()[0].1, Some(json!(42)));
    }

    #[test]
    fn test_failing_context_does_not_disturb_others() {
        let hub = LocalHub::new();
        let metrics = Arc::new(Metrics::new());
        let a = context(&hub, BusConfig::default());
        let broken = Bus::builder(hub.endpoint())
            .metrics(metrics.clone())
            .build()
            .unwrap();
        broken.activate_listener();
        broken.on("t", |_, _| panic!("tile crashed"));
        broken.on("t", |_, _| Err(HandlerError::from("bad state")));
        let (_, at_broken) = record(&broken, "t");
        let c = context(&hub, BusConfig::default());
        let (_, at_c) = record(&c, "t");

        assert!(a.publish("t", json!(1)).unwrap().is_some());

        assert_eq!(at_broken.lock().len(), 1);
        assert_eq!(at_c.lock().len(), 1);
        assert_eq!(metrics.snapshot().handler_failures, 2);
        assert_eq!(metrics.snapshot().delivered, 1);
    }

    #[test]
    fn test_deactivated_context_misses_then_recovers() {
        let hub = LocalHub::new();
        let a = context(&hub, BusConfig::default());
        let b = context(&hub, BusConfig::default());
        let (_, seen) = record(&b, "t");

        b.deactivate_listener();
        a.publish("t", json!("missed")).unwrap();
        assert!(seen.lock().is_empty());
        assert_eq!(b.adapter().hook_count(), 0);

        b.activate_listener();
        a.publish("t", json!("seen")).unwrap();
        assert_eq!(seen.lock().len(), 1);
        assert_eq!(seen.lock()[0].1, Some(json!("seen")));
    }

    #[test]
    fn test_notify_self_without_loopback() {
        let hub = LocalHub::new();
        let a = Bus::new(
            BusConfig::default().with_notify_self(true),
            hub.endpoint_without_loopback(),
        )
        .unwrap();
        a.activate_listener();
        let b = context(&hub, BusConfig::default());
        let (_, at_a) = record(&a, "t");
        let (_, at_b) = record(&b, "t");

        a.publish("t", json!(1)).unwrap();

        assert_eq!(at_a.lock().len(), 1);
        assert_eq!(at_b.lock().len(), 1);
    }

    #[test]
    fn test_broadcast_transport_with_drain() {
        let transport = BroadcastTransport::with_capacity(64);
        let endpoints: Vec<_> = (0..3).map(|_| transport.attach()).collect();
        let buses: Vec<Bus> = endpoints
            .iter()
            .map(|e| {
                let bus = Bus::new(BusConfig::default(), e.clone()).unwrap();
                bus.activate_listener();
                bus
            })
            .collect();
        let logs: Vec<_> = buses.iter().map(|b| record(b, "t").1).collect();

        buses[0].publish("t", json!("over broadcast")).unwrap();
        for endpoint in &endpoints {
            assert_eq!(endpoint.drain(), 1);
        }

        assert!(logs[0].lock().is_empty());
        assert_eq!(logs[1].lock().len(), 1);
        assert_eq!(logs[2].lock().len(), 1);
    }

    #[tokio::test]
    async fn test_broadcast_transport_with_pumps() {
        let transport = BroadcastTransport::with_capacity(64);
        let (ea, eb) = (transport.attach(), transport.attach());
        let a = Bus::new(BusConfig::default(), ea.clone()).unwrap();
        let b = Bus::new(BusConfig::default(), eb.clone()).unwrap();
        a.activate_listener();
        b.activate_listener();

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        b.on("t", move |m, _| {
            let _ = tx.send(m.data().cloned());
            Ok(())
        });
        tokio::spawn(ea.run());
        tokio::spawn(eb.run());

        a.publish("t", json!({"async": true})).unwrap();

        let received = tokio::time::timeout(std::time::Duration::from_secs(1), rx.recv())
            .await
            .expect("delivered in time");
        assert_eq!(received, Some(Some(json!({"async": true}))));
    }

    #[test]
    fn test_unsubscribed_context_stops_receiving() {
        let hub = LocalHub::new();
        let a = context(&hub, BusConfig::default());
        let b = context(&hub, BusConfig::default());
        let (handler, seen) = record(&b, "t");

        a.publish("t", json!(1)).unwrap();
        b.unsubscribe("t", Some(&handler));
        a.publish("t", json!(2)).unwrap();

        assert_eq!(seen.lock().len(), 1);
        assert!(b.topics().is_empty());
        assert_eq!(b.wired_hooks(), 0);
    }
}
