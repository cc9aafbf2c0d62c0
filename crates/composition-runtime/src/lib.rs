//! # Composition Runtime Library
//!
//! Builds one [`TileHost`] per context on a shared transport. The binary in
//! `main.rs` drives it; tests use it directly.
//!
//! ```text
//!   client-0 ──┐
//!   client-1 ──┼── LocalHub | BroadcastTransport
//!   client-N ──┘
//! ```

use std::sync::Arc;
use std::time::Duration;

use clap::ValueEnum;
use composition_bus::{
    BroadcastChannel, BroadcastTransport, Bus, BusConfig, BusError, BusMetrics, ChannelAdapter,
    LocalHub,
};
use serde_json::json;
use thiserror::Error;
use tile_handoff::{Client, ClientDirectory, HandoffError, Tile, TileHost};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// How long `hand_off` waits for the tile to arrive.
pub const HAND_OFF_TIMEOUT: Duration = Duration::from_secs(2);

/// Shared medium the contexts talk over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TransportKind {
    /// Synchronous in-process hub.
    #[default]
    Local,
    /// `tokio::sync::broadcast` channel pumped by background tasks.
    Broadcast,
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Number of contexts, at least two.
    pub contexts: usize,
    pub transport: TransportKind,
    pub bus: BusConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            contexts: 2,
            transport: TransportKind::Local,
            bus: BusConfig::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("At least two contexts are needed, got {0}")]
    TooFewContexts(usize),

    #[error("Bus error: {0}")]
    Bus(#[from] BusError),

    #[error("Hand-off failed: {0}")]
    Handoff(#[from] HandoffError),

    #[error("Tile did not arrive within {0:?}")]
    Timeout(Duration),
}

/// Several tile hosts sharing one transport.
pub struct CompositionRuntime {
    transport: TransportKind,
    hosts: Vec<TileHost>,
    /// Broadcast endpoints that need a pump task.
    endpoints: Vec<Arc<BroadcastChannel>>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl CompositionRuntime {
    /// # Errors
    ///
    /// `TooFewContexts` below two contexts, `Bus` for an invalid bus config.
    pub fn new(config: RuntimeConfig, metrics: Arc<dyn BusMetrics>) -> Result<Self, RuntimeError> {
        if config.contexts < 2 {
            return Err(RuntimeError::TooFewContexts(config.contexts));
        }
        config.bus.validate().map_err(BusError::from)?;

        let clients: Vec<Client> = (0..config.contexts)
            .map(|i| Client::new(format!("client-{i}"), format!("Context {i}"), "tile-host"))
            .collect();

        let hub = LocalHub::new();
        let broadcast = BroadcastTransport::with_capacity(config.bus.channel_capacity);
        let mut endpoints = Vec::new();
        let mut hosts = Vec::with_capacity(clients.len());

        for client in &clients {
            let adapter: Arc<dyn ChannelAdapter> = match config.transport {
                TransportKind::Local => hub.endpoint(),
                TransportKind::Broadcast => {
                    let endpoint = broadcast.attach();
                    endpoints.push(endpoint.clone());
                    endpoint
                }
            };

            let bus = Bus::builder(adapter)
                .config(config.bus.clone())
                .metrics(metrics.clone())
                .build()?;
            bus.activate_listener();
            debug!(client = %client.id, bus_id = %bus.id(), "Context created");

            let directory = ClientDirectory::new(client.id.clone()).with_clients(clients.clone());
            hosts.push(TileHost::new(bus, directory));
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        info!(contexts = hosts.len(), transport = ?config.transport, "Runtime created");

        Ok(Self {
            transport: config.transport,
            hosts,
            endpoints,
            shutdown_tx,
            shutdown_rx,
        })
    }

    #[must_use]
    pub fn hosts(&self) -> &[TileHost] {
        &self.hosts
    }

    #[must_use]
    pub fn transport(&self) -> TransportKind {
        self.transport
    }

    /// Spawn a pump per broadcast endpoint. Nothing to do for the local hub.
    pub fn start(&self) -> Vec<JoinHandle<()>> {
        self.endpoints
            .iter()
            .map(|endpoint| {
                let endpoint = endpoint.clone();
                let mut shutdown = self.shutdown_rx.clone();
                tokio::spawn(async move {
                    tokio::select! {
                        () = endpoint.run() => {}
                        _ = shutdown.changed() => debug!("Pump stopped"),
                    }
                })
            })
            .collect()
    }

    /// Move a demo tile from the first context to the second and wait for it.
    ///
    /// # Errors
    ///
    /// `Handoff` if the move is refused, `Timeout` if it never arrives.
    pub async fn hand_off(&self) -> Result<Tile, RuntimeError> {
        let (sender, receiver) = (&self.hosts[0], &self.hosts[1]);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handler = receiver.on_arrival(move |tile| {
            let _ = tx.send(tile);
        });

        let tile = Tile {
            tag: "sc-note".to_string(),
            width: "240px".to_string(),
            height: "160px".to_string(),
            state: json!({ "text": "hello from client-0" }),
            content: "hello".to_string(),
        };
        let target = receiver.current_client();
        sender.move_tile(&tile, &target)?;

        let arrived = tokio::time::timeout(HAND_OFF_TIMEOUT, rx.recv()).await;
        receiver.bus().unsubscribe(tile_handoff::MOVE_TILE_TOPIC, Some(&handler));

        match arrived {
            Ok(Some(tile)) => {
                info!(to = %target, tile = %tile.tag, "Hand-off complete");
                Ok(tile)
            }
            _ => Err(RuntimeError::Timeout(HAND_OFF_TIMEOUT)),
        }
    }

    /// Stop all pumps.
    pub fn shutdown(&self) {
        info!("Initiating shutdown...");
        if self.shutdown_tx.send(true).is_err() {
            debug!("No pump was running");
        }
    }
}
