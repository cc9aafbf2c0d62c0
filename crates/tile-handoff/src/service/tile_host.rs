//! Tile Host Service
//!
//! Sends tiles to other clients and accepts tiles addressed to this one.
//! The listen/publish toggles map onto the bus flags.

use std::sync::Arc;

use composition_bus::{Bus, HandlerError, HandlerRef};
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::domain::{Client, ClientDirectory, MoveTile, Tile, MOVE_TILE_TOPIC};
use crate::error::HandoffError;

/// One client's tile host.
pub struct TileHost {
    bus: Bus,
    directory: Arc<RwLock<ClientDirectory>>,
}

impl TileHost {
    pub fn new(bus: Bus, directory: ClientDirectory) -> Self {
        Self {
            bus,
            directory: Arc::new(RwLock::new(directory)),
        }
    }

    #[must_use]
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    #[must_use]
    pub fn current_client(&self) -> String {
        self.directory.read().current_id().to_string()
    }

    /// Clients a tile may be moved to, with their labels.
    #[must_use]
    pub fn targets(&self) -> Vec<(Client, String)> {
        self.directory
            .read()
            .targets()
            .map(|c| (c.clone(), c.label()))
            .collect()
    }

    /// Register or refresh a client.
    pub fn client_joined(&self, client: Client) {
        debug!(client = %client.id, "Client joined");
        self.directory.write().insert(client);
    }

    pub fn client_left(&self, id: &str) -> Option<Client> {
        debug!(client = %id, "Client left");
        self.directory.write().remove(id)
    }

    /// Hand `tile` to `client_id`.
    ///
    /// Returns `false` when publishing is off and nothing was sent.
    ///
    /// # Errors
    ///
    /// `SameClient` for the current client, `UnknownClient` for an id not
    /// in the directory, `Bus` if the publish fails.
    pub fn move_tile(&self, tile: &Tile, client_id: &str) -> Result<bool, HandoffError> {
        {
            let directory = self.directory.read();
            if directory.is_current(client_id) {
                return Err(HandoffError::SameClient(client_id.to_string()));
            }
            if directory.get(client_id).is_none() {
                return Err(HandoffError::UnknownClient(client_id.to_string()));
            }
        }

        let payload = MoveTile::new(tile, client_id);
        let sent = self.bus.publish(MOVE_TILE_TOPIC, &payload)?.is_some();
        info!(client = %client_id, tile = %payload.kind, sent, "Tile handed off");
        Ok(sent)
    }

    /// Call `on_tile` for every tile addressed to this client.
    ///
    /// Returns the bus handler so it can be unsubscribed later.
    pub fn on_arrival<F>(&self, on_tile: F) -> HandlerRef
    where
        F: Fn(Tile) + Send + Sync + 'static,
    {
        let directory = self.directory.clone();
        self.bus.on(MOVE_TILE_TOPIC, move |message, _| {
            let data = message
                .data()
                .ok_or_else(|| HandlerError::from("move-tile without data"))?;
            let payload: MoveTile = serde_json::from_value(data.clone())?;

            if !directory.read().is_current(&payload.client) {
                debug!(client = %payload.client, "Tile addressed elsewhere");
                return Ok(());
            }
            info!(tile = %payload.kind, "Tile arrived");
            on_tile(payload.into_tile());
            Ok(())
        })
    }

    /// Flip listening, returning the new value.
    pub fn toggle_listening(&self) -> bool {
        let listening = !self.bus.is_listening();
        self.bus.set_listening(listening);
        listening
    }

    /// Flip publishing, returning the new value.
    pub fn toggle_publishing(&self) -> bool {
        let publishing = !self.bus.is_publishing();
        self.bus.set_publishing(publishing);
        publishing
    }
}
