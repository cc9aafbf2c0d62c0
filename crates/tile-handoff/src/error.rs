//! Error types for tile hand-off

use composition_bus::BusError;
use thiserror::Error;

/// Errors that can occur while moving a tile
#[derive(Debug, Error)]
pub enum HandoffError {
    #[error("Tile is already on client {0}")]
    SameClient(String),

    #[error("Unknown client: {0}")]
    UnknownClient(String),

    #[error("Bus error: {0}")]
    Bus(#[from] BusError),
}
