//! Domain Layer - Pure data, no bus access
//!
//! - Clients a tile can be handed to
//! - Tiles and the `move-tile` payload

pub mod client;
pub mod tile;

pub use client::{Client, ClientDirectory};
pub use tile::{MoveTile, Tile, MOVE_TILE_TOPIC};
