//! # Tile Hand-off
//!
//! Moves a tile from one composition client to another over the
//! composition bus.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): `Client`, `ClientDirectory`, `Tile`, `MoveTile`
//! - **Service Layer** (`service/`): `TileHost`, which publishes and
//!   receives `move-tile` messages
//!
//! ## Flow
//!
//! ```text
//! TileHost(wall)                         TileHost(pad)
//!   move_tile(tile, "pad")                 on_arrival(f)
//!     │ publish "move-tile"                  ▲
//!     └──────────► composition bus ──────────┘ client == "pad" → f(tile)
//! ```

pub mod domain;
pub mod error;
pub mod service;

pub use domain::{Client, ClientDirectory, MoveTile, Tile, MOVE_TILE_TOPIC};
pub use error::HandoffError;
pub use service::TileHost;
