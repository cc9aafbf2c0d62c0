//! Service Layer - Orchestration over the bus

pub mod tile_host;

pub use tile_host::TileHost;
