//! Tiles and the `move-tile` message.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Topic tiles travel on.
pub const MOVE_TILE_TOPIC: &str = "move-tile";

/// A self-contained tile: what is needed to rebuild it elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    /// Element tag, compared case-insensitively.
    pub tag: String,
    pub width: String,
    pub height: String,
    /// Opaque tile state.
    pub state: Value,
    pub content: String,
}

/// Payload published on [`MOVE_TILE_TOPIC`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveTile {
    /// Destination client id.
    pub client: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub width: String,
    pub height: String,
    #[serde(default)]
    pub state: Value,
    #[serde(default)]
    pub content: String,
}

impl MoveTile {
    pub fn new(tile: &Tile, client: impl Into<String>) -> Self {
        Self {
            client: client.into(),
            kind: tile.tag.to_lowercase(),
            width: tile.width.clone(),
            height: tile.height.clone(),
            state: tile.state.clone(),
            content: tile.content.clone(),
        }
    }

    /// The tile as it should be rebuilt on the destination.
    #[must_use]
    pub fn into_tile(self) -> Tile {
        Tile {
            tag: self.kind,
            width: self.width,
            height: self.height,
            state: self.state,
            content: self.content,
        }
    }
}
