//! Tiles and cities. Both are fixed once the grid has been generated.

use hexrail_types::{Position, TileType};
use serde::{Deserialize, Serialize};

/// One hexagon of land.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    position: Position,
    tile_type: TileType,
}

impl Tile {
    /// Create a tile.
    pub const fn new(position: Position, tile_type: TileType) -> Self {
        Self {
            position,
            tile_type,
        }
    }

    /// Where the tile lies.
    pub const fn position(&self) -> Position {
        self.position
    }

    /// The tile's terrain.
    pub const fn tile_type(&self) -> TileType {
        self.tile_type
    }
}

/// A named city on a plain tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    position: Position,
    name: String,
    starting: bool,
}

impl City {
    /// Create a city.
    pub const fn new(position: Position, name: String, starting: bool) -> Self {
        Self {
            position,
            name,
            starting,
        }
    }

    /// Tile the city stands on.
    pub const fn position(&self) -> Position {
        self.position
    }

    /// Generated name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether players may start their network here.
    pub const fn is_starting_city(&self) -> bool {
        self.starting
    }
}
