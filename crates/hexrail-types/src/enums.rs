//! Enumeration types shared by the world, the game loop and observers.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Terrain
// ---------------------------------------------------------------------------

/// Terrain of a tile. Determines building and driving costs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum TileType {
    /// Flat land; cities are only founded here.
    Plain,
    /// Elevated land; expensive to build across.
    Mountain,
}

impl TileType {
    /// Every terrain type.
    pub const ALL: [Self; 2] = [Self::Plain, Self::Mountain];
}

// ---------------------------------------------------------------------------
// Game phase
// ---------------------------------------------------------------------------

/// The two phases of a game, played in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    /// Players extend their networks with a dice-derived budget.
    Building,
    /// Players race between chosen cities, renting foreign rails.
    Driving,
}

// ---------------------------------------------------------------------------
// Action kinds
// ---------------------------------------------------------------------------

/// Discriminant of a [`PlayerAction`](crate::PlayerAction), used by the
/// objective capability gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Roll the dice.
    RollDice,
    /// Build rails on a list of edges.
    BuildRail,
    /// Finish the current building turn.
    ConfirmBuild,
    /// Pick the start and target city of a driving round.
    ChooseCities,
    /// Select foreign rails to rent for the coming journey.
    ChooseRails,
    /// Accept or reject the computed journey.
    ConfirmDrive,
    /// Move along the network.
    Drive,
}
