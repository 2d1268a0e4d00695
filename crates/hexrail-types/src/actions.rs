//! Commands submitted by players (human or AI) to their mailbox.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::ActionKind;
use crate::position::{EdgeKey, Position};

/// A data-only command consumed by the player controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlayerAction {
    /// Roll the dice.
    RollDice,
    /// Build rails on the given edges, in order.
    BuildRail {
        /// Edges to build on.
        edges: Vec<EdgeKey>,
    },
    /// Finish the current building turn.
    ConfirmBuild,
    /// Pick two unvisited cities as start and target.
    ChooseCities,
    /// Rent the given foreign rails for the coming journey.
    ChooseRails {
        /// Edges to rent.
        edges: BTreeSet<EdgeKey>,
    },
    /// Accept (`true`) or reject the computed path.
    ConfirmDrive {
        /// Whether the path is accepted.
        accept: bool,
    },
    /// Drive to a tile from the current drivable set.
    Drive {
        /// Destination tile.
        tile: Position,
    },
}

impl PlayerAction {
    /// The discriminant checked against the player's objective.
    pub const fn kind(&self) -> ActionKind {
        match self {
            Self::RollDice => ActionKind::RollDice,
            Self::BuildRail { .. } => ActionKind::BuildRail,
            Self::ConfirmBuild => ActionKind::ConfirmBuild,
            Self::ChooseCities => ActionKind::ChooseCities,
            Self::ChooseRails { .. } => ActionKind::ChooseRails,
            Self::ConfirmDrive { .. } => ActionKind::ConfirmDrive,
            Self::Drive { .. } => ActionKind::Drive,
        }
    }
}
