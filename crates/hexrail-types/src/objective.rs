//! Per-player objectives and the actions each one admits.
//!
//! An objective is a capability gate: the game loop sets it, and the
//! player controller only executes actions whose [`ActionKind`] the
//! objective allows. Objectives never change themselves.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::ActionKind;

/// What the game currently expects from a player.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum PlayerObjective {
    /// Build rails or finish building.
    PlaceRail,
    /// Roll the dice.
    RollDice,
    /// Pick the cities of the next journey.
    ChooseCities,
    /// Drive to one of the drivable tiles.
    Drive,
    /// Select rails to rent.
    ChoosePath,
    /// Accept or reject the computed path.
    ConfirmPath,
    /// Not this player's turn.
    #[default]
    Idle,
}

impl PlayerObjective {
    /// The action kinds accepted while this objective is active.
    pub const fn allowed_actions(self) -> &'static [ActionKind] {
        match self {
            Self::PlaceRail => &[ActionKind::BuildRail, ActionKind::ConfirmBuild],
            Self::RollDice => &[ActionKind::RollDice],
            Self::ChooseCities => &[ActionKind::ChooseCities],
            Self::Drive => &[ActionKind::Drive],
            Self::ChoosePath => &[ActionKind::ChooseRails],
            Self::ConfirmPath => &[ActionKind::ConfirmDrive],
            Self::Idle => &[],
        }
    }

    /// Whether `kind` may be executed under this objective.
    pub fn allows(self, kind: ActionKind) -> bool {
        self.allowed_actions().contains(&kind)
    }
}

impl core::fmt::Display for PlayerObjective {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::PlaceRail => "place_rail",
            Self::RollDice => "roll_dice",
            Self::ChooseCities => "choose_cities",
            Self::Drive => "drive",
            Self::ChoosePath => "choose_path",
            Self::ConfirmPath => "confirm_path",
            Self::Idle => "idle",
        };
        f.write_str(name)
    }
}
