//! Immutable snapshots and events published by the game loop.
//!
//! Observers (AI tasks, user interfaces, loggers) never touch the live
//! game state. They receive clones of these structs through watch and
//! broadcast channels.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{ActionKind, GamePhase};
use crate::ids::{AiKind, PlayerColor, PlayerId};
use crate::objective::PlayerObjective;
use crate::position::{EdgeKey, Position};

/// Start and target city of the current driving round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Journey {
    /// City every driver starts from.
    pub start: Position,
    /// City the drivers race to.
    pub target: Position,
}

/// A tile the player may drive to with the current dice roll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct DrivableTile {
    /// Destination tile.
    pub tile: Position,
    /// Tiles visited on the way, current tile first and `tile` last.
    pub path: Vec<Position>,
    /// Accumulated driving cost along `path`.
    pub cost: u32,
}

/// What one player may legally do right now.
///
/// Recomputed from the game state every time it is published; never
/// cached across turns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PlayerState {
    /// The player this projection belongs to.
    pub player: PlayerId,
    /// Current objective.
    pub objective: PlayerObjective,
    /// Edges the player could build on now.
    pub buildable_edges: BTreeSet<EdgeKey>,
    /// Foreign rails the player could rent now.
    pub choosable_edges: BTreeSet<EdgeKey>,
    /// Rented edges of the last computed path, pending confirmation.
    pub rented_edges: BTreeSet<EdgeKey>,
    /// Whether the last path computation found a path.
    pub has_path: bool,
    /// Tiles of the last computed path, start city first.
    pub route: Vec<Position>,
    /// Tiles reachable with the current dice roll.
    pub drivable_tiles: Vec<DrivableTile>,
    /// Building budget left this turn.
    pub building_budget: u32,
}

impl PlayerState {
    /// An empty projection for a player who has nothing to do.
    pub const fn idle(player: PlayerId) -> Self {
        Self {
            player,
            objective: PlayerObjective::Idle,
            buildable_edges: BTreeSet::new(),
            choosable_edges: BTreeSet::new(),
            rented_edges: BTreeSet::new(),
            has_path: false,
            route: Vec::new(),
            drivable_tiles: Vec::new(),
            building_budget: 0,
        }
    }

    /// Action kinds accepted under the current objective.
    pub const fn allowed_actions(&self) -> &'static [ActionKind] {
        self.objective.allowed_actions()
    }

    /// The drivable option ending at `tile`, if any.
    pub fn drivable(&self, tile: Position) -> Option<&DrivableTile> {
        self.drivable_tiles.iter().find(|option| option.tile == tile)
    }
}

/// Public view of one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PlayerSummary {
    /// Player identifier.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Display colour.
    #[ts(type = "string")]
    pub color: PlayerColor,
    /// AI controller kind, or `None` for a human.
    pub ai: Option<AiKind>,
    /// Credit balance.
    pub credits: u32,
    /// Tile the player is standing on during a journey.
    pub position: Option<Position>,
    /// Point surplus of the current journey.
    pub point_surplus: i32,
    /// Whether the player takes part in the current journey.
    pub driving: bool,
}

/// Owners of one rail-carrying edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RailView {
    /// The edge.
    pub edge: EdgeKey,
    /// Owners in build order.
    pub owners: Vec<PlayerId>,
}

/// Point-in-time view of the whole game.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GameSnapshot {
    /// Current phase, `None` before the game starts.
    pub phase: Option<GamePhase>,
    /// Round counter of the current phase.
    pub round: u32,
    /// Last dice value, 0 before the first roll.
    pub dice_roll: u32,
    /// Player whose turn it is.
    pub active_player: Option<PlayerId>,
    /// Cities of the current driving round.
    pub journey: Option<Journey>,
    /// Cities already used as start or target.
    pub chosen_cities: Vec<Position>,
    /// All players in turn order.
    pub players: Vec<PlayerSummary>,
    /// Every edge that carries at least one rail.
    pub rails: Vec<RailView>,
    /// Winner once the game is over.
    pub winner: Option<PlayerId>,
}

impl GameSnapshot {
    /// Summary of one player, if present.
    pub fn player(&self, id: PlayerId) -> Option<&PlayerSummary> {
        self.players.iter().find(|player| player.id == id)
    }
}

/// Notable things that happened in the game, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    /// A new phase began.
    PhaseChanged {
        /// The phase entered.
        phase: GamePhase,
    },
    /// A new round began.
    RoundStarted {
        /// Round number within the phase.
        round: u32,
    },
    /// Control moved to another player, or to nobody.
    ActivePlayerChanged {
        /// The new active player.
        player: Option<PlayerId>,
    },
    /// A player rolled the dice.
    DiceRolled {
        /// Who rolled.
        player: PlayerId,
        /// The value rolled.
        value: u32,
    },
    /// A player finished a building turn.
    BuildingFinished {
        /// The builder.
        player: PlayerId,
        /// Number of rails the player owns afterwards.
        rails: u32,
    },
    /// The cities of a driving round were chosen.
    CitiesChosen {
        /// Who chose.
        player: PlayerId,
        /// The chosen cities.
        journey: Journey,
    },
    /// A player confirmed a journey and is now driving.
    PathConfirmed {
        /// The driver.
        player: PlayerId,
        /// Rails rented for the journey.
        rented: Vec<EdgeKey>,
    },
    /// A driver moved.
    PlayerMoved {
        /// The driver.
        player: PlayerId,
        /// The tile reached.
        tile: Position,
    },
    /// A driving round ended.
    RoundFinished {
        /// Round number within the phase.
        round: u32,
        /// Players who reached the target, best surplus first.
        winners: Vec<PlayerId>,
    },
    /// The game ended.
    GameOver {
        /// The player with the most credits.
        winner: PlayerId,
    },
}
