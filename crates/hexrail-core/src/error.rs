//! Error types for the `hexrail-core` crate.
//!
//! Two families are kept apart:
//!
//! - [`IllegalAction`]: a player asked for something the rules forbid.
//!   The action is discarded and the player is asked again.
//! - [`GameError`]: the game cannot continue (bad setup, a broken
//!   invariant, an operator stop).

use hexrail_ledger::LedgerError;
use hexrail_types::{ActionKind, EdgeKey, PlayerId, PlayerObjective, Position};
use hexrail_world::WorldError;

use crate::ai::AiError;
use crate::config::ConfigError;

/// A rule violation by a single action. Never fatal.
#[derive(Debug, thiserror::Error)]
pub enum IllegalAction {
    /// The current objective does not admit this kind of action.
    #[error("{kind:?} is not allowed while the objective is {objective}")]
    NotAllowed {
        /// Kind of the submitted action.
        kind: ActionKind,
        /// Objective at the time.
        objective: PlayerObjective,
    },

    /// The player cannot build on any edge at all.
    #[error("no edge is buildable")]
    NothingBuildable,

    /// The grid refuses a rail on this edge.
    #[error("cannot build on {edge}: {source}")]
    RailRejected {
        /// The edge.
        edge: EdgeKey,
        /// The violated grid rule.
        source: WorldError,
    },

    /// The base cost exceeds the remaining building budget.
    #[error("{edge} costs {cost}, building budget is {budget}")]
    OverBudget {
        /// The edge.
        edge: EdgeKey,
        /// Base building cost.
        cost: u32,
        /// Remaining budget.
        budget: u32,
    },

    /// The player cannot pay the credits the rail requires.
    #[error("{edge} requires {cost} credits, player has {credits}")]
    CannotAfford {
        /// The edge.
        edge: EdgeKey,
        /// Credits required.
        cost: u32,
        /// Credits held.
        credits: u32,
    },

    /// No journey has been chosen yet.
    #[error("no journey has been chosen")]
    NoJourney,

    /// An edge is not among the choosable edges.
    #[error("{0} cannot be rented")]
    NotChoosable(EdgeKey),

    /// More edges were chosen than may be rented.
    #[error("{chosen} edges chosen, at most {limit} may be rented")]
    TooManyRentals {
        /// Edges chosen.
        chosen: usize,
        /// Rental limit.
        limit: u32,
    },

    /// The rent of the chosen edges exceeds the player's credits.
    #[error("rent of {rent} exceeds {credits} credits")]
    RentUnaffordable {
        /// Total rent.
        rent: u32,
        /// Credits held.
        credits: u32,
    },

    /// The player is not driving in this phase.
    #[error("player cannot drive now")]
    CannotDrive,

    /// The tile is not reachable with the current roll.
    #[error("{0} is not drivable")]
    NotDrivable(Position),
}

/// Errors that stop the game.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// Fewer players than required joined.
    #[error("not enough players: {have} joined, {need} required")]
    NotEnoughPlayers {
        /// Players present.
        have: usize,
        /// Minimum required.
        need: usize,
    },

    /// The game is full.
    #[error("too many players: at most {max} allowed")]
    TooManyPlayers {
        /// Maximum allowed.
        max: usize,
    },

    /// An operator requested a stop.
    #[error("game was stopped")]
    Stopped,

    /// No player with this identifier exists.
    #[error("no player {0}")]
    UnknownPlayer(PlayerId),

    /// Every sender of a player's mailbox is gone.
    #[error("mailbox of player {0} closed")]
    MailboxClosed(PlayerId),

    /// A game invariant does not hold.
    #[error("invariant violated: {0}")]
    Invariant(String),

    /// Credit bookkeeping failed.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// A grid operation failed.
    #[error("world error: {0}")]
    World(#[from] WorldError),

    /// Configuration was rejected.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// An AI player could not be created.
    #[error("AI error: {0}")]
    Ai(#[from] AiError),
}

/// Outcome of executing one action.
#[derive(Debug, thiserror::Error)]
pub enum ActionFailure {
    /// The action broke a rule and was not (fully) executed.
    #[error(transparent)]
    Illegal(#[from] IllegalAction),

    /// The game cannot continue.
    #[error(transparent)]
    Fatal(#[from] GameError),
}
