//! Game state, turn orchestration and computer players for hexrail.
//!
//! A game runs in two phases on one dedicated thread. Players extend
//! their rail networks during the building phase, then race each other
//! between pairs of cities during the driving phase, renting rails from
//! their rivals where their own network falls short.
//!
//! Every decision is an action submitted to the acting player's mailbox.
//! The game loop blocks until an action arrives that the player's
//! current objective allows, so AI players and interactive front ends
//! plug in the same way.
//!
//! # Modules
//!
//! - [`ai`] -- [`AiController`] trait, registry, async AI task and the
//!   built-in basic AI.
//! - [`config`] -- Configuration loading from `hexrail-config.yaml` into
//!   strongly-typed structs.
//! - [`dice`] -- [`DiceSource`] trait, seeded and scripted dice.
//! - [`drive`] -- Tiles reachable within one dice roll.
//! - [`error`] -- Rule violations and fatal game errors.
//! - [`events`] -- Game event broadcast and snapshot publication.
//! - [`game_controller`] -- The phase and round loop.
//! - [`operator`] -- Stopping a running game from outside.
//! - [`player`] -- Player identity and credits.
//! - [`player_controller`] -- Per-player mailbox and action execution.
//! - [`setup`] -- Building a game from configuration.
//! - [`state`] -- [`GameState`]: the mutable game aggregate.
//!
//! [`AiController`]: ai::AiController
//! [`DiceSource`]: dice::DiceSource
//! [`GameState`]: state::GameState

pub mod ai;
pub mod config;
pub mod dice;
pub mod drive;
pub mod error;
pub mod events;
pub mod game_controller;
pub mod operator;
pub mod player;
pub mod player_controller;
pub mod setup;
pub mod state;

// Re-export primary types at crate root.
pub use config::GameConfig;
pub use error::{ActionFailure, GameError, IllegalAction};
pub use game_controller::{GameController, GameOutcome};
pub use player_controller::{ActionSender, PlayerController};
pub use setup::{GameSetup, PlayerSpec, PreparedGame};
pub use state::GameState;
