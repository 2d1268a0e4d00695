//! Error types for the engine binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during engine startup and the game run.

use hexrail_types::PlayerId;

/// Top-level error for the engine binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: hexrail_core::config::ConfigError,
    },

    /// Setting up or running the game failed.
    #[error("game error: {source}")]
    Game {
        /// The underlying game error.
        #[from]
        source: hexrail_core::GameError,
    },

    /// A player has nobody to act for it.
    #[error("player {player} has no AI kind; the headless engine only runs AI players")]
    NoController {
        /// The player without an AI.
        player: PlayerId,
    },

    /// The game-loop thread could not be started.
    #[error("failed to start the game loop: {source}")]
    Thread {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// The game-loop thread ended without reporting a result.
    #[error("game loop ended without a result")]
    GameLoopLost,
}
