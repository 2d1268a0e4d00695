//! Headless game runner for hexrail.
//!
//! Loads configuration, seats the configured AI players, runs one game
//! to the end on a dedicated thread and records the result on the
//! leaderboard.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `hexrail-config.yaml` (or the path given as
//!    the first argument)
//! 2. Initialize structured logging (tracing)
//! 3. Generate the board and seat the players
//! 4. Start the AI players and the event logger
//! 5. Run the game loop on the `game-loop` thread; Ctrl-C stops it
//! 6. Log the standings and append them to the leaderboard

mod error;
mod leaderboard;
mod observer;

use std::path::{Path, PathBuf};

use chrono::Utc;
use hexrail_core::config::{LogFormat, LoggingConfig};
use hexrail_core::{GameConfig, GameError, GameOutcome, GameSetup};
use hexrail_types::GameId;
use tokio::sync::oneshot;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::leaderboard::{JsonLinesLeaderboard, LeaderboardEntry, LeaderboardStore};

/// Configuration file read when no path is given.
const DEFAULT_CONFIG_PATH: &str = "hexrail-config.yaml";

/// Leaderboard entries logged after a game.
const LEADERBOARD_TOP: usize = 5;

/// Application entry point for the engine.
///
/// # Errors
///
/// Returns an error if configuration, setup or the game itself fails.
#[tokio::main]
#[allow(clippy::too_many_lines)]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let config_path = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    let config = load_config(&config_path)?;

    // 2. Initialize structured logging.
    init_logging(&config.logging);
    info!(
        config = %config_path.display(),
        seed = ?config.seed,
        players = config.players.len(),
        cities = config.map.cities,
        "hexrail-engine starting"
    );

    // 3. Generate the board and seat the players.
    let leaderboard_config = config.leaderboard.clone();
    let mut game = GameSetup::new(config).build().map_err(EngineError::from)?;
    if let Some(human) = game
        .controller
        .state()
        .players()
        .iter()
        .find(|player| !player.is_ai())
    {
        return Err(EngineError::NoController {
            player: human.id(),
        }
        .into());
    }

    // 4. Start the AI players and the event logger.
    let ai_handles = game.spawn_ai_players();
    let logger = observer::spawn_event_logger(game.controller.events().subscribe_events());
    info!(ai_players = ai_handles.len(), game = %game.id, seed = game.seed, "Players started");

    // 5. Run the game loop.
    let stop = game.controller.stop_handle();
    let game_id = game.id;
    let mut controller = game.controller;
    let (done_tx, mut done_rx) = oneshot::channel();
    std::thread::Builder::new()
        .name("game-loop".to_owned())
        .spawn(move || {
            let outcome = controller.start_game();
            if done_tx.send((controller, outcome)).is_err() {
                error!("Engine stopped waiting for the game loop");
            }
        })
        .map_err(EngineError::from)?;

    let finished = tokio::select! {
        finished = &mut done_rx => finished,
        signal = tokio::signal::ctrl_c() => {
            match signal {
                Ok(()) => {
                    info!("Ctrl-C received, stopping after the current turn");
                    stop.request_stop();
                }
                Err(e) => warn!(error = %e, "Cannot listen for Ctrl-C"),
            }
            done_rx.await
        }
    };
    let (controller, outcome) = finished.map_err(|_closed| EngineError::GameLoopLost)?;

    // 6. Report the result.
    let result = match outcome {
        Ok(outcome) => {
            log_standings(&outcome);
            if leaderboard_config.enabled {
                record_result(&leaderboard_config.path, game_id, &outcome);
            }
            Ok(())
        }
        Err(GameError::Stopped) => {
            info!(round = controller.state().round(), "Game stopped by operator");
            Ok(())
        }
        Err(e) => Err(EngineError::from(e)),
    };

    drop(controller);
    for handle in ai_handles {
        if let Err(e) = handle.await {
            warn!(error = %e, "AI player task failed");
        }
    }
    match logger.await {
        Ok(events) => info!(events, "hexrail-engine shutdown complete"),
        Err(e) => warn!(error = %e, "Event logger task failed"),
    }

    result.map_err(Into::into)
}

/// Load the game configuration, falling back to defaults when the file
/// does not exist.
fn load_config(path: &Path) -> Result<GameConfig, EngineError> {
    if path.exists() {
        Ok(GameConfig::from_file(path)?)
    } else {
        eprintln!("{} not found, using defaults", path.display());
        Ok(GameConfig::default())
    }
}

/// Install the global tracing subscriber. `RUST_LOG` overrides the
/// configured level.
fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    match config.format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn log_standings(outcome: &GameOutcome) {
    for (place, summary) in (1_u32..).zip(&outcome.standings) {
        info!(
            place,
            player = %summary.id,
            name = %summary.name,
            credits = summary.credits,
            "Final standing"
        );
    }
}

/// Append the result to the leaderboard. Failures are logged only.
fn record_result(path: &Path, game_id: GameId, outcome: &GameOutcome) {
    let mut board = JsonLinesLeaderboard::new(path);
    let entries = LeaderboardEntry::from_outcome(game_id, outcome, Utc::now());
    if let Err(e) = board.append(&entries) {
        error!(error = %e, path = %board.path().display(), "Failed to record the result");
        return;
    }
    match board.load_all() {
        Ok(all) => {
            info!(entries = all.len(), path = %board.path().display(), "Result recorded");
            for entry in leaderboard::top_entries(all, LEADERBOARD_TOP) {
                info!(
                    name = %entry.player_name,
                    score = entry.score,
                    game = %entry.game_id,
                    "Leaderboard"
                );
            }
        }
        Err(e) => warn!(error = %e, "Failed to read the leaderboard"),
    }
}
