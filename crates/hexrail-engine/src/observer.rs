//! Structured log of game events.
//!
//! The headless engine has no front end, so the event stream is the
//! only account of the game. Each [`GameEvent`] becomes one log line.

use hexrail_types::GameEvent;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Log every event from `events` until the game is dropped.
///
/// The task resolves to the number of events logged.
pub fn spawn_event_logger(mut events: broadcast::Receiver<GameEvent>) -> JoinHandle<u64> {
    tokio::spawn(async move {
        let mut logged = 0_u64;
        loop {
            match events.recv().await {
                Ok(event) => {
                    log_event(&event);
                    logged = logged.saturating_add(1);
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Event logger fell behind");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        logged
    })
}

fn log_event(event: &GameEvent) {
    match event {
        GameEvent::PhaseChanged { phase } => info!(?phase, "Phase changed"),
        GameEvent::RoundStarted { round } => debug!(round, "Round started"),
        GameEvent::ActivePlayerChanged { player } => match player {
            Some(player) => debug!(player = %player, "Player activated"),
            None => debug!("No active player"),
        },
        GameEvent::DiceRolled { player, value } => debug!(player = %player, value, "Dice rolled"),
        GameEvent::BuildingFinished { player, rails } => {
            info!(player = %player, rails, "Building finished");
        }
        GameEvent::CitiesChosen { player, journey } => info!(
            player = %player,
            start = %journey.start,
            target = %journey.target,
            "Journey chosen"
        ),
        GameEvent::PathConfirmed { player, rented } => {
            info!(player = %player, rented = rented.len(), "Path confirmed");
        }
        GameEvent::PlayerMoved { player, tile } => debug!(player = %player, %tile, "Player moved"),
        GameEvent::RoundFinished { round, winners } => {
            let winners: Vec<String> = winners.iter().map(ToString::to_string).collect();
            info!(round, winners = %winners.join(","), "Round finished");
        }
        GameEvent::GameOver { winner } => info!(winner = %winner, "Game over"),
    }
}
