//! Integration tests running whole games with AI players.
//!
//! The game loop runs on a blocking thread while the AI players run as
//! tasks on the multi-threaded runtime, the same way the engine binary
//! wires them.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use hexrail_core::config::{AiConfig, PlayerConfig};
use hexrail_core::{GameConfig, GameError, GameSetup};
use hexrail_types::{AiKind, GamePhase};
use hexrail_world::MapConfig;

fn ai_config(seed: u64, players: usize) -> GameConfig {
    GameConfig {
        seed: Some(seed),
        map: MapConfig {
            scale: 2,
            cities: 5,
            starting_cities: 2,
            ..MapConfig::default()
        },
        unconnected_cities_start_threshold: 2,
        ai: AiConfig { think_delay_ms: 0 },
        players: (0..players)
            .map(|_| PlayerConfig {
                name: String::new(),
                color: None,
                ai: Some(AiKind::new("basic")),
            })
            .collect(),
        ..GameConfig::default()
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn basic_ai_players_finish_a_game() {
    let mut game = GameSetup::new(ai_config(2024, 3)).build().unwrap();
    let ais = game.spawn_ai_players();
    assert_eq!(ais.len(), 3);
    let snapshots = game.controller.events().subscribe_snapshots();

    let mut controller = game.controller;
    let finished = tokio::time::timeout(
        Duration::from_secs(120),
        tokio::task::spawn_blocking(move || {
            let outcome = controller.start_game();
            (controller, outcome)
        }),
    )
    .await
    .unwrap()
    .unwrap();
    let (controller, outcome) = finished;
    let outcome = outcome.unwrap();

    let state = controller.state();
    assert_eq!(state.phase(), Some(GamePhase::Driving));
    assert!(state.unvisited_cities().len() < 2);
    assert!(state.grid().unconnected_cities().count() <= 2);
    state.verify_ledger().unwrap();

    let best = state.players().iter().map(|p| p.credits()).max().unwrap();
    assert_eq!(state.credits(outcome.winner), best);
    assert_eq!(outcome.standings.len(), 3);
    assert!(
        outcome
            .standings
            .windows(2)
            .all(|pair| pair.first().unwrap().credits >= pair.last().unwrap().credits)
    );
    assert_eq!(snapshots.borrow().winner, Some(outcome.winner));

    drop(controller);
    for handle in ais {
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn stop_request_interrupts_a_game() {
    let mut game = GameSetup::new(ai_config(7, 2)).build().unwrap();
    game.spawn_ai_players();
    let stop = game.controller.stop_handle();
    stop.request_stop();

    let mut controller = game.controller;
    let outcome = tokio::task::spawn_blocking(move || controller.start_game())
        .await
        .unwrap();
    assert!(matches!(outcome, Err(GameError::Stopped)));
}
