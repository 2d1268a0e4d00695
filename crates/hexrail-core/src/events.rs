//! Publication of game snapshots and events.
//!
//! Observers subscribe to a `watch` channel holding the latest
//! [`GameSnapshot`] and a `broadcast` channel of [`GameEvent`]s. Sending
//! never blocks the game loop and never fails because nobody listens.

use hexrail_types::{GameEvent, GameSnapshot};
use tokio::sync::{broadcast, watch};
use tracing::debug;

/// Events buffered per subscriber before the slowest one starts lagging.
pub const EVENT_CAPACITY: usize = 256;

/// Sending side of the game-wide channels.
#[derive(Debug, Clone)]
pub struct GameEvents {
    events: broadcast::Sender<GameEvent>,
    snapshots: watch::Sender<GameSnapshot>,
}

impl Default for GameEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl GameEvents {
    /// Create both channels with an empty initial snapshot.
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let (snapshots, _) = watch::channel(GameSnapshot::default());
        Self { events, snapshots }
    }

    /// Announce an event to every current subscriber.
    pub fn emit(&self, event: GameEvent) {
        debug!(?event, "Game event");
        // No subscribers is not an error.
        let _ = self.events.send(event);
    }

    /// Replace the published game snapshot.
    pub fn publish(&self, snapshot: GameSnapshot) {
        self.snapshots.send_replace(snapshot);
    }

    /// Receive every event emitted from now on.
    pub fn subscribe_events(&self) -> broadcast::Receiver<GameEvent> {
        self.events.subscribe()
    }

    /// Observe the latest game snapshot.
    pub fn subscribe_snapshots(&self) -> watch::Receiver<GameSnapshot> {
        self.snapshots.subscribe()
    }

    /// A copy of the latest published snapshot.
    pub fn latest(&self) -> GameSnapshot {
        self.snapshots.borrow().clone()
    }
}
