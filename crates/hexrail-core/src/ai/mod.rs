//! Computer players.
//!
//! An AI player is an [`AiController`]: given what its player may do and
//! the latest game snapshot, it decides which actions to submit. The
//! controller never touches the game directly. [`spawn_ai`] runs one on
//! the async runtime, wakes it whenever its player's state is published
//! and feeds its decisions into the player's mailbox.
//!
//! AI kinds are looked up by name in an [`AiRegistry`], so new kinds can
//! be added without touching the game loop.

pub mod basic;

use std::collections::BTreeMap;
use std::time::Duration;

use hexrail_types::{AiKind, GameSnapshot, PlayerAction, PlayerId, PlayerObjective, PlayerState};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::player_controller::ActionSender;

pub use basic::BasicAi;

/// Name of the AI kind every registry knows.
pub const BASIC_AI: &str = "basic";

/// Decides the actions of one computer player.
pub trait AiController: Send {
    /// Actions to submit for the published `state`, in order.
    ///
    /// Only called for non-idle objectives. Returning no action leaves
    /// the player waiting until its state is published again.
    fn decide(&mut self, state: &PlayerState, game: &GameSnapshot) -> Vec<PlayerAction>;
}

/// Settings handed to an AI factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AiParams {
    /// The controlled player.
    pub player: PlayerId,
    /// Seed for the AI's own randomness.
    pub seed: u64,
}

/// Builds an AI controller.
pub type AiFactory = fn(&AiParams) -> Box<dyn AiController>;

/// Errors from the AI registry.
#[derive(Debug, thiserror::Error)]
pub enum AiError {
    /// No factory is registered under this name.
    #[error("unknown AI kind '{kind}', known kinds: {known}")]
    UnknownKind {
        /// The requested kind.
        kind: AiKind,
        /// Comma-separated registered kinds.
        known: String,
    },
}

/// AI kinds by name.
#[derive(Debug, Clone, Default)]
pub struct AiRegistry {
    factories: BTreeMap<String, AiFactory>,
}

impl AiRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the built-in kinds.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(BASIC_AI, |params| Box::new(BasicAi::new(params)));
        registry
    }

    /// Register `factory` under `name`, replacing any previous one.
    pub fn register(&mut self, name: &str, factory: AiFactory) {
        self.factories.insert(name.to_owned(), factory);
    }

    /// Whether `kind` is registered.
    pub fn contains(&self, kind: &AiKind) -> bool {
        self.factories.contains_key(kind.as_str())
    }

    /// Registered kind names in order.
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Build a controller of the given kind.
    ///
    /// # Errors
    ///
    /// Returns [`AiError::UnknownKind`] if nothing is registered as `kind`.
    pub fn create(
        &self,
        kind: &AiKind,
        params: &AiParams,
    ) -> Result<Box<dyn AiController>, AiError> {
        let factory = self
            .factories
            .get(kind.as_str())
            .ok_or_else(|| AiError::UnknownKind {
                kind: kind.clone(),
                known: self.kinds().collect::<Vec<_>>().join(", "),
            })?;
        Ok(factory(params))
    }
}

/// Channels connecting an AI task to its player.
#[derive(Debug)]
pub struct AiChannels {
    /// The player's published state.
    pub state: watch::Receiver<PlayerState>,
    /// The latest game snapshot.
    pub game: watch::Receiver<GameSnapshot>,
    /// The player's mailbox.
    pub actions: ActionSender,
}

/// Run `controller` on the async runtime until its player is gone.
///
/// Every time the player's state is published with a non-idle objective
/// the task waits `think_delay`, then decides on the freshest state.
pub fn spawn_ai(
    mut controller: Box<dyn AiController>,
    mut channels: AiChannels,
    think_delay: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let player = channels.actions.player();
        info!(player = %player, "AI player started");

        while channels.state.changed().await.is_ok() {
            if channels.state.borrow().objective == PlayerObjective::Idle {
                continue;
            }
            if !think_delay.is_zero() {
                tokio::time::sleep(think_delay).await;
            }
            let state = channels.state.borrow_and_update().clone();
            if state.objective == PlayerObjective::Idle {
                continue;
            }
            let game = channels.game.borrow().clone();

            let actions = controller.decide(&state, &game);
            debug!(player = %player, objective = %state.objective, ?actions, "AI decided");
            for action in actions {
                if channels.actions.submit(action).is_err() {
                    info!(player = %player, "AI player stopped, mailbox closed");
                    return;
                }
            }
        }
        info!(player = %player, "AI player stopped");
    })
}
