//! Building a ready-to-run game from configuration.
//!
//! [`GameSetup`] collects the players, generates the board from the
//! seed, creates the AI controllers and hands back a [`PreparedGame`].
//! The game loop itself is started separately on its own thread; the AI
//! tasks need an async runtime.

use std::sync::Arc;
use std::time::Duration;

use hexrail_types::{AiKind, GameId, PlayerColor, PlayerId};
use hexrail_world::{HexGrid, MarkovNameGenerator};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::task::JoinHandle;
use tracing::info;

use crate::ai::{AiChannels, AiController, AiParams, AiRegistry, spawn_ai};
use crate::config::{GameConfig, PlayerConfig};
use crate::dice::RandomDice;
use crate::error::GameError;
use crate::game_controller::GameController;
use crate::state::GameState;

/// One player to seat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerSpec {
    /// Display name, generated when absent.
    pub name: Option<String>,
    /// Display colour, random when absent.
    pub color: Option<PlayerColor>,
    /// AI kind; `None` for a player driven through its mailbox.
    pub ai: Option<AiKind>,
}

impl From<&PlayerConfig> for PlayerSpec {
    fn from(config: &PlayerConfig) -> Self {
        Self {
            name: Some(config.name.trim().to_owned()).filter(|name| !name.is_empty()),
            color: config.color,
            ai: config.ai.clone(),
        }
    }
}

/// Collects the players of a new game.
#[derive(Debug)]
pub struct GameSetup {
    config: Arc<GameConfig>,
    players: Vec<PlayerSpec>,
    registry: AiRegistry,
}

impl GameSetup {
    /// A setup with the players listed in `config`.
    pub fn new(config: GameConfig) -> Self {
        let players = config.players.iter().map(PlayerSpec::from).collect();
        Self {
            config: Arc::new(config),
            players,
            registry: AiRegistry::with_defaults(),
        }
    }

    /// Use `registry` to look up AI kinds.
    #[must_use]
    pub fn with_registry(mut self, registry: AiRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Seat another player.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::TooManyPlayers`] if the game is full.
    pub fn add_player(&mut self, spec: PlayerSpec) -> Result<PlayerId, GameError> {
        let max = self.config.max_players;
        if self.players.len() >= max {
            return Err(GameError::TooManyPlayers { max });
        }
        self.players.push(spec);
        u32::try_from(self.players.len())
            .map(PlayerId)
            .map_err(|_overflow| GameError::TooManyPlayers { max })
    }

    /// Players seated so far.
    pub fn players(&self) -> &[PlayerSpec] {
        &self.players
    }

    /// Generate the board and seat everybody.
    ///
    /// # Errors
    ///
    /// Returns a [`GameError`] if an AI kind is unknown, the game is
    /// overfull or the board cannot be generated.
    pub fn build(self) -> Result<PreparedGame, GameError> {
        let seed = self.config.seed.unwrap_or_else(|| rand::rng().random());
        let mut rng = StdRng::seed_from_u64(seed);

        let mut ais: Vec<(PlayerId, Box<dyn AiController>)> = Vec::new();
        for (number, spec) in (1_u32..).zip(&self.players) {
            if let Some(kind) = &spec.ai {
                let params = AiParams {
                    player: PlayerId(number),
                    seed: seed ^ u64::from(number),
                };
                ais.push((PlayerId(number), self.registry.create(kind, &params)?));
            }
        }

        let mut names = MarkovNameGenerator::with_default_corpus()?;
        let grid = HexGrid::generate(
            &self.config.map,
            self.config.costs.clone(),
            &mut rng,
            &mut names,
        )?;

        let mut state = GameState::new(Arc::clone(&self.config), grid);
        for (number, spec) in (1_u32..).zip(self.players) {
            let name = spec.name.unwrap_or_else(|| format!("Player {number}"));
            let color = spec
                .color
                .unwrap_or_else(|| PlayerColor::new(rng.random(), rng.random(), rng.random()));
            state.add_player(name, color, spec.ai)?;
        }

        let dice = RandomDice::new(self.config.dice_sides, seed.wrapping_add(1));
        let controller = GameController::new(state, Box::new(dice), seed.wrapping_add(2));
        let id = GameId::new();
        info!(
            game = %id,
            seed,
            players = controller.state().players().len(),
            ai_players = ais.len(),
            "Game prepared"
        );
        Ok(PreparedGame {
            id,
            seed,
            controller,
            ais,
        })
    }
}

/// A game ready to start.
pub struct PreparedGame {
    /// Identifier of this game.
    pub id: GameId,
    /// Seed the board and dice were derived from.
    pub seed: u64,
    /// The game loop.
    pub controller: GameController,
    ais: Vec<(PlayerId, Box<dyn AiController>)>,
}

impl PreparedGame {
    /// Players controlled by an AI.
    pub fn ai_players(&self) -> Vec<PlayerId> {
        self.ais.iter().map(|(player, _)| *player).collect()
    }

    /// Start every AI player on the current async runtime.
    ///
    /// Must be called from within a Tokio runtime. Each task ends when
    /// the game controller is dropped.
    pub fn spawn_ai_players(&mut self) -> Vec<JoinHandle<()>> {
        let think_delay = Duration::from_millis(self.controller.state().config().ai.think_delay_ms);
        let snapshots = self.controller.events().subscribe_snapshots();
        let mut handles = Vec::with_capacity(self.ais.len());
        for (player, ai) in self.ais.drain(..) {
            let (Some(state), Some(actions)) = (
                self.controller.subscribe(player),
                self.controller.action_sender(player),
            ) else {
                continue;
            };
            let channels = AiChannels {
                state,
                game: snapshots.clone(),
                actions,
            };
            handles.push(spawn_ai(ai, channels, think_delay));
        }
        handles
    }
}

impl std::fmt::Debug for PreparedGame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreparedGame")
            .field("id", &self.id)
            .field("seed", &self.seed)
            .field("controller", &self.controller)
            .field("ai_players", &self.ai_players())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use hexrail_world::MapConfig;

    use super::*;

    fn small_config() -> GameConfig {
        GameConfig {
            seed: Some(17),
            map: MapConfig {
                scale: 2,
                cities: 5,
                starting_cities: 2,
                ..MapConfig::default()
            },
            unconnected_cities_start_threshold: 2,
            ..GameConfig::default()
        }
    }

    #[test]
    fn configured_players_are_seated_in_order() {
        let mut config = small_config();
        config.players = vec![
            PlayerConfig {
                name: "Ada".into(),
                color: Some(PlayerColor::new(255, 0, 0)),
                ai: Some(AiKind::new("basic")),
            },
            PlayerConfig {
                name: "  ".into(),
                color: None,
                ai: None,
            },
        ];
        let game = GameSetup::new(config).build().unwrap();
        let players = game.controller.state().players();
        assert_eq!(players.len(), 2);
        assert_eq!(players.first().unwrap().name(), "Ada");
        assert_eq!(players.get(1).unwrap().name(), "Player 2");
        assert_eq!(game.ai_players(), vec![PlayerId(1)]);
        assert_eq!(game.seed, 17);
    }

    #[test]
    fn same_seed_same_board() {
        let a = GameSetup::new(small_config()).build().unwrap();
        let b = GameSetup::new(small_config()).build().unwrap();
        let cities = |game: &PreparedGame| {
            game.controller
                .state()
                .grid()
                .cities()
                .map(|city| (city.position(), city.name().to_owned()))
                .collect::<Vec<_>>()
        };
        assert_eq!(cities(&a), cities(&b));
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn unknown_ai_kind_is_rejected() {
        let mut setup = GameSetup::new(small_config());
        setup
            .add_player(PlayerSpec {
                ai: Some(AiKind::new("oracle")),
                ..PlayerSpec::default()
            })
            .unwrap();
        assert!(matches!(setup.build(), Err(GameError::Ai(_))));
    }

    #[test]
    fn seats_are_limited() {
        let mut setup = GameSetup::new(GameConfig {
            max_players: 2,
            ..small_config()
        });
        assert_eq!(setup.add_player(PlayerSpec::default()).unwrap(), PlayerId(1));
        assert_eq!(setup.add_player(PlayerSpec::default()).unwrap(), PlayerId(2));
        assert!(matches!(
            setup.add_player(PlayerSpec::default()),
            Err(GameError::TooManyPlayers { max: 2 })
        ));
    }
}
