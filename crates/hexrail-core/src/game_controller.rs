//! Turn orchestration.
//!
//! The [`GameController`] owns the [`GameState`] and one
//! [`PlayerController`] per player and runs the whole game on the calling
//! thread:
//!
//! 1. **Building phase.** A rotating roller throws the die; every player,
//!    starting with the roller, builds with the roll as budget. Repeats
//!    until few enough cities are left without a rail.
//! 2. **Driving phase.** Every third round is a building round with a
//!    fixed budget, poorest player first. Any other round a rotating
//!    chooser draws a journey, every player picks and confirms a path,
//!    and the drivers race to the target. Ends when fewer than two
//!    cities are left unvisited.
//! 3. **End.** The richest player wins.
//!
//! The game loop blocks while waiting for actions, so it must run on a
//! dedicated thread, never on an async executor.

use hexrail_ledger::{Account, CreditEntryKind};
use hexrail_types::{
    GameEvent, GamePhase, PlayerAction, PlayerId, PlayerObjective, PlayerState, PlayerSummary,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::dice::DiceSource;
use crate::error::GameError;
use crate::events::GameEvents;
use crate::operator::StopHandle;
use crate::player_controller::{ActionSender, PlayerController, TurnContext};
use crate::state::GameState;

/// Every this many driving-phase rounds is a building round instead.
const BUILDING_ROUND_INTERVAL: u32 = 3;

/// Result of a finished game.
#[derive(Debug, Clone)]
pub struct GameOutcome {
    /// The player with the most credits.
    pub winner: PlayerId,
    /// All players, richest first.
    pub standings: Vec<PlayerSummary>,
}

/// Runs a game from the first roll to the winner.
pub struct GameController {
    state: GameState,
    /// Index `n` controls player `n + 1`.
    controllers: Vec<PlayerController>,
    dice: Box<dyn DiceSource + Send>,
    rng: StdRng,
    events: GameEvents,
    stop: StopHandle,
}

impl GameController {
    /// A controller for every player already in `state`.
    pub fn new(state: GameState, dice: Box<dyn DiceSource + Send>, seed: u64) -> Self {
        let controllers = state
            .player_ids()
            .into_iter()
            .map(PlayerController::new)
            .collect();
        let events = GameEvents::new();
        events.publish(state.snapshot());
        Self {
            state,
            controllers,
            dice,
            rng: StdRng::seed_from_u64(seed),
            events,
            stop: StopHandle::new(),
        }
    }

    /// The game state.
    pub const fn state(&self) -> &GameState {
        &self.state
    }

    /// Event and snapshot channels of this game.
    pub const fn events(&self) -> &GameEvents {
        &self.events
    }

    /// Handle for stopping the game from another thread.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// The controller of `player`.
    pub fn player_controller(&self, player: PlayerId) -> Option<&PlayerController> {
        let index = usize::try_from(player.0).ok()?.checked_sub(1)?;
        self.controllers.get(index)
    }

    /// Mailbox handle of `player`.
    pub fn action_sender(&self, player: PlayerId) -> Option<ActionSender> {
        self.player_controller(player)
            .map(PlayerController::action_sender)
    }

    /// Observe what `player` may do.
    pub fn subscribe(&self, player: PlayerId) -> Option<watch::Receiver<PlayerState>> {
        self.player_controller(player).map(PlayerController::subscribe)
    }

    fn parts(
        &mut self,
        player: PlayerId,
    ) -> Result<(&mut PlayerController, TurnContext<'_>), GameError> {
        let Self {
            state,
            controllers,
            dice,
            rng,
            events,
            ..
        } = self;
        let controller = usize::try_from(player.0)
            .ok()
            .and_then(|id| id.checked_sub(1))
            .and_then(|index| controllers.get_mut(index))
            .ok_or(GameError::UnknownPlayer(player))?;
        let ctx = TurnContext {
            state,
            dice: &mut **dice,
            rng,
            events,
        };
        Ok((controller, ctx))
    }

    /// Make `player` the active player for the duration of `turn`.
    ///
    /// The player is set idle and deactivated afterwards, whether the
    /// turn succeeded or not.
    fn with_active_player<T>(
        &mut self,
        player: PlayerId,
        turn: impl FnOnce(&mut PlayerController, &mut TurnContext<'_>) -> Result<T, GameError>,
    ) -> Result<T, GameError> {
        if self.stop.is_stop_requested() {
            return Err(GameError::Stopped);
        }
        let (controller, mut ctx) = self.parts(player)?;
        ctx.state.set_active_player(Some(player));
        ctx.events.emit(GameEvent::ActivePlayerChanged {
            player: Some(player),
        });

        let result = turn(&mut *controller, &mut ctx);
        ctx.state.set_active_player(None);
        controller.set_objective(PlayerObjective::Idle, ctx.state);
        ctx.events
            .emit(GameEvent::ActivePlayerChanged { player: None });
        result
    }

    fn publish(&self) {
        self.events.publish(self.state.snapshot());
    }

    fn set_phase(&mut self, phase: GamePhase) {
        self.state.set_phase(phase);
        info!(?phase, "Phase started");
        self.events.emit(GameEvent::PhaseChanged { phase });
    }

    fn start_round(&mut self) -> u32 {
        let round = self.state.next_round();
        self.events.emit(GameEvent::RoundStarted { round });
        round
    }

    /// Players in turn order, starting with the `offset`-th.
    fn rotation(&self, offset: usize) -> Vec<PlayerId> {
        let mut order = self.state.player_ids();
        if !order.is_empty() {
            let shift = offset.checked_rem(order.len()).unwrap_or(0);
            order.rotate_left(shift);
        }
        order
    }

    // -------------------------------------------------------------------
    // Game
    // -------------------------------------------------------------------

    /// Play the game to the end.
    ///
    /// # Errors
    ///
    /// [`GameError::NotEnoughPlayers`] if too few players joined,
    /// [`GameError::Stopped`] if a stop was requested, or any error that
    /// broke a game invariant.
    pub fn start_game(&mut self) -> Result<GameOutcome, GameError> {
        let have = self.state.players().len();
        let need = self.state.config().min_players;
        if have < need {
            return Err(GameError::NotEnoughPlayers { have, need });
        }
        info!(
            players = have,
            cities = self.state.grid().city_count(),
            tiles = self.state.grid().tile_count(),
            "Game started"
        );

        self.building_phase()?;
        self.driving_phase()?;
        self.finish()
    }

    fn building_phase(&mut self) -> Result<(), GameError> {
        self.set_phase(GamePhase::Building);
        let threshold = self.state.config().unconnected_cities_start_threshold;
        let mut roller = 0_usize;

        while self.state.grid().unconnected_cities().count() > threshold {
            let round = self.start_round();
            let order = self.rotation(roller);
            let Some(&first) = order.first() else {
                return Ok(());
            };
            let roll = self.with_active_player(first, |controller, ctx| {
                controller.await_next_action_with(PlayerObjective::RollDice, ctx)?;
                Ok(ctx.state.dice_roll())
            })?;
            info!(round, player = %first, roll, "Building round");

            for player in order {
                self.building_turn(player, roll)?;
            }
            roller = roller.wrapping_add(1);
            self.publish();
        }
        info!(
            rounds = self.state.round(),
            unconnected = self.state.grid().unconnected_cities().count(),
            "Building phase finished"
        );
        Ok(())
    }

    /// Let `player` build until they confirm.
    fn building_turn(&mut self, player: PlayerId, budget: u32) -> Result<(), GameError> {
        self.with_active_player(player, |controller, ctx| {
            controller.set_building_budget(budget);
            loop {
                let action =
                    controller.await_next_action_with(PlayerObjective::PlaceRail, ctx)?;
                if action == PlayerAction::ConfirmBuild {
                    return Ok(());
                }
            }
        })
    }

    fn driving_phase(&mut self) -> Result<(), GameError> {
        self.set_phase(GamePhase::Driving);
        self.state.reset_round();
        let mut chooser = 0_usize;

        while self.state.unvisited_cities().len() >= 2 {
            let round = self.start_round();
            if round % BUILDING_ROUND_INTERVAL == 0 {
                self.building_round()?;
            } else {
                self.driving_round(round, chooser)?;
                chooser = chooser.wrapping_add(1);
            }
            self.publish();
        }
        info!(rounds = self.state.round(), "Driving phase finished");
        Ok(())
    }

    /// Fixed-budget building, poorest player first.
    fn building_round(&mut self) -> Result<(), GameError> {
        let budget = self.state.config().max_building_budget_driving_phase;
        let mut order = self.state.player_ids();
        order.sort_by_key(|&player| self.state.credits(player));
        info!(round = self.state.round(), budget, "Building round in driving phase");
        for player in order {
            self.building_turn(player, budget)?;
        }
        Ok(())
    }

    fn driving_round(&mut self, round: u32, chooser: usize) -> Result<(), GameError> {
        for controller in &mut self.controllers {
            controller.reset_driving_state();
        }
        self.state.clear_positions();
        self.state.reset_point_surplus();
        self.state.clear_driving_players();

        let order = self.rotation(chooser);
        let Some(&first) = order.first() else {
            return Ok(());
        };
        self.with_active_player(first, |controller, ctx| {
            controller
                .await_next_action_with(PlayerObjective::ChooseCities, ctx)
                .map(drop)
        })?;

        for player in order {
            self.with_active_player(player, |controller, ctx| {
                loop {
                    controller.await_next_action_with(PlayerObjective::ChoosePath, ctx)?;
                    controller.await_next_action_with(PlayerObjective::ConfirmPath, ctx)?;
                    if controller.has_confirmed_path() {
                        return Ok(());
                    }
                }
            })?;
        }

        self.handle_driving()?;
        self.award_winnings(round)
    }

    /// Race the confirmed drivers to the journey's target.
    ///
    /// Drivers move richest first. Once somebody has arrived, every
    /// driver still on the road loses one die's worth of surplus per
    /// turn. The race ends when every prize can be handed out or every
    /// driver has arrived.
    fn handle_driving(&mut self) -> Result<(), GameError> {
        let drivers = self.state.driving_players().to_vec();
        let journey = self
            .state
            .journey()
            .ok_or_else(|| GameError::Invariant("driving without a journey".to_owned()))?;

        match drivers.as_slice() {
            [] => {
                info!("Nobody drives this journey");
                return Ok(());
            }
            [lone] => {
                info!(player = %lone, "Lone driver arrives at once");
                self.state.set_position(*lone, journey.target);
                return Ok(());
            }
            _ => {}
        }

        let prizes = self.state.config().winning_credits.len();
        let needed = drivers.len().min(prizes);
        let penalty = i32::try_from(self.dice.sides()).unwrap_or(i32::MAX);

        loop {
            let (finished, mut on_the_road): (Vec<PlayerId>, Vec<PlayerId>) = drivers
                .iter()
                .copied()
                .partition(|&player| self.state.has_reached_target(player));
            if finished.len() >= needed || on_the_road.is_empty() {
                return Ok(());
            }
            if !finished.is_empty() {
                for &player in &on_the_road {
                    self.state.add_point_surplus(player, penalty.saturating_neg());
                }
            }

            on_the_road.sort_by_key(|&player| std::cmp::Reverse(self.state.credits(player)));
            for player in on_the_road {
                self.with_active_player(player, |controller, ctx| {
                    controller.await_next_action_with(PlayerObjective::RollDice, ctx)?;
                    if controller.drivable_tiles(ctx.state).is_empty() {
                        warn!(player = %controller.player(), "No drivable tile");
                        return Ok(());
                    }
                    controller
                        .await_next_action_with(PlayerObjective::Drive, ctx)
                        .map(drop)
                })?;
            }
            self.publish();
        }
    }

    /// Pay the prizes to the arrived drivers, best surplus first. Equal
    /// surplus goes to the earlier player.
    fn award_winnings(&mut self, round: u32) -> Result<(), GameError> {
        let mut winners: Vec<PlayerId> = self
            .state
            .driving_players()
            .iter()
            .copied()
            .filter(|&player| self.state.has_reached_target(player))
            .collect();
        winners.sort_by_key(|&player| {
            (std::cmp::Reverse(self.state.point_surplus(player)), player)
        });

        let prizes = self.state.config().winning_credits.clone();
        for (&player, &prize) in winners.iter().zip(&prizes) {
            self.state.transfer(
                Account::Bank,
                Account::Player(player),
                prize,
                CreditEntryKind::Winnings,
            )?;
            info!(
                round,
                player = %player,
                prize,
                surplus = self.state.point_surplus(player),
                "Prize awarded"
            );
        }
        winners.truncate(prizes.len());
        self.events.emit(GameEvent::RoundFinished { round, winners });
        Ok(())
    }

    fn finish(&mut self) -> Result<GameOutcome, GameError> {
        let winner = self
            .state
            .players()
            .iter()
            .fold(None::<(PlayerId, u32)>, |best, player| match best {
                Some((_, credits)) if credits >= player.credits() => best,
                _ => Some((player.id(), player.credits())),
            })
            .map(|(player, _)| player)
            .ok_or_else(|| GameError::Invariant("a game without players".to_owned()))?;

        self.state.set_winner(winner)?;
        self.state.verify_ledger()?;
        self.events.emit(GameEvent::GameOver { winner });
        self.publish();

        let mut standings: Vec<PlayerSummary> = self
            .state
            .players()
            .iter()
            .map(|player| self.state.summary(player))
            .collect();
        standings.sort_by_key(|summary| std::cmp::Reverse(summary.credits));
        info!(
            winner = %winner,
            credits = self.state.credits(winner),
            rounds = self.state.round(),
            "Game over"
        );
        Ok(GameOutcome { winner, standings })
    }
}

impl std::fmt::Debug for GameController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameController")
            .field("round", &self.state.round())
            .field("phase", &self.state.phase())
            .field("players", &self.controllers.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::{BTreeSet, VecDeque};
    use std::sync::Arc;
    use std::time::Duration;

    use hexrail_types::{EdgeKey, GameSnapshot, PlayerColor, Position, TileType};
    use hexrail_world::{City, CostTables, HexGrid};
    use tokio::sync::broadcast;
    use tokio::task::JoinHandle;

    use super::*;
    use crate::ai::{AiChannels, AiController, spawn_ai};
    use crate::config::GameConfig;
    use crate::dice::ScriptedDice;
    use crate::state::tests::{line_grid, state_with};

    /// Plays a fixed list of actions, one each time its player waits.
    struct Script(VecDeque<PlayerAction>);

    impl AiController for Script {
        fn decide(&mut self, _state: &PlayerState, _game: &GameSnapshot) -> Vec<PlayerAction> {
            self.0.pop_front().into_iter().collect()
        }
    }

    fn rail(a: i32, b: i32) -> EdgeKey {
        EdgeKey::new(Position::new(a, 0), Position::new(b, 0))
    }

    /// Gives every player in `railed` the whole line `(0,0)..(7,0)`.
    fn game_on(mut state: GameState, railed: &[u32], dice: ScriptedDice) -> GameController {
        for &player in railed {
            for q in 0..7 {
                state.grid_mut().add_rail(rail(q, q + 1), PlayerId(player)).unwrap();
            }
        }
        GameController::new(state, Box::new(dice), 9)
    }

    fn controller(players: u32, railed: &[u32]) -> GameController {
        game_on(
            state_with(line_grid(), players),
            railed,
            ScriptedDice::constant(6, 6),
        )
    }

    fn state_with_config(config: GameConfig, grid: HexGrid, players: u32) -> GameState {
        let mut state = GameState::new(Arc::new(config), grid);
        for n in 1..=players {
            state
                .add_player(format!("P{n}"), PlayerColor::new(0, 0, 0), None)
                .unwrap();
        }
        state
    }

    fn script(game: &GameController, player: u32, actions: Vec<PlayerAction>) -> JoinHandle<()> {
        let player = PlayerId(player);
        let channels = AiChannels {
            state: game.subscribe(player).unwrap(),
            game: game.events().subscribe_snapshots(),
            actions: game.action_sender(player).unwrap(),
        };
        spawn_ai(Box::new(Script(actions.into())), channels, Duration::ZERO)
    }

    /// Run `play` on a blocking thread, as the engine runs the game loop.
    async fn run<T, F>(mut game: GameController, play: F) -> (GameController, T)
    where
        T: Send + 'static,
        F: FnOnce(&mut GameController) -> T + Send + 'static,
    {
        tokio::time::timeout(
            Duration::from_secs(10),
            tokio::task::spawn_blocking(move || {
                let result = play(&mut game);
                (game, result)
            }),
        )
        .await
        .unwrap()
        .unwrap()
    }

    fn drain(events: &mut broadcast::Receiver<GameEvent>) -> Vec<GameEvent> {
        std::iter::from_fn(|| events.try_recv().ok()).collect()
    }

    fn activations(events: &[GameEvent]) -> Vec<u32> {
        events
            .iter()
            .filter_map(|event| match event {
                GameEvent::ActivePlayerChanged {
                    player: Some(player),
                } => Some(player.0),
                _ => None,
            })
            .collect()
    }

    fn rolls(events: &[GameEvent]) -> Vec<(u32, u32)> {
        events
            .iter()
            .filter_map(|event| match event {
                GameEvent::DiceRolled { player, value } => Some((player.0, *value)),
                _ => None,
            })
            .collect()
    }

    fn pick_path(accept: bool) -> Vec<PlayerAction> {
        vec![
            PlayerAction::ChooseRails {
                edges: BTreeSet::new(),
            },
            PlayerAction::ConfirmDrive { accept },
        ]
    }

    /// Roll, then drive to `(q,0)`, for every `q` in `stops`.
    fn drives(stops: &[i32]) -> Vec<PlayerAction> {
        stops
            .iter()
            .flat_map(|&q| {
                [
                    PlayerAction::RollDice,
                    PlayerAction::Drive {
                        tile: Position::new(q, 0),
                    },
                ]
            })
            .collect()
    }

    #[test]
    fn too_few_players_cannot_start() {
        let mut game = controller(1, &[]);
        let result = game.start_game();
        assert!(matches!(
            result,
            Err(GameError::NotEnoughPlayers { have: 1, need: 2 })
        ));
    }

    #[test]
    fn stop_request_ends_the_game() {
        let mut game = controller(2, &[1]);
        game.stop_handle().request_stop();
        assert!(matches!(game.start_game(), Err(GameError::Stopped)));
        assert_eq!(game.state().active_player(), None);
    }

    #[test]
    fn unknown_player_has_no_mailbox() {
        let game = controller(2, &[]);
        assert!(game.action_sender(PlayerId(0)).is_none());
        assert!(game.action_sender(PlayerId(3)).is_none());
        assert!(game.subscribe(PlayerId(2)).is_some());
    }

    #[test]
    fn unknown_player_is_never_activated() {
        let mut game = controller(2, &[]);
        let mut events = game.events().subscribe_events();

        let result = game.with_active_player(PlayerId(9), |_, _| Ok(()));
        assert!(matches!(result, Err(GameError::UnknownPlayer(PlayerId(9)))));
        assert_eq!(game.state().active_player(), None);
        assert!(drain(&mut events).is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn lone_driver_takes_the_first_prize() {
        let game = controller(2, &[1]);
        let mut events = game.events().subscribe_events();

        let mut first = vec![PlayerAction::ChooseCities];
        first.extend(pick_path(true));
        script(&game, 1, first);
        // Player 2 has no rails, finds no path and sits the journey out.
        script(&game, 2, pick_path(true));

        let (game, outcome) = run(game, GameController::start_game).await;
        let outcome = outcome.unwrap();
        assert_eq!(outcome.winner, PlayerId(1));
        assert_eq!(game.state().credits(PlayerId(1)), 40);
        assert_eq!(game.state().credits(PlayerId(2)), 20);
        assert_eq!(game.state().winner(), Some(PlayerId(1)));
        assert_eq!(game.state().unvisited_cities().len(), 1);
        let credits: Vec<u32> = outcome.standings.iter().map(|s| s.credits).collect();
        assert_eq!(credits, vec![40, 20]);

        let finished: Vec<_> = drain(&mut events)
            .into_iter()
            .filter_map(|event| match event {
                GameEvent::RoundFinished { round, winners } => Some((round, winners)),
                _ => None,
            })
            .collect();
        assert_eq!(finished, vec![(1, vec![PlayerId(1)])]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn rejected_path_is_chosen_again() {
        let game = controller(2, &[1]);
        let mut first = vec![PlayerAction::ChooseCities];
        first.extend(pick_path(false));
        first.extend(pick_path(true));
        script(&game, 1, first);

        let foreign = rail(0, 1);
        let mut second = vec![PlayerAction::ChooseRails {
            edges: [foreign].into_iter().collect(),
        }];
        second.extend(pick_path(false));
        second.extend(pick_path(true));
        script(&game, 2, second);

        let (game, outcome) = run(game, GameController::start_game).await;
        let outcome = outcome.unwrap();
        assert!(game.state().is_driving(PlayerId(1)));
        assert!(!game.state().is_driving(PlayerId(2)));
        assert_eq!(outcome.winner, PlayerId(1));
        game.state().verify_ledger().unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn building_rounds_rotate_the_roller_and_spend_the_roll() {
        let config = GameConfig {
            unconnected_cities_start_threshold: 1,
            ..GameConfig::default()
        };
        let state = state_with_config(config, line_grid(), 2);
        let game = game_on(state, &[], ScriptedDice::new([2, 4], 1, 6));
        let mut events = game.events().subscribe_events();

        // Each build asks for one rail more than the roll pays for.
        script(
            &game,
            1,
            vec![
                PlayerAction::RollDice,
                PlayerAction::BuildRail {
                    edges: vec![rail(0, 1), rail(1, 2), rail(2, 3)],
                },
                PlayerAction::ConfirmBuild,
                PlayerAction::ConfirmBuild,
            ],
        );
        script(
            &game,
            2,
            vec![
                PlayerAction::ConfirmBuild,
                PlayerAction::RollDice,
                PlayerAction::BuildRail {
                    edges: vec![rail(0, 1), rail(1, 2), rail(2, 3), rail(3, 4), rail(4, 5)],
                },
                PlayerAction::ConfirmBuild,
            ],
        );

        let (game, result) = run(game, GameController::building_phase).await;
        result.unwrap();

        let events = drain(&mut events);
        assert_eq!(rolls(&events), vec![(1, 2), (2, 4)]);
        assert_eq!(activations(&events), vec![1, 1, 2, 2, 2, 1]);

        let state = game.state();
        assert_eq!(state.round(), 2);
        assert_eq!(state.grid().rails(PlayerId(1)).len(), 2);
        assert_eq!(state.grid().rails(PlayerId(2)).len(), 4);
        assert_eq!(state.grid().unconnected_cities().count(), 1);
        // Player 1: bonus 6, then 3 + 5 in fees from player 2, who also
        // earns the bonus for reaching the middle city.
        assert_eq!(state.credits(PlayerId(1)), 34);
        assert_eq!(state.credits(PlayerId(2)), 18);
        state.verify_ledger().unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn every_third_driving_round_is_for_building() {
        let mut grid = HexGrid::from_tiles(
            CostTables::default(),
            (0..8).map(|q| (Position::new(q, 0), TileType::Plain)),
        );
        for (q, name) in [0, 1, 2, 3, 5, 7].into_iter().zip(["A", "B", "C", "D", "E", "F"]) {
            grid.add_city(City::new(Position::new(q, 0), name.into(), q == 0))
                .unwrap();
        }
        let mut game = game_on(state_with(grid, 2), &[], ScriptedDice::constant(3, 6));
        game.state
            .transfer(
                Account::Bank,
                Account::Player(PlayerId(1)),
                5,
                CreditEntryKind::Winnings,
            )
            .unwrap();
        let mut events = game.events().subscribe_events();

        let mut first = vec![PlayerAction::ChooseCities];
        first.extend(pick_path(true));
        first.extend(pick_path(true));
        first.push(PlayerAction::ConfirmBuild);
        first.push(PlayerAction::ChooseCities);
        first.extend(pick_path(true));
        script(&game, 1, first);

        let mut second = pick_path(true);
        second.push(PlayerAction::ChooseCities);
        second.extend(pick_path(true));
        second.push(PlayerAction::ConfirmBuild);
        second.extend(pick_path(true));
        script(&game, 2, second);

        let (game, result) = run(game, GameController::driving_phase).await;
        result.unwrap();

        let events = drain(&mut events);
        let finished: Vec<u32> = events
            .iter()
            .filter_map(|event| match event {
                GameEvent::RoundFinished { round, .. } => Some(*round),
                _ => None,
            })
            .collect();
        assert_eq!(finished, vec![1, 2, 4]);

        let choosers: Vec<u32> = events
            .iter()
            .filter_map(|event| match event {
                GameEvent::CitiesChosen { player, .. } => Some(player.0),
                _ => None,
            })
            .collect();
        assert_eq!(choosers, vec![1, 2, 1]);

        // Round 3: the poorer player builds first, both with the fixed budget.
        let round_three: Vec<GameEvent> = events
            .iter()
            .skip_while(|event| **event != GameEvent::RoundStarted { round: 3 })
            .take_while(|event| **event != GameEvent::RoundStarted { round: 4 })
            .cloned()
            .collect();
        let builders: Vec<u32> = round_three
            .iter()
            .filter_map(|event| match event {
                GameEvent::BuildingFinished { player, .. } => Some(player.0),
                _ => None,
            })
            .collect();
        assert_eq!(builders, vec![2, 1]);
        assert!(rolls(&round_three).is_empty());

        let budget = game.state().config().max_building_budget_driving_phase;
        for player in [PlayerId(1), PlayerId(2)] {
            assert_eq!(game.player_controller(player).unwrap().building_budget(), budget);
        }
        assert_eq!(game.state().round(), 4);
        assert!(game.state().unvisited_cities().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn late_drivers_lose_surplus_and_prizes_follow_surplus() {
        let dice = ScriptedDice::new([6, 5, 2, 4, 1, 3, 1, 2], 1, 6);
        let mut game = game_on(state_with(line_grid(), 3), &[1, 2, 3], dice);
        // Player 2 is the richest, then player 3, then player 1.
        for (player, amount) in [(2, 10), (3, 5)] {
            game.state
                .transfer(
                    Account::Bank,
                    Account::Player(PlayerId(player)),
                    amount,
                    CreditEntryKind::Winnings,
                )
                .unwrap();
        }
        let start = Position::new(0, 0);
        game.state.set_phase(GamePhase::Driving);
        game.state.start_journey(start, Position::new(7, 0));
        for player in [2, 3, 1] {
            game.state.add_driving_player(PlayerId(player));
            game.state.set_position(PlayerId(player), start);
        }
        let mut events = game.events().subscribe_events();

        script(&game, 1, drives(&[2, 5, 7]));
        script(&game, 2, drives(&[6, 7]));
        script(&game, 3, drives(&[5, 6, 7]));

        let (game, result) = run(game, |game| {
            game.handle_driving()?;
            game.award_winnings(1)
        })
        .await;
        result.unwrap();

        let events = drain(&mut events);
        // Richest first; player 2 is done after the second pass.
        assert_eq!(activations(&events), vec![2, 3, 1, 2, 3, 1, 3, 1]);
        assert_eq!(
            rolls(&events),
            vec![(2, 6), (3, 5), (1, 2), (2, 4), (3, 1), (1, 3), (3, 1), (1, 2)]
        );

        let state = game.state();
        assert_eq!(state.point_surplus(PlayerId(2)), 3);
        assert_eq!(state.point_surplus(PlayerId(3)), -6);
        assert_eq!(state.point_surplus(PlayerId(1)), -6);

        // Players 3 and 1 tie on surplus; the earlier player takes the prize.
        assert!(events.contains(&GameEvent::RoundFinished {
            round: 1,
            winners: vec![PlayerId(2), PlayerId(1)],
        }));
        assert_eq!(state.credits(PlayerId(2)), 50);
        assert_eq!(state.credits(PlayerId(1)), 30);
        assert_eq!(state.credits(PlayerId(3)), 25);
        state.verify_ledger().unwrap();
    }
}
