//! Per-player turn handling.
//!
//! A [`PlayerController`] sits between the game loop and whoever decides
//! for one player (an AI task or a user interface). The game loop sets an
//! objective and blocks in [`await_next_action`]; the decider watches the
//! published [`PlayerState`] and submits actions through an
//! [`ActionSender`]. Every action is checked against the objective and
//! the game rules before it touches the [`GameState`].
//!
//! [`await_next_action`]: PlayerController::await_next_action

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use hexrail_ledger::{Account, CreditEntryKind};
use hexrail_types::{
    DrivableTile, EdgeKey, GameEvent, GamePhase, PlayerAction, PlayerId, PlayerObjective,
    PlayerState, Position,
};
use hexrail_world::HexGrid;
use rand::rngs::StdRng;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::dice::DiceSource;
use crate::drive::drivable_tiles;
use crate::error::{ActionFailure, GameError, IllegalAction};
use crate::events::GameEvents;
use crate::state::GameState;

// ---------------------------------------------------------------------------
// Turn context
// ---------------------------------------------------------------------------

/// Everything an action may touch while it executes.
pub struct TurnContext<'a> {
    /// The game.
    pub state: &'a mut GameState,
    /// Source of dice rolls.
    pub dice: &'a mut dyn DiceSource,
    /// Randomness for city choice.
    pub rng: &'a mut StdRng,
    /// Where game snapshots and events are published.
    pub events: &'a GameEvents,
}

// ---------------------------------------------------------------------------
// Mailbox
// ---------------------------------------------------------------------------

/// Cloneable handle submitting actions to one player's mailbox.
#[derive(Debug, Clone)]
pub struct ActionSender {
    player: PlayerId,
    tx: mpsc::UnboundedSender<PlayerAction>,
    /// Shared with the controller; set while the objective is idle.
    idle: Arc<AtomicBool>,
}

impl ActionSender {
    /// The player this handle acts for.
    pub const fn player(&self) -> PlayerId {
        self.player
    }

    /// Queue an action. Never blocks.
    ///
    /// Actions submitted while the player is idle are dropped and never
    /// executed.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::MailboxClosed`] if the controller is gone.
    pub fn submit(&self, action: PlayerAction) -> Result<(), GameError> {
        if self.idle.load(Ordering::Acquire) {
            debug!(player = %self.player, ?action, "Action dropped, player is idle");
            return Ok(());
        }
        self.tx
            .send(action)
            .map_err(|_closed| GameError::MailboxClosed(self.player))
    }
}

/// Price of one rail for one builder.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RailQuote {
    base: u32,
    fees: BTreeMap<PlayerId, u32>,
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// Turn state and action execution for one player.
#[derive(Debug)]
pub struct PlayerController {
    player: PlayerId,
    objective: PlayerObjective,
    building_budget: u32,
    /// Rented edges of the last path computation.
    rented_edges: BTreeSet<EdgeKey>,
    /// Tiles of the last computed path.
    route: Vec<Position>,
    has_path: bool,
    has_confirmed_path: bool,
    mailbox: mpsc::UnboundedReceiver<PlayerAction>,
    /// Kept so the mailbox never reports closed while the controller lives.
    sender: mpsc::UnboundedSender<PlayerAction>,
    idle: Arc<AtomicBool>,
    published: watch::Sender<PlayerState>,
}

impl PlayerController {
    /// A controller for `player` with an empty mailbox.
    pub fn new(player: PlayerId) -> Self {
        let (sender, mailbox) = mpsc::unbounded_channel();
        let (published, _) = watch::channel(PlayerState::idle(player));
        Self {
            player,
            objective: PlayerObjective::Idle,
            building_budget: 0,
            rented_edges: BTreeSet::new(),
            route: Vec::new(),
            has_path: false,
            has_confirmed_path: false,
            mailbox,
            sender,
            idle: Arc::new(AtomicBool::new(true)),
            published,
        }
    }

    /// The controlled player.
    pub const fn player(&self) -> PlayerId {
        self.player
    }

    /// Current objective.
    pub const fn objective(&self) -> PlayerObjective {
        self.objective
    }

    /// Budget left for building this turn.
    pub const fn building_budget(&self) -> u32 {
        self.building_budget
    }

    /// Set the budget for the next building turn.
    pub const fn set_building_budget(&mut self, budget: u32) {
        self.building_budget = budget;
    }

    /// Foreign rails used by the last computed path.
    pub const fn rented_edges(&self) -> &BTreeSet<EdgeKey> {
        &self.rented_edges
    }

    /// Tiles of the last computed path, start city first.
    pub fn route(&self) -> &[Position] {
        &self.route
    }

    /// Whether the last path computation found a path.
    pub const fn has_path(&self) -> bool {
        self.has_path
    }

    /// Whether the player accepted a path this round.
    pub const fn has_confirmed_path(&self) -> bool {
        self.has_confirmed_path
    }

    /// A handle for submitting actions to this player's mailbox.
    pub fn action_sender(&self) -> ActionSender {
        ActionSender {
            player: self.player,
            tx: self.sender.clone(),
            idle: Arc::clone(&self.idle),
        }
    }

    /// Observe this player's published [`PlayerState`].
    pub fn subscribe(&self) -> watch::Receiver<PlayerState> {
        self.published.subscribe()
    }

    // -------------------------------------------------------------------
    // Objectives and publication
    // -------------------------------------------------------------------

    /// Change the objective. Going idle is published immediately; other
    /// objectives are published when the controller starts waiting. While
    /// idle, submitted actions are dropped.
    pub fn set_objective(&mut self, objective: PlayerObjective, state: &GameState) {
        self.objective = objective;
        let idle = objective == PlayerObjective::Idle;
        self.idle.store(idle, Ordering::Release);
        if idle {
            self.publish(state);
        }
    }

    /// Publish the current projection to observers.
    pub fn publish(&self, state: &GameState) {
        self.published.send_replace(self.snapshot(state));
    }

    /// Compute what this player may do right now.
    pub fn snapshot(&self, state: &GameState) -> PlayerState {
        PlayerState {
            player: self.player,
            objective: self.objective,
            buildable_edges: self.buildable_rails(state),
            choosable_edges: self.choosable_edges(state),
            rented_edges: self.rented_edges.clone(),
            has_path: self.has_path,
            route: self.route.clone(),
            drivable_tiles: self.drivable_tiles(state),
            building_budget: self.building_budget,
        }
    }

    // -------------------------------------------------------------------
    // Waiting for actions
    // -------------------------------------------------------------------

    /// Set `objective`, then wait for and execute the next legal action.
    ///
    /// # Errors
    ///
    /// See [`await_next_action`](Self::await_next_action).
    pub fn await_next_action_with(
        &mut self,
        objective: PlayerObjective,
        ctx: &mut TurnContext<'_>,
    ) -> Result<PlayerAction, GameError> {
        self.set_objective(objective, ctx.state);
        self.await_next_action(ctx)
    }

    /// Block until an action arrives that the objective allows and the
    /// rules accept, execute it and return it.
    ///
    /// Rejected actions are logged and discarded, and the projection is
    /// published again. Must not be called from inside an async runtime.
    ///
    /// # Errors
    ///
    /// Returns a [`GameError`] if executing an action broke an invariant.
    pub fn await_next_action(
        &mut self,
        ctx: &mut TurnContext<'_>,
    ) -> Result<PlayerAction, GameError> {
        loop {
            ctx.events.publish(ctx.state.snapshot());
            self.publish(ctx.state);

            let action = self
                .mailbox
                .blocking_recv()
                .ok_or(GameError::MailboxClosed(self.player))?;
            if self.handle(&action, ctx)? {
                return Ok(action);
            }
        }
    }

    /// Execute at most one queued action without blocking.
    ///
    /// Returns `None` if the mailbox is empty or the action was rejected.
    ///
    /// # Errors
    ///
    /// Returns a [`GameError`] if executing the action broke an invariant.
    pub fn poll_next_action(
        &mut self,
        ctx: &mut TurnContext<'_>,
    ) -> Result<Option<PlayerAction>, GameError> {
        let action = match self.mailbox.try_recv() {
            Ok(action) => action,
            Err(mpsc::error::TryRecvError::Empty) => return Ok(None),
            Err(mpsc::error::TryRecvError::Disconnected) => {
                return Err(GameError::MailboxClosed(self.player));
            }
        };
        let executed = self.handle(&action, ctx)?;
        self.publish(ctx.state);
        Ok(executed.then_some(action))
    }

    /// Execute `action`; `Ok(false)` means it was rejected.
    fn handle(
        &mut self,
        action: &PlayerAction,
        ctx: &mut TurnContext<'_>,
    ) -> Result<bool, GameError> {
        debug!(player = %self.player, ?action, objective = %self.objective, "Action received");
        match self.execute(action, ctx) {
            Ok(()) => Ok(true),
            Err(ActionFailure::Illegal(reason)) => {
                warn!(player = %self.player, ?action, %reason, "Action discarded");
                Ok(false)
            }
            Err(ActionFailure::Fatal(error)) => Err(error),
        }
    }

    /// Check `action` against the objective and carry it out.
    ///
    /// # Errors
    ///
    /// [`ActionFailure::Illegal`] if the objective or the rules forbid the
    /// action, [`ActionFailure::Fatal`] if the game cannot continue.
    pub fn execute(
        &mut self,
        action: &PlayerAction,
        ctx: &mut TurnContext<'_>,
    ) -> Result<(), ActionFailure> {
        let kind = action.kind();
        if !self.objective.allows(kind) {
            return Err(IllegalAction::NotAllowed {
                kind,
                objective: self.objective,
            }
            .into());
        }

        match action {
            PlayerAction::RollDice => {
                let value = ctx.dice.roll();
                ctx.state.set_dice_roll(value);
                info!(player = %self.player, value, "Dice rolled");
                ctx.events.emit(GameEvent::DiceRolled {
                    player: self.player,
                    value,
                });
            }
            PlayerAction::BuildRail { edges } => self.build_rails(ctx.state, edges)?,
            PlayerAction::ConfirmBuild => {
                let rails = ctx.state.grid().rails(self.player).len();
                ctx.events.emit(GameEvent::BuildingFinished {
                    player: self.player,
                    rails: u32::try_from(rails).unwrap_or(u32::MAX),
                });
            }
            PlayerAction::ChooseCities => {
                let journey = ctx.state.choose_cities(ctx.rng)?;
                ctx.events.emit(GameEvent::CitiesChosen {
                    player: self.player,
                    journey,
                });
            }
            PlayerAction::ChooseRails { edges } => self.choose_edges(ctx.state, edges)?,
            PlayerAction::ConfirmDrive { accept } => {
                self.confirm_path(ctx.state, *accept)?;
                if ctx.state.is_driving(self.player) && *accept {
                    ctx.events.emit(GameEvent::PathConfirmed {
                        player: self.player,
                        rented: self.rented_edges.iter().copied().collect(),
                    });
                }
            }
            PlayerAction::Drive { tile } => {
                self.drive(ctx.state, *tile)?;
                ctx.events.emit(GameEvent::PlayerMoved {
                    player: self.player,
                    tile: *tile,
                });
            }
        }
        Ok(())
    }

    // -------------------------------------------------------------------
    // Building
    // -------------------------------------------------------------------

    fn quote_rail(&self, state: &GameState, edge: EdgeKey) -> Result<RailQuote, IllegalAction> {
        let grid = state.grid();
        let rejected = |source| IllegalAction::RailRejected { edge, source };
        grid.can_add_rail(edge, self.player).map_err(rejected)?;
        let base = grid.base_building_cost(edge).map_err(rejected)?;
        let fees = grid
            .parallel_cost_per_player(edge, self.player)
            .map_err(rejected)?;

        if base > self.building_budget {
            return Err(IllegalAction::OverBudget {
                edge,
                cost: base,
                budget: self.building_budget,
            });
        }
        let parallel = fees.values().fold(0_u32, |sum, fee| sum.saturating_add(*fee));
        let cost = if state.is_phase(GamePhase::Driving) {
            base.saturating_add(parallel)
        } else {
            parallel
        };
        let credits = state.credits(self.player);
        if cost > credits {
            return Err(IllegalAction::CannotAfford {
                edge,
                cost,
                credits,
            });
        }
        Ok(RailQuote { base, fees })
    }

    /// Whether the player may build on `edge` now.
    pub fn can_build_rail(&self, state: &GameState, edge: EdgeKey) -> bool {
        self.quote_rail(state, edge).is_ok()
    }

    /// Every edge the player may build on now.
    pub fn buildable_rails(&self, state: &GameState) -> BTreeSet<EdgeKey> {
        state
            .grid()
            .edges()
            .map(hexrail_world::Edge::key)
            .filter(|&edge| self.can_build_rail(state, edge))
            .collect()
    }

    /// Build one rail and settle its costs.
    ///
    /// Parallel fees go to the other owners, the base cost comes out of
    /// the building budget (and, in the driving phase, out of the
    /// player's credits too). Connecting a city that had no rail earns
    /// the connection bonus.
    ///
    /// # Errors
    ///
    /// [`ActionFailure::Illegal`] if the rail is not buildable.
    pub fn build_rail(&mut self, state: &mut GameState, edge: EdgeKey) -> Result<(), ActionFailure> {
        let quote = self.quote_rail(state, edge)?;
        let me = Account::Player(self.player);
        let new_cities = edge
            .positions()
            .into_iter()
            .filter(|&position| {
                state.grid().has_city(position) && !state.grid().is_city_connected(position)
            })
            .count();

        for (&owner, &fee) in &quote.fees {
            state.transfer(me, Account::Player(owner), fee, CreditEntryKind::ParallelFee)?;
        }
        if state.is_phase(GamePhase::Driving) {
            state.transfer(me, Account::Bank, quote.base, CreditEntryKind::BuildCost)?;
        }
        self.building_budget = self.building_budget.saturating_sub(quote.base);
        state.grid_mut().add_rail(edge, self.player).map_err(GameError::from)?;

        let bonus = state.config().city_connection_bonus;
        for _ in 0..new_cities {
            state.transfer(Account::Bank, me, bonus, CreditEntryKind::ConnectionBonus)?;
        }
        info!(
            player = %self.player,
            %edge,
            base = quote.base,
            fees = quote.fees.len(),
            new_cities,
            budget = self.building_budget,
            "Rail built"
        );
        Ok(())
    }

    /// Build rails on `edges` in order.
    ///
    /// Stops at the first rail that cannot be built; rails built before
    /// it stay built.
    ///
    /// # Errors
    ///
    /// [`IllegalAction::NothingBuildable`] if no edge is buildable at all,
    /// otherwise the failure of the first unbuildable rail.
    pub fn build_rails(
        &mut self,
        state: &mut GameState,
        edges: &[EdgeKey],
    ) -> Result<(), ActionFailure> {
        if self.buildable_rails(state).is_empty() {
            return Err(IllegalAction::NothingBuildable.into());
        }
        for &edge in edges {
            self.build_rail(state, edge)?;
        }
        Ok(())
    }

    // -------------------------------------------------------------------
    // Renting
    // -------------------------------------------------------------------

    fn rental_limit(&self, state: &GameState) -> u32 {
        state
            .credits(self.player)
            .min(state.config().max_rentable_distance)
    }

    /// Foreign rails the player may rent for the coming journey.
    ///
    /// Breadth-first from the player's network over rails the player does
    /// not own, at most as many edges deep as the player has credits (and
    /// never beyond the rental distance limit).
    pub fn choosable_edges(&self, state: &GameState) -> BTreeSet<EdgeKey> {
        let credits = state.credits(self.player);
        if credits == 0 || !state.is_phase(GamePhase::Driving) {
            return BTreeSet::new();
        }
        let grid = state.grid();
        let limit = self.rental_limit(state);
        let is_foreign_rail = |key: EdgeKey| {
            grid.edge(key)
                .is_some_and(|edge| edge.has_rail() && !edge.is_owned_by(self.player))
        };

        let mut choosable: BTreeSet<EdgeKey> = BTreeSet::new();
        let mut queue: VecDeque<(EdgeKey, u32)> = VecDeque::new();
        for rail in grid.rails(self.player) {
            for edge in grid.connected_edges(rail) {
                let key = edge.key();
                if is_foreign_rail(key) && choosable.insert(key) {
                    queue.push_back((key, 1));
                }
            }
        }

        while let Some((current, depth)) = queue.pop_front() {
            let next_depth = depth.saturating_add(1);
            if next_depth > limit {
                continue;
            }
            for edge in grid.connected_edges(current) {
                let key = edge.key();
                if is_foreign_rail(key) && choosable.insert(key) {
                    queue.push_back((key, next_depth));
                }
            }
        }
        choosable
    }

    /// Forget the path computed for the current journey.
    pub fn reset_driving_state(&mut self) {
        self.has_path = false;
        self.has_confirmed_path = false;
        self.rented_edges.clear();
        self.route.clear();
    }

    fn clear_rental(&mut self) {
        self.has_path = false;
        self.rented_edges.clear();
        self.route.clear();
    }

    /// Choose foreign rails to rent and compute the journey's path.
    ///
    /// The path runs from the journey's start to its target over the
    /// player's own rails and the chosen rails, priced by driving cost.
    /// Only the path's foreign edges are rented. Finding no path is not an
    /// error; `has_path` stays `false`.
    ///
    /// # Errors
    ///
    /// [`ActionFailure::Illegal`] if an edge is not choosable, too many
    /// edges are chosen, the rent is unaffordable, or there is no journey.
    /// Rental state is cleared on every failure.
    pub fn choose_edges(
        &mut self,
        state: &GameState,
        edges: &BTreeSet<EdgeKey>,
    ) -> Result<(), ActionFailure> {
        self.clear_rental();

        let choosable = self.choosable_edges(state);
        if let Some(&edge) = edges.iter().find(|edge| !choosable.contains(edge)) {
            return Err(IllegalAction::NotChoosable(edge).into());
        }
        let limit = state.config().max_rentable_distance;
        if edges.len() > usize::try_from(limit).unwrap_or(usize::MAX) {
            return Err(IllegalAction::TooManyRentals {
                chosen: edges.len(),
                limit,
            }
            .into());
        }
        let grid = state.grid();
        let rent = grid
            .total_renting_cost(edges, self.player)
            .map_err(GameError::from)?;
        let credits = state.credits(self.player);
        if rent > credits {
            return Err(IllegalAction::RentUnaffordable { rent, credits }.into());
        }
        let journey = state.journey().ok_or(IllegalAction::NoJourney)?;

        let mut allowed = grid.rails(self.player);
        allowed.extend(
            edges
                .iter()
                .copied()
                .filter(|&key| grid.edge(key).is_some_and(hexrail_world::Edge::has_rail)),
        );
        let path = grid.find_path(journey.start, journey.target, &allowed, |from, to| {
            grid.driving_cost(from, to).unwrap_or(u32::MAX)
        });
        if path.is_empty() {
            debug!(player = %self.player, chosen = edges.len(), "No path to the target");
            return Ok(());
        }

        self.has_path = true;
        self.rented_edges = path
            .iter()
            .copied()
            .filter(|&key| grid.edge(key).is_some_and(|edge| !edge.is_owned_by(self.player)))
            .collect();
        self.route = HexGrid::path_positions(journey.start, &path);
        debug!(
            player = %self.player,
            length = path.len(),
            rented = self.rented_edges.len(),
            "Path computed"
        );
        Ok(())
    }

    /// Accept or reject the computed path.
    ///
    /// Accepting with a path pays the rent, makes the player a driver and
    /// places them on the journey's start city. Accepting without a path
    /// sits the journey out.
    ///
    /// # Errors
    ///
    /// [`GameError`] if the rent can no longer be paid.
    pub fn confirm_path(&mut self, state: &mut GameState, accept: bool) -> Result<(), GameError> {
        if !accept {
            self.has_confirmed_path = false;
            self.clear_rental();
            return Ok(());
        }
        self.has_confirmed_path = true;
        if !self.has_path {
            info!(player = %self.player, "Sitting out this journey");
            return Ok(());
        }

        let me = Account::Player(self.player);
        for &key in &self.rented_edges {
            let rent = state.grid().renting_cost(key, self.player)?;
            for (owner, amount) in rent {
                state.transfer(me, Account::Player(owner), amount, CreditEntryKind::Rent)?;
            }
        }
        state.add_driving_player(self.player);
        if let Some(journey) = state.journey() {
            state.set_position(self.player, journey.start);
        }
        info!(
            player = %self.player,
            rented = self.rented_edges.len(),
            credits = state.credits(self.player),
            "Path confirmed"
        );
        Ok(())
    }

    // -------------------------------------------------------------------
    // Driving
    // -------------------------------------------------------------------

    /// Whether the player is a driver in the driving phase.
    pub fn can_drive(&self, state: &GameState) -> bool {
        state.is_phase(GamePhase::Driving) && state.is_driving(self.player)
    }

    /// Tiles the player may end this move on with the current roll.
    pub fn drivable_tiles(&self, state: &GameState) -> Vec<DrivableTile> {
        if !self.can_drive(state) {
            return Vec::new();
        }
        let Some(position) = state.position(self.player) else {
            return Vec::new();
        };
        let mut allowed = state.grid().rails(self.player);
        allowed.extend(self.rented_edges.iter().copied());
        drivable_tiles(
            state.grid(),
            position,
            state.journey().map(|journey| journey.target),
            &allowed,
            state.dice_roll(),
        )
    }

    /// Move to `tile`. Reaching the target adds the unused part of the
    /// roll to the player's surplus.
    ///
    /// # Errors
    ///
    /// [`IllegalAction::CannotDrive`] if the player is not driving, or
    /// [`IllegalAction::NotDrivable`] if `tile` is out of reach.
    pub fn drive(&mut self, state: &mut GameState, tile: Position) -> Result<(), ActionFailure> {
        if !self.can_drive(state) {
            return Err(IllegalAction::CannotDrive.into());
        }
        let option = self
            .drivable_tiles(state)
            .into_iter()
            .find(|option| option.tile == tile)
            .ok_or(IllegalAction::NotDrivable(tile))?;

        state.set_position(self.player, tile);
        if state.journey().is_some_and(|journey| journey.target == tile) {
            let left = state.dice_roll().saturating_sub(option.cost);
            state.add_point_surplus(self.player, i32::try_from(left).unwrap_or(i32::MAX));
            info!(player = %self.player, %tile, surplus = left, "Target reached");
        } else {
            debug!(player = %self.player, %tile, cost = option.cost, "Driven");
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;

    use super::*;
    use crate::dice::ScriptedDice;
    use crate::state::tests::{line_grid, state_with};

    fn edge(a: (i32, i32), b: (i32, i32)) -> EdgeKey {
        EdgeKey::new(Position::new(a.0, a.1), Position::new(b.0, b.1))
    }

    /// The rails `(0,0)-(1,0)` up to `(len-1,0)-(len,0)`.
    fn line_edges(len: i32) -> Vec<EdgeKey> {
        (0..len).map(|q| edge((q, 0), (q + 1, 0))).collect()
    }

    struct Table {
        state: GameState,
        dice: ScriptedDice,
        rng: StdRng,
        events: GameEvents,
    }

    impl Table {
        fn new(players: u32, phase: GamePhase) -> Self {
            let mut state = state_with(line_grid(), players);
            state.set_phase(phase);
            Self {
                state,
                dice: ScriptedDice::constant(4, 6),
                rng: StdRng::seed_from_u64(5),
                events: GameEvents::new(),
            }
        }

        fn ctx(&mut self) -> TurnContext<'_> {
            TurnContext {
                state: &mut self.state,
                dice: &mut self.dice,
                rng: &mut self.rng,
                events: &self.events,
            }
        }

        fn lay(&mut self, player: u32, edges: &[EdgeKey]) {
            for &key in edges {
                self.state.grid_mut().add_rail(key, PlayerId(player)).unwrap();
            }
        }
    }

    #[test]
    fn idle_player_discards_actions() {
        let mut table = Table::new(2, GamePhase::Building);
        let mut controller = PlayerController::new(PlayerId(1));
        let sender = controller.action_sender();

        sender.submit(PlayerAction::RollDice).unwrap();
        let executed = controller.poll_next_action(&mut table.ctx()).unwrap();
        assert_eq!(executed, None);
        assert_eq!(table.state.dice_roll(), 0);

        controller.set_objective(PlayerObjective::RollDice, &table.state);
        sender.submit(PlayerAction::RollDice).unwrap();
        let executed = controller.poll_next_action(&mut table.ctx()).unwrap();
        assert_eq!(executed, Some(PlayerAction::RollDice));
        assert_eq!(table.state.dice_roll(), 4);
        assert_eq!(controller.poll_next_action(&mut table.ctx()).unwrap(), None);
    }

    #[test]
    fn waiting_skips_illegal_actions() {
        let mut table = Table::new(2, GamePhase::Building);
        let mut controller = PlayerController::new(PlayerId(1));
        let sender = controller.action_sender();
        controller.set_objective(PlayerObjective::RollDice, &table.state);
        sender
            .submit(PlayerAction::Drive {
                tile: Position::new(1, 0),
            })
            .unwrap();
        sender.submit(PlayerAction::ConfirmBuild).unwrap();
        sender.submit(PlayerAction::RollDice).unwrap();

        let action = controller.await_next_action(&mut table.ctx()).unwrap();
        assert_eq!(action, PlayerAction::RollDice);
        assert_eq!(table.state.dice_roll(), 4);
    }

    #[test]
    fn waiting_ignores_actions_sent_while_idle() {
        let mut table = Table::new(2, GamePhase::Building);
        let mut controller = PlayerController::new(PlayerId(1));
        let sender = controller.action_sender();
        let rail = edge((0, 0), (1, 0));

        // Legal once the player places rails, but sent before that.
        sender
            .submit(PlayerAction::BuildRail { edges: vec![rail] })
            .unwrap();

        controller.set_building_budget(3);
        controller.set_objective(PlayerObjective::PlaceRail, &table.state);
        sender.submit(PlayerAction::ConfirmBuild).unwrap();

        let action = controller.await_next_action(&mut table.ctx()).unwrap();
        assert_eq!(action, PlayerAction::ConfirmBuild);
        assert!(table.state.grid().rails(PlayerId(1)).is_empty());
        assert_eq!(controller.building_budget(), 3);
        assert_eq!(controller.poll_next_action(&mut table.ctx()).unwrap(), None);
    }

    #[test]
    fn going_idle_closes_the_mailbox() {
        let mut table = Table::new(2, GamePhase::Building);
        let mut controller = PlayerController::new(PlayerId(1));
        let sender = controller.action_sender();

        controller.set_objective(PlayerObjective::RollDice, &table.state);
        controller.set_objective(PlayerObjective::Idle, &table.state);
        sender.submit(PlayerAction::RollDice).unwrap();

        controller.set_objective(PlayerObjective::RollDice, &table.state);
        assert_eq!(controller.poll_next_action(&mut table.ctx()).unwrap(), None);
        assert_eq!(table.state.dice_roll(), 0);
    }

    #[test]
    fn objective_change_is_published() {
        let table = Table::new(2, GamePhase::Building);
        let mut controller = PlayerController::new(PlayerId(1));
        let receiver = controller.subscribe();
        controller.set_objective(PlayerObjective::RollDice, &table.state);
        controller.publish(&table.state);
        assert_eq!(receiver.borrow().objective, PlayerObjective::RollDice);
        assert_eq!(
            receiver.borrow().allowed_actions(),
            PlayerObjective::RollDice.allowed_actions()
        );
    }

    #[test]
    fn building_phase_rail_costs_budget_and_earns_bonus() {
        let mut table = Table::new(2, GamePhase::Building);
        let mut controller = PlayerController::new(PlayerId(1));
        controller.set_building_budget(3);

        let buildable = controller.buildable_rails(&table.state);
        assert_eq!(buildable, [edge((0, 0), (1, 0))].into_iter().collect());

        controller
            .build_rails(&mut table.state, &[edge((0, 0), (1, 0)), edge((1, 0), (2, 0))])
            .unwrap();
        assert_eq!(controller.building_budget(), 1);
        // Ahausen was connected for the first time.
        assert_eq!(table.state.credits(PlayerId(1)), 26);
        table.state.verify_ledger().unwrap();
    }

    #[test]
    fn rail_over_budget_is_rejected() {
        let mut table = Table::new(2, GamePhase::Building);
        let mut controller = PlayerController::new(PlayerId(1));
        controller.set_building_budget(0);
        assert!(controller.buildable_rails(&table.state).is_empty());
        let result = controller.build_rails(&mut table.state, &[edge((0, 0), (1, 0))]);
        assert!(matches!(
            result,
            Err(ActionFailure::Illegal(IllegalAction::NothingBuildable))
        ));
    }

    #[test]
    fn parallel_rail_pays_the_owner() {
        let mut table = Table::new(2, GamePhase::Building);
        table.lay(2, &line_edges(2));
        let mut controller = PlayerController::new(PlayerId(1));
        controller.set_building_budget(6);

        controller
            .build_rail(&mut table.state, edge((0, 0), (1, 0)))
            .unwrap();
        // Parallel fee at a city, no bonus for an already connected city.
        assert_eq!(table.state.credits(PlayerId(1)), 17);
        assert_eq!(table.state.credits(PlayerId(2)), 23);
        table.state.verify_ledger().unwrap();
    }

    #[test]
    fn driving_phase_rail_costs_credits() {
        let mut table = Table::new(2, GamePhase::Driving);
        table.lay(1, &line_edges(1));
        let mut controller = PlayerController::new(PlayerId(1));
        controller.set_building_budget(10);

        controller
            .build_rail(&mut table.state, edge((1, 0), (2, 0)))
            .unwrap();
        assert_eq!(table.state.credits(PlayerId(1)), 19);
        assert_eq!(table.state.ledger().balance(Account::Bank), -39);
        table.state.verify_ledger().unwrap();
    }

    #[test]
    fn broke_player_has_nothing_to_rent() {
        let mut table = Table::new(2, GamePhase::Driving);
        table.lay(1, &line_edges(1));
        table.lay(2, &line_edges(7));
        let controller = PlayerController::new(PlayerId(1));
        assert_eq!(controller.choosable_edges(&table.state).len(), 6);

        table
            .state
            .transfer(
                Account::Player(PlayerId(1)),
                Account::Bank,
                20,
                CreditEntryKind::BuildCost,
            )
            .unwrap();
        assert!(controller.choosable_edges(&table.state).is_empty());
    }

    #[test]
    fn rental_depth_is_bounded_by_credits() {
        let mut table = Table::new(2, GamePhase::Driving);
        table.lay(1, &line_edges(1));
        table.lay(2, &line_edges(7));
        table
            .state
            .transfer(
                Account::Player(PlayerId(1)),
                Account::Bank,
                18,
                CreditEntryKind::BuildCost,
            )
            .unwrap();
        let controller = PlayerController::new(PlayerId(1));
        assert_eq!(
            controller.choosable_edges(&table.state),
            [edge((1, 0), (2, 0)), edge((2, 0), (3, 0))]
                .into_iter()
                .collect()
        );
    }

    #[test]
    fn own_rail_is_not_choosable() {
        let mut table = Table::new(2, GamePhase::Driving);
        table.lay(1, &line_edges(1));
        table.lay(2, &line_edges(7));
        table.state.choose_cities(&mut table.rng).unwrap();
        let mut controller = PlayerController::new(PlayerId(1));
        let chosen = [edge((0, 0), (1, 0))].into_iter().collect();
        let result = controller.choose_edges(&table.state, &chosen);
        assert!(matches!(
            result,
            Err(ActionFailure::Illegal(IllegalAction::NotChoosable(_)))
        ));
        assert!(!controller.has_path());
    }

    #[test]
    fn confirmed_path_pays_rent_and_places_driver() {
        let mut table = Table::new(2, GamePhase::Driving);
        table.lay(1, &line_edges(1));
        table.lay(2, &line_edges(7));
        let journey = table.state.choose_cities(&mut table.rng).unwrap();
        let mut controller = PlayerController::new(PlayerId(1));

        let choosable = controller.choosable_edges(&table.state);
        controller.choose_edges(&table.state, &choosable).unwrap();
        assert!(controller.has_path());
        assert_eq!(controller.route().first().copied(), Some(journey.start));
        assert_eq!(controller.route().last().copied(), Some(journey.target));
        let rented = u32::try_from(controller.rented_edges().len()).unwrap();
        assert!(rented > 0 || journey.start.distance(journey.target) == 1);

        controller.confirm_path(&mut table.state, true).unwrap();
        assert!(controller.has_confirmed_path());
        assert!(table.state.is_driving(PlayerId(1)));
        assert_eq!(table.state.position(PlayerId(1)), Some(journey.start));
        assert_eq!(table.state.credits(PlayerId(1)), 20 - rented);
        assert_eq!(table.state.credits(PlayerId(2)), 20 + rented);
        table.state.verify_ledger().unwrap();
    }

    #[test]
    fn rentals_without_a_path_are_discarded() {
        let mut table = Table::new(2, GamePhase::Driving);
        table.lay(1, &line_edges(1));
        table.lay(2, &line_edges(7));
        table.state.choose_cities(&mut table.rng).unwrap();
        let mut controller = PlayerController::new(PlayerId(1));

        let chosen = [edge((1, 0), (2, 0))].into_iter().collect();
        controller.choose_edges(&table.state, &chosen).unwrap();
        assert!(!controller.has_path());
        assert!(controller.rented_edges().is_empty());
        assert!(controller.route().is_empty());
    }

    #[test]
    fn rejected_path_clears_rentals() {
        let mut table = Table::new(2, GamePhase::Driving);
        table.lay(1, &line_edges(1));
        table.lay(2, &line_edges(7));
        table.state.choose_cities(&mut table.rng).unwrap();
        let mut controller = PlayerController::new(PlayerId(1));
        let choosable = controller.choosable_edges(&table.state);
        controller.choose_edges(&table.state, &choosable).unwrap();

        controller.confirm_path(&mut table.state, false).unwrap();
        assert!(!controller.has_path());
        assert!(!controller.has_confirmed_path());
        assert!(controller.rented_edges().is_empty());
        assert!(!table.state.is_driving(PlayerId(1)));
        assert_eq!(table.state.credits(PlayerId(1)), 20);
    }

    #[test]
    fn driving_onto_the_target_adds_surplus() {
        let mut table = Table::new(2, GamePhase::Driving);
        table.lay(1, &line_edges(7));
        let journey = table.state.choose_cities(&mut table.rng).unwrap();
        let mut controller = PlayerController::new(PlayerId(1));
        controller.choose_edges(&table.state, &BTreeSet::new()).unwrap();
        controller.confirm_path(&mut table.state, true).unwrap();
        assert!(controller.rented_edges().is_empty());

        table.state.set_dice_roll(10);
        let tiles = controller.drivable_tiles(&table.state);
        assert_eq!(tiles.len(), 1);
        let option = tiles.first().unwrap().clone();
        assert_eq!(option.tile, journey.target);

        controller.drive(&mut table.state, journey.target).unwrap();
        assert!(table.state.has_reached_target(PlayerId(1)));
        assert_eq!(
            table.state.point_surplus(PlayerId(1)),
            10 - i32::try_from(option.cost).unwrap()
        );
    }

    #[test]
    fn non_driver_cannot_drive() {
        let mut table = Table::new(2, GamePhase::Driving);
        let mut controller = PlayerController::new(PlayerId(1));
        assert!(controller.drivable_tiles(&table.state).is_empty());
        let result = controller.drive(&mut table.state, Position::new(1, 0));
        assert!(matches!(
            result,
            Err(ActionFailure::Illegal(IllegalAction::CannotDrive))
        ));
    }

    #[test]
    fn confirm_drive_action_emits_path_confirmed() {
        let mut table = Table::new(2, GamePhase::Driving);
        table.lay(1, &line_edges(7));
        table.state.choose_cities(&mut table.rng).unwrap();
        let mut events = table.events.subscribe_events();
        let mut controller = PlayerController::new(PlayerId(1));

        controller.set_objective(PlayerObjective::ChoosePath, &table.state);
        controller
            .execute(
                &PlayerAction::ChooseRails {
                    edges: BTreeSet::new(),
                },
                &mut table.ctx(),
            )
            .unwrap();
        controller.set_objective(PlayerObjective::ConfirmPath, &table.state);
        controller
            .execute(&PlayerAction::ConfirmDrive { accept: true }, &mut table.ctx())
            .unwrap();

        match events.try_recv().unwrap() {
            GameEvent::PathConfirmed { player, rented } => {
                assert_eq!(player, PlayerId(1));
                assert!(rented.is_empty());
            }
            other => panic!("unexpected event {other:?}"),
        }
    }
}
