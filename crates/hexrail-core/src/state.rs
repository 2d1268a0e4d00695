//! The mutable state of one game.
//!
//! [`GameState`] is owned by the game loop thread. Controllers receive a
//! `&mut GameState` for the duration of a turn; observers only ever see
//! the immutable [`GameSnapshot`] produced by [`GameState::snapshot`].
//!
//! Every credit movement goes through [`GameState::transfer`], which
//! updates the players' balances and the [`Ledger`] together.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use hexrail_ledger::{Account, ConservationResult, CreditEntryKind, Ledger, LedgerError};
use hexrail_types::{
    AiKind, GamePhase, GameSnapshot, Journey, PlayerColor, PlayerId, PlayerSummary, Position,
    RailView,
};
use hexrail_world::HexGrid;
use rand::Rng;
use rand::seq::IndexedRandom;
use tracing::{debug, info};

use crate::config::GameConfig;
use crate::error::GameError;
use crate::player::Player;

/// Everything that changes during a game.
#[derive(Debug, Clone)]
pub struct GameState {
    config: Arc<GameConfig>,
    grid: HexGrid,
    /// Players in join order; `players[i].id() == PlayerId(i + 1)`.
    players: Vec<Player>,
    phase: Option<GamePhase>,
    /// Cities already used as start or target of a journey.
    chosen_cities: BTreeSet<Position>,
    journey: Option<Journey>,
    dice_roll: u32,
    round: u32,
    active_player: Option<PlayerId>,
    positions: BTreeMap<PlayerId, Position>,
    point_surplus: BTreeMap<PlayerId, i32>,
    /// Drivers of the current journey in confirmation order.
    driving_players: Vec<PlayerId>,
    winner: Option<PlayerId>,
    ledger: Ledger,
}

impl GameState {
    /// A fresh game on `grid` without players.
    pub fn new(config: Arc<GameConfig>, grid: HexGrid) -> Self {
        Self {
            config,
            grid,
            players: Vec::new(),
            phase: None,
            chosen_cities: BTreeSet::new(),
            journey: None,
            dice_roll: 0,
            round: 0,
            active_player: None,
            positions: BTreeMap::new(),
            point_surplus: BTreeMap::new(),
            driving_players: Vec::new(),
            winner: None,
            ledger: Ledger::new(),
        }
    }

    /// The configuration this game runs with.
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Shared handle to the configuration.
    pub fn config_arc(&self) -> Arc<GameConfig> {
        Arc::clone(&self.config)
    }

    /// The board.
    pub const fn grid(&self) -> &HexGrid {
        &self.grid
    }

    /// Mutable access to the board, for rail changes.
    pub const fn grid_mut(&mut self) -> &mut HexGrid {
        &mut self.grid
    }

    // -------------------------------------------------------------------
    // Players
    // -------------------------------------------------------------------

    /// Join a new player and grant the starting credits.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::TooManyPlayers`] if the game is full.
    pub fn add_player(
        &mut self,
        name: String,
        color: PlayerColor,
        ai: Option<AiKind>,
    ) -> Result<PlayerId, GameError> {
        let max = self.config.max_players;
        if self.players.len() >= max {
            return Err(GameError::TooManyPlayers { max });
        }
        let number = u32::try_from(self.players.len())
            .ok()
            .and_then(|count| count.checked_add(1))
            .ok_or(GameError::TooManyPlayers { max })?;
        let id = PlayerId(number);
        info!(player = %id, %name, ai = ?ai, "Player joined");
        self.players.push(Player::new(id, name, color, ai));

        let credits = self.config.starting_credits;
        self.transfer(
            Account::Bank,
            Account::Player(id),
            credits,
            CreditEntryKind::StartingCredits,
        )?;
        Ok(id)
    }

    /// All players in turn order.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Identifiers of all players in turn order.
    pub fn player_ids(&self) -> Vec<PlayerId> {
        self.players.iter().map(Player::id).collect()
    }

    /// The player with identifier `id`.
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        let index = usize::try_from(id.0).ok()?.checked_sub(1)?;
        self.players.get(index)
    }

    fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        let index = usize::try_from(id.0).ok()?.checked_sub(1)?;
        self.players.get_mut(index)
    }

    /// Credits of player `id`, 0 for unknown players.
    pub fn credits(&self, id: PlayerId) -> u32 {
        self.player(id).map_or(0, Player::credits)
    }

    /// Live balance of every player.
    pub fn credit_balances(&self) -> BTreeMap<PlayerId, u32> {
        self.players
            .iter()
            .map(|player| (player.id(), player.credits()))
            .collect()
    }

    // -------------------------------------------------------------------
    // Credits
    // -------------------------------------------------------------------

    /// Move `amount` credits between two accounts and record it.
    ///
    /// Moving nothing succeeds without a ledger entry. Either both sides
    /// change or neither does.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnknownPlayer`] for a missing player or a
    /// [`LedgerError`] if the payer cannot cover the amount or the payee's
    /// balance would overflow.
    pub fn transfer(
        &mut self,
        from: Account,
        to: Account,
        amount: u32,
        kind: CreditEntryKind,
    ) -> Result<(), GameError> {
        if amount == 0 {
            return Ok(());
        }
        if let Account::Player(payer) = from {
            let balance = self
                .player(payer)
                .ok_or(GameError::UnknownPlayer(payer))?
                .credits();
            if balance < amount {
                return Err(LedgerError::InsufficientCredits {
                    player: payer,
                    amount,
                    balance,
                }
                .into());
            }
        }
        if let Account::Player(payee) = to {
            let balance = self
                .player(payee)
                .ok_or(GameError::UnknownPlayer(payee))?
                .credits();
            if balance.checked_add(amount).is_none() {
                return Err(LedgerError::Overflow(to).into());
            }
        }

        self.ledger.record(self.round, kind, from, to, amount)?;
        if let Account::Player(payer) = from {
            if let Some(player) = self.player_mut(payer) {
                player.remove_credits(amount);
            }
        }
        if let Account::Player(payee) = to {
            if let Some(player) = self.player_mut(payee) {
                player.add_credits(amount);
            }
        }
        debug!(%from, %to, amount, ?kind, "Credits transferred");
        Ok(())
    }

    /// The credit ledger.
    pub const fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Check that replaying the ledger reproduces every live balance.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Invariant`] describing the divergence.
    pub fn verify_ledger(&self) -> Result<(), GameError> {
        match self.ledger.verify(&self.credit_balances()) {
            ConservationResult::Balanced => Ok(()),
            ConservationResult::Anomaly(anomaly) => Err(GameError::Invariant(anomaly.message)),
        }
    }

    // -------------------------------------------------------------------
    // Phase, round, dice
    // -------------------------------------------------------------------

    /// Current phase, `None` before the game starts.
    pub const fn phase(&self) -> Option<GamePhase> {
        self.phase
    }

    /// Whether the game is in `phase`.
    pub fn is_phase(&self, phase: GamePhase) -> bool {
        self.phase == Some(phase)
    }

    /// Enter a phase.
    pub const fn set_phase(&mut self, phase: GamePhase) {
        self.phase = Some(phase);
    }

    /// Round counter of the current phase.
    pub const fn round(&self) -> u32 {
        self.round
    }

    /// Advance the round counter and return the new round.
    pub const fn next_round(&mut self) -> u32 {
        self.round = self.round.saturating_add(1);
        self.round
    }

    /// Reset the round counter to zero.
    pub const fn reset_round(&mut self) {
        self.round = 0;
    }

    /// Value of the last roll.
    pub const fn dice_roll(&self) -> u32 {
        self.dice_roll
    }

    /// Store a rolled value.
    pub const fn set_dice_roll(&mut self, value: u32) {
        self.dice_roll = value;
    }

    /// Player whose turn it is.
    pub const fn active_player(&self) -> Option<PlayerId> {
        self.active_player
    }

    /// Hand the turn to a player, or to nobody.
    pub const fn set_active_player(&mut self, player: Option<PlayerId>) {
        self.active_player = player;
    }

    // -------------------------------------------------------------------
    // Journeys
    // -------------------------------------------------------------------

    /// Cities not yet used as start or target, in position order.
    pub fn unvisited_cities(&self) -> Vec<Position> {
        self.grid
            .cities()
            .map(hexrail_world::City::position)
            .filter(|position| !self.chosen_cities.contains(position))
            .collect()
    }

    /// Cities already used as start or target.
    pub const fn chosen_cities(&self) -> &BTreeSet<Position> {
        &self.chosen_cities
    }

    /// Pick two distinct unvisited cities as start and target of the next
    /// journey and mark both as visited.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Invariant`] if fewer than two unvisited cities
    /// remain.
    pub fn choose_cities(&mut self, rng: &mut impl Rng) -> Result<Journey, GameError> {
        let unvisited = self.unvisited_cities();
        let picked: Vec<Position> = unvisited.choose_multiple(rng, 2).copied().collect();
        let (Some(&start), Some(&target)) = (picked.first(), picked.get(1)) else {
            return Err(GameError::Invariant(format!(
                "{} unvisited cities left, a journey needs two",
                unvisited.len()
            )));
        };
        let journey = self.start_journey(start, target);
        info!(%start, %target, round = self.round, "Cities chosen");
        Ok(journey)
    }

    /// Make `start` to `target` the current journey and mark both cities
    /// as visited.
    pub fn start_journey(&mut self, start: Position, target: Position) -> Journey {
        self.chosen_cities.insert(start);
        self.chosen_cities.insert(target);
        let journey = Journey { start, target };
        self.journey = Some(journey);
        journey
    }

    /// The current journey.
    pub const fn journey(&self) -> Option<Journey> {
        self.journey
    }

    /// Tile a player is standing on during a journey.
    pub fn position(&self, player: PlayerId) -> Option<Position> {
        self.positions.get(&player).copied()
    }

    /// Place a player on a tile.
    pub fn set_position(&mut self, player: PlayerId, position: Position) {
        self.positions.insert(player, position);
    }

    /// Take every player off the board.
    pub fn clear_positions(&mut self) {
        self.positions.clear();
    }

    /// Point surplus of a player in the current journey.
    pub fn point_surplus(&self, player: PlayerId) -> i32 {
        self.point_surplus.get(&player).copied().unwrap_or(0)
    }

    /// Add `delta` (possibly negative) to a player's surplus.
    pub fn add_point_surplus(&mut self, player: PlayerId, delta: i32) {
        let surplus = self.point_surplus.entry(player).or_insert(0);
        *surplus = surplus.saturating_add(delta);
    }

    /// Reset every surplus to zero.
    pub fn reset_point_surplus(&mut self) {
        self.point_surplus.clear();
    }

    /// Drivers of the current journey in confirmation order.
    pub fn driving_players(&self) -> &[PlayerId] {
        &self.driving_players
    }

    /// Whether a player takes part in the current journey.
    pub fn is_driving(&self, player: PlayerId) -> bool {
        self.driving_players.contains(&player)
    }

    /// Add a player to the drivers. Adding twice has no effect.
    pub fn add_driving_player(&mut self, player: PlayerId) {
        if !self.is_driving(player) {
            self.driving_players.push(player);
        }
    }

    /// Remove every driver.
    pub fn clear_driving_players(&mut self) {
        self.driving_players.clear();
    }

    /// Whether a driver stands on the journey's target.
    pub fn has_reached_target(&self, player: PlayerId) -> bool {
        self.journey
            .is_some_and(|journey| self.position(player) == Some(journey.target))
    }

    // -------------------------------------------------------------------
    // Winner
    // -------------------------------------------------------------------

    /// Winner of the game, once decided.
    pub const fn winner(&self) -> Option<PlayerId> {
        self.winner
    }

    /// Record the winner.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Invariant`] if a winner was already recorded.
    pub fn set_winner(&mut self, player: PlayerId) -> Result<(), GameError> {
        if let Some(existing) = self.winner {
            return Err(GameError::Invariant(format!(
                "winner already decided as player {existing}"
            )));
        }
        self.winner = Some(player);
        Ok(())
    }

    // -------------------------------------------------------------------
    // Snapshots
    // -------------------------------------------------------------------

    /// Public summary of one player.
    pub fn summary(&self, player: &Player) -> PlayerSummary {
        let id = player.id();
        PlayerSummary {
            id,
            name: player.name().to_owned(),
            color: player.color(),
            ai: player.ai().cloned(),
            credits: player.credits(),
            position: self.position(id),
            point_surplus: self.point_surplus(id),
            driving: self.is_driving(id),
        }
    }

    /// Immutable view of the whole game for observers.
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            phase: self.phase,
            round: self.round,
            dice_roll: self.dice_roll,
            active_player: self.active_player,
            journey: self.journey,
            chosen_cities: self.chosen_cities.iter().copied().collect(),
            players: self
                .players
                .iter()
                .map(|player| self.summary(player))
                .collect(),
            rails: self
                .grid
                .railed_edges()
                .map(|edge| RailView {
                    edge: edge.key(),
                    owners: edge.owners().to_vec(),
                })
                .collect(),
            winner: self.winner,
        }
    }
}
