//! A simple computer player.
//!
//! Builds on random buildable edges until nothing is left to build,
//! rents every rail it may for a journey (and falls back to its own
//! network if that is refused), always accepts its path and drives as
//! far along its route as the dice allow.

use std::collections::BTreeSet;

use hexrail_types::{
    DrivableTile, GameSnapshot, PlayerAction, PlayerId, PlayerObjective, PlayerState, Position,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::IteratorRandom;

use super::{AiController, AiParams};

/// The built-in `basic` AI.
#[derive(Debug, Clone)]
pub struct BasicAi {
    player: PlayerId,
    rng: StdRng,
    /// Set once renting everything was tried for the current journey.
    tried_renting: bool,
}

impl BasicAi {
    /// A basic AI for `params.player`.
    pub fn new(params: &AiParams) -> Self {
        Self {
            player: params.player,
            rng: StdRng::seed_from_u64(params.seed),
            tried_renting: false,
        }
    }

    /// The controlled player.
    pub const fn player(&self) -> PlayerId {
        self.player
    }

    fn place_rail(&mut self, state: &PlayerState) -> PlayerAction {
        state
            .buildable_edges
            .iter()
            .copied()
            .choose(&mut self.rng)
            .map_or(PlayerAction::ConfirmBuild, |edge| PlayerAction::BuildRail {
                edges: vec![edge],
            })
    }

    fn choose_path(&mut self, state: &PlayerState) -> PlayerAction {
        let edges = if self.tried_renting || state.choosable_edges.is_empty() {
            BTreeSet::new()
        } else {
            self.tried_renting = true;
            state.choosable_edges.clone()
        };
        PlayerAction::ChooseRails { edges }
    }

    /// The tile furthest along the route, else the one closest to the
    /// target.
    fn drive(state: &PlayerState, game: &GameSnapshot) -> Option<PlayerAction> {
        let along_route = |option: &&DrivableTile| {
            state
                .route
                .iter()
                .position(|&tile| tile == option.tile)
        };
        let best = state
            .drivable_tiles
            .iter()
            .filter(|option| along_route(option).is_some())
            .max_by_key(|option| along_route(option))
            .or_else(|| {
                let target: Position = game.journey?.target;
                state
                    .drivable_tiles
                    .iter()
                    .min_by_key(|option| option.tile.distance(target))
            })
            .or_else(|| state.drivable_tiles.first())?;
        Some(PlayerAction::Drive { tile: best.tile })
    }
}

impl AiController for BasicAi {
    fn decide(&mut self, state: &PlayerState, game: &GameSnapshot) -> Vec<PlayerAction> {
        let action = match state.objective {
            PlayerObjective::Idle => None,
            PlayerObjective::RollDice => Some(PlayerAction::RollDice),
            PlayerObjective::PlaceRail => Some(self.place_rail(state)),
            PlayerObjective::ChooseCities => Some(PlayerAction::ChooseCities),
            PlayerObjective::ChoosePath => Some(self.choose_path(state)),
            PlayerObjective::ConfirmPath => {
                self.tried_renting = false;
                Some(PlayerAction::ConfirmDrive { accept: true })
            }
            PlayerObjective::Drive => Self::drive(state, game),
        };
        action.into_iter().collect()
    }
}
