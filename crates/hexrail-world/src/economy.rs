//! Prices of building, driving and renting on the grid.
//!
//! Building a rail costs a base price that depends on the terrain at both
//! ends. Building next to other players adds parallel fees owed to them:
//!
//! - every other owner of the same edge is owed the parallel fee (lower
//!   when either end is a city);
//! - at each non-city endpoint where the builder has no rail yet, every
//!   owner of another rail ending there is owed at least the junction fee.
//!
//! Fees owed to the same player from both rules are not added up; the
//! larger one counts.

use std::collections::BTreeMap;

use hexrail_types::{EdgeKey, PlayerId, Position};

use crate::edge::Edge;
use crate::error::WorldError;
use crate::grid::HexGrid;

impl HexGrid {
    fn existing_edge(&self, key: EdgeKey) -> Result<&Edge, WorldError> {
        self.edge(key).ok_or(WorldError::UnknownEdge(key))
    }

    /// Base building cost of `key`, from the terrain at both ends.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::UnknownEdge`] if the edge does not exist.
    pub fn base_building_cost(&self, key: EdgeKey) -> Result<u32, WorldError> {
        self.existing_edge(key)?;
        let [a, b] = key.positions();
        let a_type = self.tile_type(a).ok_or(WorldError::UnknownTile(a))?;
        let b_type = self.tile_type(b).ok_or(WorldError::UnknownTile(b))?;
        Ok(self.costs().building_cost(a_type, b_type))
    }

    /// Fees `player` would owe to other players for building on `key`.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::UnknownEdge`] if the edge does not exist.
    pub fn parallel_cost_per_player(
        &self,
        key: EdgeKey,
        player: PlayerId,
    ) -> Result<BTreeMap<PlayerId, u32>, WorldError> {
        let edge = self.existing_edge(key)?;
        let costs = self.costs();
        let mut fees: BTreeMap<PlayerId, u32> = BTreeMap::new();

        if edge.has_foreign_rail(player) {
            let fee = if self.touches_city(key) {
                costs.parallel_fee_at_city()
            } else {
                costs.parallel_fee()
            };
            for &owner in edge.owners() {
                if owner != player {
                    fees.insert(owner, fee);
                }
            }
        }

        for position in key.positions() {
            if self.has_city(position) {
                continue;
            }
            let junction_owners = self.junction_owners(position, key);
            if junction_owners.contains(&player) {
                continue;
            }
            for owner in junction_owners {
                let fee = fees.entry(owner).or_insert(0);
                *fee = (*fee).max(costs.junction_fee());
            }
        }

        Ok(fees)
    }

    /// Owners of the rails ending at `position`, other than on `except`.
    fn junction_owners(&self, position: Position, except: EdgeKey) -> Vec<PlayerId> {
        let mut owners: Vec<PlayerId> = self
            .incident_edges(position)
            .filter(|edge| edge.key() != except)
            .flat_map(|edge| edge.owners().iter().copied())
            .collect();
        owners.sort_unstable();
        owners.dedup();
        owners
    }

    /// Sum of the parallel fees for `player` building on `key`.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::UnknownEdge`] if the edge does not exist.
    pub fn total_parallel_cost(&self, key: EdgeKey, player: PlayerId) -> Result<u32, WorldError> {
        Ok(self
            .parallel_cost_per_player(key, player)?
            .values()
            .fold(0_u32, |sum, fee| sum.saturating_add(*fee)))
    }

    /// Base cost plus parallel fees for `player` building on `key`.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::UnknownEdge`] if the edge does not exist.
    pub fn total_building_cost(&self, key: EdgeKey, player: PlayerId) -> Result<u32, WorldError> {
        Ok(self
            .base_building_cost(key)?
            .saturating_add(self.total_parallel_cost(key, player)?))
    }

    /// Movement cost of a step from `from` onto the adjacent `to`.
    ///
    /// Returns `None` if either tile is missing or they are not adjacent.
    pub fn driving_cost(&self, from: Position, to: Position) -> Option<u32> {
        if !from.is_adjacent(to) {
            return None;
        }
        let from_type = self.tile_type(from)?;
        let to_type = self.tile_type(to)?;
        Some(self.costs().driving_cost(from_type, to_type))
    }

    /// Rent `player` owes each owner for using `key`. Free on own rails.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::UnknownEdge`] if the edge does not exist.
    pub fn renting_cost(
        &self,
        key: EdgeKey,
        player: PlayerId,
    ) -> Result<BTreeMap<PlayerId, u32>, WorldError> {
        let edge = self.existing_edge(key)?;
        if edge.is_owned_by(player) {
            return Ok(BTreeMap::new());
        }
        let rent = self.costs().rent_per_owner();
        Ok(edge.owners().iter().map(|&owner| (owner, rent)).collect())
    }

    /// Total rent `player` owes for using every edge in `keys`.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::UnknownEdge`] if any edge does not exist.
    pub fn total_renting_cost<'a>(
        &self,
        keys: impl IntoIterator<Item = &'a EdgeKey>,
        player: PlayerId,
    ) -> Result<u32, WorldError> {
        let mut total = 0_u32;
        for key in keys {
            let rent = self.renting_cost(*key, player)?;
            total = rent
                .values()
                .fold(total, |sum, fee| sum.saturating_add(*fee));
        }
        Ok(total)
    }
}
