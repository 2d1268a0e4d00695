//! Random terrain and city generation.
//!
//! Generation is a pure function of the [`MapConfig`], the cost tables,
//! the random number generator and the name source, so a seeded RNG
//! always yields the same board.
//!
//! 1. One plain tile at the origin.
//! 2. `10 * scale` walks of `3 * scale` plain tiles, each starting from a
//!    random existing tile.
//! 3. `4 * scale` walks of `scale / 2` mountain tiles.
//! 4. One edge per adjacent tile pair.
//! 5. Cities on random plain tiles, accepted with a probability that
//!    depends on the surroundings.

use hexrail_types::{Direction, Position, TileType};
use rand::Rng;
use tracing::{debug, info};

use crate::config::{CostTables, MapConfig};
use crate::error::WorldError;
use crate::grid::HexGrid;
use crate::names::NameSource;
use crate::tile::City;

/// Attempts at drawing a city name not used yet before accepting a duplicate.
const NAME_ATTEMPTS: u32 = 8;

impl HexGrid {
    /// Generate a new board.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::CityPlacementExhausted`] if the cities do not
    /// fit on the generated land within the configured number of samples.
    pub fn generate(
        config: &MapConfig,
        costs: CostTables,
        rng: &mut impl Rng,
        names: &mut dyn NameSource,
    ) -> Result<Self, WorldError> {
        let mut grid = Self::new(costs);
        let mut land = vec![Position::ORIGIN];
        grid.set_tile(Position::ORIGIN, TileType::Plain);

        let scale = config.scale;
        for _ in 0..scale.saturating_mul(10) {
            grid.random_walk(&mut land, scale.saturating_mul(3), TileType::Plain, rng);
        }
        for _ in 0..scale.saturating_mul(4) {
            grid.random_walk(&mut land, scale / 2, TileType::Mountain, rng);
        }
        grid.connect_adjacent_tiles();
        grid.place_cities(config, rng, names)?;

        info!(
            tiles = grid.tile_count(),
            edges = grid.edge_count(),
            cities = grid.city_count(),
            starting_cities = grid.starting_cities().count(),
            "Grid generated"
        );
        Ok(grid)
    }

    /// Stamp `length` tiles of `tile_type` along a random walk that starts
    /// from a random tile in `land`.
    fn random_walk(
        &mut self,
        land: &mut Vec<Position>,
        length: u32,
        tile_type: TileType,
        rng: &mut impl Rng,
    ) {
        let Some(&start) = land.get(rng.random_range(0..land.len())) else {
            return;
        };
        let mut position = start;
        for _ in 0..length {
            let Some(&direction) = Direction::ALL.get(rng.random_range(0..Direction::ALL.len()))
            else {
                continue;
            };
            position = position.neighbour(direction);
            if self.tile(position).is_none() {
                land.push(position);
            }
            self.set_tile(position, tile_type);
        }
    }

    /// Founding probability at `position`; later rules override earlier ones.
    fn city_probability(&self, position: Position, config: &MapConfig) -> f64 {
        let mut probability = config.city_base_probability;
        if self.is_coastal(position) {
            probability = config.city_at_coast_probability;
        }
        if position
            .spiral(config.city_near_mountain_radius)
            .into_iter()
            .any(|p| self.tile_type(p) == Some(TileType::Mountain))
        {
            probability = config.city_near_mountain_probability;
        }
        if position
            .spiral(config.city_near_city_radius)
            .into_iter()
            .any(|p| self.has_city(p))
        {
            probability = config.city_near_city_probability;
        }
        probability
    }

    fn place_cities(
        &mut self,
        config: &MapConfig,
        rng: &mut impl Rng,
        names: &mut dyn NameSource,
    ) -> Result<(), WorldError> {
        let candidates: Vec<Position> = self
            .tiles()
            .filter(|tile| tile.tile_type() == TileType::Plain)
            .map(|tile| tile.position())
            .collect();
        let wanted = config.cities;
        let mut placed = 0_u32;
        let mut starting_placed = 0_u32;
        let mut attempts = 0_u32;

        while placed < wanted {
            if attempts >= config.max_placement_attempts || candidates.is_empty() {
                return Err(WorldError::CityPlacementExhausted {
                    placed,
                    wanted,
                    attempts,
                });
            }
            attempts = attempts.saturating_add(1);

            let Some(&position) = candidates.get(rng.random_range(0..candidates.len())) else {
                continue;
            };
            if self.has_city(position) {
                continue;
            }
            let probability = self.city_probability(position, config);
            if rng.random::<f64>() >= probability {
                continue;
            }

            let starting_needed = config.starting_cities.saturating_sub(starting_placed);
            let remaining = wanted.saturating_sub(placed);
            let starting =
                starting_needed > 0 && (remaining <= starting_needed || rng.random_bool(0.5));

            let name = self.unused_city_name(names, rng, config.city_name_length);
            debug!(%position, name = %name, starting, attempts, "City founded");
            self.add_city(City::new(position, name, starting))?;
            placed = placed.saturating_add(1);
            if starting {
                starting_placed = starting_placed.saturating_add(1);
            }
        }
        Ok(())
    }

    fn unused_city_name(
        &self,
        names: &mut dyn NameSource,
        rng: &mut impl Rng,
        max_length: usize,
    ) -> String {
        let mut name = names.generate_name(rng, max_length);
        for _ in 1..NAME_ATTEMPTS {
            if !self.cities().any(|city| city.name() == name) {
                break;
            }
            name = names.generate_name(rng, max_length);
        }
        name
    }
}
