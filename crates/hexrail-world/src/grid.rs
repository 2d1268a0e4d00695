//! The hex grid graph: tiles as nodes, edges between every adjacent pair.
//!
//! The [`HexGrid`] owns all [`Tile`]s, [`Edge`]s and [`City`]s of a game.
//! Tiles and cities are fixed after generation; edges persist for the
//! whole game and only their owner lists change.
//!
//! All collections are `BTreeMap`s keyed by [`Position`] or [`EdgeKey`]
//! so iteration order, and therefore every derived query, is
//! deterministic.

use std::collections::{BTreeMap, BTreeSet};

use hexrail_types::{Direction, EdgeKey, PlayerId, Position, TileType};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::CostTables;
use crate::edge::Edge;
use crate::error::WorldError;
use crate::tile::{City, Tile};

/// Tiles, edges, cities and the cost tables that price them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HexGrid {
    /// All tiles indexed by position.
    tiles: BTreeMap<Position, Tile>,
    /// All edges indexed by their unordered endpoint pair.
    edges: BTreeMap<EdgeKey, Edge>,
    /// Cities indexed by the tile they stand on.
    cities: BTreeMap<Position, City>,
    /// Building, driving and fee tables.
    costs: CostTables,
}

impl HexGrid {
    /// Create an empty grid priced by `costs`.
    pub const fn new(costs: CostTables) -> Self {
        Self {
            tiles: BTreeMap::new(),
            edges: BTreeMap::new(),
            cities: BTreeMap::new(),
            costs,
        }
    }

    /// Create a grid from tiles and connect every adjacent pair.
    pub fn from_tiles(
        costs: CostTables,
        tiles: impl IntoIterator<Item = (Position, TileType)>,
    ) -> Self {
        let mut grid = Self::new(costs);
        for (position, tile_type) in tiles {
            grid.set_tile(position, tile_type);
        }
        grid.connect_adjacent_tiles();
        grid
    }

    /// The cost tables of this grid.
    pub const fn costs(&self) -> &CostTables {
        &self.costs
    }

    // -------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------

    /// Put a tile at `position`, replacing any tile already there.
    pub fn set_tile(&mut self, position: Position, tile_type: TileType) {
        self.tiles.insert(position, Tile::new(position, tile_type));
    }

    /// Create an edge between two adjacent tiles. Existing edges are kept.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::UnknownTile`] if either tile is missing, or
    /// [`WorldError::NotAdjacent`] if the tiles are not neighbours.
    pub fn add_edge(&mut self, a: Position, b: Position) -> Result<(), WorldError> {
        for position in [a, b] {
            if !self.tiles.contains_key(&position) {
                return Err(WorldError::UnknownTile(position));
            }
        }
        if !a.is_adjacent(b) {
            return Err(WorldError::NotAdjacent { a, b });
        }
        let key = EdgeKey::new(a, b);
        self.edges.entry(key).or_insert_with(|| Edge::new(key));
        Ok(())
    }

    /// Create one edge for every pair of adjacent tiles.
    pub fn connect_adjacent_tiles(&mut self) {
        let positions: Vec<Position> = self.tiles.keys().copied().collect();
        for position in positions {
            for neighbour in position.neighbours() {
                if self.tiles.contains_key(&neighbour) {
                    let key = EdgeKey::new(position, neighbour);
                    self.edges.entry(key).or_insert_with(|| Edge::new(key));
                }
            }
        }
        debug!(
            tiles = self.tiles.len(),
            edges = self.edges.len(),
            "Adjacent tiles connected"
        );
    }

    /// Found a city.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::UnknownTile`] if there is no tile,
    /// [`WorldError::CityNotOnPlain`] if the tile is not plain, or
    /// [`WorldError::DuplicateCity`] if a city already stands there.
    pub fn add_city(&mut self, city: City) -> Result<(), WorldError> {
        let position = city.position();
        let tile = self
            .tiles
            .get(&position)
            .ok_or(WorldError::UnknownTile(position))?;
        if tile.tile_type() != TileType::Plain {
            return Err(WorldError::CityNotOnPlain(position));
        }
        if self.cities.contains_key(&position) {
            return Err(WorldError::DuplicateCity(position));
        }
        self.cities.insert(position, city);
        Ok(())
    }

    // -------------------------------------------------------------------
    // Tiles
    // -------------------------------------------------------------------

    /// The tile at `position`.
    pub fn tile(&self, position: Position) -> Option<&Tile> {
        self.tiles.get(&position)
    }

    /// Terrain at `position`.
    pub fn tile_type(&self, position: Position) -> Option<TileType> {
        self.tiles.get(&position).map(Tile::tile_type)
    }

    /// Iterate over all tiles in position order.
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.values()
    }

    /// Number of tiles.
    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    /// Positions of the existing tiles adjacent to `position`.
    pub fn neighbours(&self, position: Position) -> Vec<Position> {
        position
            .neighbours()
            .into_iter()
            .filter(|neighbour| self.tiles.contains_key(neighbour))
            .collect()
    }

    /// Whether the tile borders the sea (has fewer than six neighbours).
    pub fn is_coastal(&self, position: Position) -> bool {
        self.neighbours(position).len() < Direction::ALL.len()
    }

    /// Neighbours of `position` reachable through an edge in `allowed`.
    pub fn connected_neighbours(
        &self,
        position: Position,
        allowed: &BTreeSet<EdgeKey>,
    ) -> Vec<Position> {
        self.neighbours(position)
            .into_iter()
            .filter(|&neighbour| allowed.contains(&EdgeKey::new(position, neighbour)))
            .collect()
    }

    // -------------------------------------------------------------------
    // Edges
    // -------------------------------------------------------------------

    /// The edge with the given key.
    pub fn edge(&self, key: EdgeKey) -> Option<&Edge> {
        self.edges.get(&key)
    }

    /// The edge between two positions, in either order.
    pub fn edge_between(&self, a: Position, b: Position) -> Option<&Edge> {
        self.edges.get(&EdgeKey::new(a, b))
    }

    /// Iterate over all edges in key order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Edges with one endpoint at `position`.
    pub fn incident_edges(&self, position: Position) -> impl Iterator<Item = &Edge> {
        position
            .neighbours()
            .into_iter()
            .filter_map(move |neighbour| self.edges.get(&EdgeKey::new(position, neighbour)))
    }

    /// Edges sharing an endpoint with `key`, excluding `key` itself.
    pub fn connected_edges(&self, key: EdgeKey) -> Vec<&Edge> {
        key.positions()
            .into_iter()
            .flat_map(|position| self.incident_edges(position))
            .filter(|edge| edge.key() != key)
            .collect()
    }

    /// Whether the two edges share an endpoint.
    pub fn connects_to(&self, a: EdgeKey, b: EdgeKey) -> bool {
        self.edges.contains_key(&a) && self.edges.contains_key(&b) && a.touches(&b)
    }

    // -------------------------------------------------------------------
    // Rails
    // -------------------------------------------------------------------

    /// Keys of every edge `player` has a rail on.
    pub fn rails(&self, player: PlayerId) -> BTreeSet<EdgeKey> {
        self.edges
            .values()
            .filter(|edge| edge.is_owned_by(player))
            .map(Edge::key)
            .collect()
    }

    /// Whether `player` owns any rail.
    pub fn has_any_rail(&self, player: PlayerId) -> bool {
        self.edges.values().any(|edge| edge.is_owned_by(player))
    }

    /// Every edge that carries at least one rail.
    pub fn railed_edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values().filter(|edge| edge.has_rail())
    }

    /// Rails of `player` sharing an endpoint with `key`.
    pub fn connected_rails(&self, key: EdgeKey, player: PlayerId) -> Vec<EdgeKey> {
        self.connected_edges(key)
            .into_iter()
            .filter(|edge| edge.is_owned_by(player))
            .map(Edge::key)
            .collect()
    }

    /// Check whether `player` may put a rail on `key`.
    ///
    /// A rail must extend the player's network. A player without rails
    /// starts at an edge touching a starting city.
    ///
    /// # Errors
    ///
    /// Returns the [`WorldError`] naming the violated rule.
    pub fn can_add_rail(&self, key: EdgeKey, player: PlayerId) -> Result<(), WorldError> {
        let edge = self.edges.get(&key).ok_or(WorldError::UnknownEdge(key))?;
        if edge.is_owned_by(player) {
            return Err(WorldError::AlreadyOwner { edge: key, player });
        }
        if self.has_any_rail(player) {
            if self.connected_rails(key, player).is_empty() {
                return Err(WorldError::NotConnected { edge: key, player });
            }
        } else if !self.touches_starting_city(key) {
            return Err(WorldError::NotAtStartingCity { edge: key, player });
        }
        Ok(())
    }

    /// Put a rail of `player` on `key`.
    ///
    /// # Errors
    ///
    /// Same conditions as [`can_add_rail`](Self::can_add_rail).
    pub fn add_rail(&mut self, key: EdgeKey, player: PlayerId) -> Result<(), WorldError> {
        self.can_add_rail(key, player)?;
        let edge = self
            .edges
            .get_mut(&key)
            .ok_or(WorldError::UnknownEdge(key))?;
        edge.push_owner(player);
        debug!(edge = %key, player = %player, "Rail added");
        Ok(())
    }

    /// Remove the rail of `player` from `key`. Returns whether one existed.
    pub fn remove_rail(&mut self, key: EdgeKey, player: PlayerId) -> bool {
        self.edges
            .get_mut(&key)
            .is_some_and(|edge| edge.remove_owner(player))
    }

    // -------------------------------------------------------------------
    // Cities
    // -------------------------------------------------------------------

    /// The city at `position`.
    pub fn city(&self, position: Position) -> Option<&City> {
        self.cities.get(&position)
    }

    /// Whether a city stands at `position`.
    pub fn has_city(&self, position: Position) -> bool {
        self.cities.contains_key(&position)
    }

    /// Iterate over all cities in position order.
    pub fn cities(&self) -> impl Iterator<Item = &City> {
        self.cities.values()
    }

    /// Number of cities.
    pub fn city_count(&self) -> usize {
        self.cities.len()
    }

    /// Cities flagged as starting cities.
    pub fn starting_cities(&self) -> impl Iterator<Item = &City> {
        self.cities.values().filter(|city| city.is_starting_city())
    }

    /// Whether any rail ends at the city on `position`.
    pub fn is_city_connected(&self, position: Position) -> bool {
        self.has_city(position) && self.incident_edges(position).any(Edge::has_rail)
    }

    /// Cities reached by at least one rail.
    pub fn connected_cities(&self) -> impl Iterator<Item = &City> {
        self.cities
            .values()
            .filter(|city| self.is_city_connected(city.position()))
    }

    /// Cities no rail reaches yet.
    pub fn unconnected_cities(&self) -> impl Iterator<Item = &City> {
        self.cities
            .values()
            .filter(|city| !self.is_city_connected(city.position()))
    }

    /// Whether either endpoint of `key` hosts a city.
    pub fn touches_city(&self, key: EdgeKey) -> bool {
        key.positions().iter().any(|p| self.has_city(*p))
    }

    /// Whether either endpoint of `key` hosts a starting city.
    pub fn touches_starting_city(&self, key: EdgeKey) -> bool {
        key.positions()
            .iter()
            .filter_map(|p| self.cities.get(p))
            .any(City::is_starting_city)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;

    /// A straight row of plain tiles `(0,0)..(len-1,0)`.
    pub(crate) fn row(len: i32) -> HexGrid {
        HexGrid::from_tiles(
            CostTables::default(),
            (0..len).map(|q| (Position::new(q, 0), TileType::Plain)),
        )
    }

    pub(crate) fn key(a: (i32, i32), b: (i32, i32)) -> EdgeKey {
        EdgeKey::new(Position::new(a.0, a.1), Position::new(b.0, b.1))
    }

    #[test]
    fn from_tiles_creates_one_edge_per_adjacent_pair() {
        let grid = HexGrid::from_tiles(
            CostTables::default(),
            Position::ORIGIN
                .spiral(1)
                .into_iter()
                .map(|p| (p, TileType::Plain)),
        );
        // Centre + ring of 6: six spokes plus six rim edges.
        assert_eq!(grid.tile_count(), 7);
        assert_eq!(grid.edge_count(), 12);
        assert!(!grid.is_coastal(Position::ORIGIN));
        assert!(grid.is_coastal(Position::new(1, 0)));
    }

    #[test]
    fn add_edge_requires_adjacent_tiles() {
        let mut grid = row(3);
        assert!(matches!(
            grid.add_edge(Position::new(0, 0), Position::new(2, 0)),
            Err(WorldError::NotAdjacent { .. })
        ));
        assert!(matches!(
            grid.add_edge(Position::new(0, 0), Position::new(0, 1)),
            Err(WorldError::UnknownTile(_))
        ));
        assert!(grid.add_edge(Position::new(1, 0), Position::new(0, 0)).is_ok());
        assert_eq!(grid.edge_count(), 2);
    }

    #[test]
    fn first_rail_must_touch_starting_city() {
        let mut grid = row(4);
        grid.add_city(City::new(Position::new(0, 0), "Alpha".into(), true))
            .unwrap();
        grid.add_city(City::new(Position::new(3, 0), "Omega".into(), false))
            .unwrap();
        let player = PlayerId(1);

        assert!(matches!(
            grid.add_rail(key((2, 0), (3, 0)), player),
            Err(WorldError::NotAtStartingCity { .. })
        ));
        grid.add_rail(key((0, 0), (1, 0)), player).unwrap();
        assert!(matches!(
            grid.add_rail(key((0, 0), (1, 0)), player),
            Err(WorldError::AlreadyOwner { .. })
        ));
    }

    #[test]
    fn later_rails_must_connect_to_the_network() {
        let mut grid = row(5);
        grid.add_city(City::new(Position::new(0, 0), "Alpha".into(), true))
            .unwrap();
        let player = PlayerId(1);
        grid.add_rail(key((0, 0), (1, 0)), player).unwrap();

        assert!(matches!(
            grid.add_rail(key((2, 0), (3, 0)), player),
            Err(WorldError::NotConnected { .. })
        ));
        grid.add_rail(key((1, 0), (2, 0)), player).unwrap();
        grid.add_rail(key((2, 0), (3, 0)), player).unwrap();

        // Every rail that does not touch the starting city has a connected
        // neighbour rail of the same player.
        for rail in grid.rails(player) {
            assert!(
                grid.touches_starting_city(rail) || !grid.connected_rails(rail, player).is_empty()
            );
        }
    }

    #[test]
    fn connected_edges_exclude_the_edge_itself() {
        let grid = row(3);
        let middle = key((0, 0), (1, 0));
        let connected: Vec<EdgeKey> = grid.connected_edges(middle).iter().map(|e| e.key()).collect();
        assert_eq!(connected, vec![key((1, 0), (2, 0))]);
        assert!(grid.connects_to(middle, key((1, 0), (2, 0))));
        assert!(!grid.connects_to(middle, middle));
    }

    #[test]
    fn cities_become_connected_when_a_rail_reaches_them() {
        let mut grid = row(3);
        grid.add_city(City::new(Position::new(0, 0), "Alpha".into(), true))
            .unwrap();
        grid.add_city(City::new(Position::new(2, 0), "Beta".into(), false))
            .unwrap();
        assert_eq!(grid.unconnected_cities().count(), 2);

        grid.add_rail(key((0, 0), (1, 0)), PlayerId(1)).unwrap();
        assert_eq!(grid.connected_cities().count(), 1);
        assert_eq!(grid.unconnected_cities().count(), 1);

        assert!(grid.remove_rail(key((0, 0), (1, 0)), PlayerId(1)));
        assert_eq!(grid.unconnected_cities().count(), 2);
    }

    #[test]
    fn cities_only_on_free_plain_tiles() {
        let mut grid = HexGrid::from_tiles(
            CostTables::default(),
            [
                (Position::new(0, 0), TileType::Plain),
                (Position::new(1, 0), TileType::Mountain),
            ],
        );
        assert!(matches!(
            grid.add_city(City::new(Position::new(1, 0), "Peak".into(), false)),
            Err(WorldError::CityNotOnPlain(_))
        ));
        grid.add_city(City::new(Position::new(0, 0), "Vale".into(), false))
            .unwrap();
        assert!(matches!(
            grid.add_city(City::new(Position::new(0, 0), "Again".into(), false)),
            Err(WorldError::DuplicateCity(_))
        ));
    }

    #[test]
    fn connected_neighbours_respect_the_allowed_set() {
        let grid = row(3);
        let allowed: BTreeSet<EdgeKey> = [key((0, 0), (1, 0))].into_iter().collect();
        assert_eq!(
            grid.connected_neighbours(Position::new(1, 0), &allowed),
            vec![Position::new(0, 0)]
        );
    }
}
