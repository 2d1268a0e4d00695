//! Shortest paths over a restricted set of edges.
//!
//! Routing in the game never uses the whole grid: a driver may only use
//! its own rails and the rails it rents. [`HexGrid::find_path`] therefore
//! takes the allowed edge set and a step cost function as arguments.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use hexrail_types::{EdgeKey, Position};

use crate::grid::HexGrid;

impl HexGrid {
    /// Find the cheapest path from `start` to `target` using only edges
    /// in `allowed`, priced by `cost(from, to)`.
    ///
    /// Returns the edges in travel order, or an empty vector if `target`
    /// is unreachable or equal to `start`.
    ///
    /// Uses Dijkstra's algorithm with a `BTreeSet<(cost, Position)>` as the
    /// priority queue; among equally cheap frontier tiles the smallest
    /// position is settled first.
    pub fn find_path<F>(
        &self,
        start: Position,
        target: Position,
        allowed: &BTreeSet<EdgeKey>,
        cost: F,
    ) -> Vec<EdgeKey>
    where
        F: Fn(Position, Position) -> u32,
    {
        if start == target || self.tile(start).is_none() || self.tile(target).is_none() {
            return Vec::new();
        }

        let mut dist: BTreeMap<Position, u32> = BTreeMap::new();
        let mut previous: BTreeMap<Position, Position> = BTreeMap::new();
        let mut queue: BTreeSet<(u32, Position)> = BTreeSet::new();

        dist.insert(start, 0);
        queue.insert((0, start));

        while let Some((current_dist, current)) = queue.pop_first() {
            if current == target {
                break;
            }

            for neighbour in self.connected_neighbours(current, allowed) {
                let Some(new_dist) = current_dist.checked_add(cost(current, neighbour)) else {
                    continue;
                };

                let is_shorter = dist
                    .get(&neighbour)
                    .is_none_or(|&existing| new_dist < existing);

                if is_shorter {
                    if let Some(&old_dist) = dist.get(&neighbour) {
                        queue.remove(&(old_dist, neighbour));
                    }
                    dist.insert(neighbour, new_dist);
                    previous.insert(neighbour, current);
                    queue.insert((new_dist, neighbour));
                }
            }
        }

        let mut path = VecDeque::new();
        let mut current = target;
        while current != start {
            let Some(&predecessor) = previous.get(&current) else {
                return Vec::new();
            };
            path.push_front(EdgeKey::new(predecessor, current));
            current = predecessor;
        }
        path.into()
    }

    /// Tiles visited when following `path` from `start`, `start` included.
    ///
    /// Stops early if an edge does not continue from the previous tile.
    pub fn path_positions(start: Position, path: &[EdgeKey]) -> Vec<Position> {
        let mut positions = Vec::with_capacity(path.len().saturating_add(1));
        positions.push(start);
        let mut current = start;
        for edge in path {
            let Some(next) = edge.other(current) else {
                break;
            };
            positions.push(next);
            current = next;
        }
        positions
    }

    /// Sum of `cost` over each step of `path` from `start`.
    ///
    /// Returns `None` if the path is not contiguous from `start`.
    pub fn path_cost<F>(start: Position, path: &[EdgeKey], cost: F) -> Option<u32>
    where
        F: Fn(Position, Position) -> u32,
    {
        let mut total = 0_u32;
        let mut current = start;
        for edge in path {
            let next = edge.other(current)?;
            total = total.checked_add(cost(current, next))?;
            current = next;
        }
        Some(total)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use hexrail_types::TileType;

    use super::*;
    use crate::config::CostTables;
    use crate::grid::tests::{key, row};

    fn all_edges(grid: &HexGrid) -> BTreeSet<EdgeKey> {
        grid.edges().map(crate::Edge::key).collect()
    }

    #[test]
    fn two_adjacent_plain_tiles_cost_one_step() {
        let grid = row(2);
        let start = Position::new(0, 0);
        let target = Position::new(1, 0);
        let driving = |a, b| grid.driving_cost(a, b).unwrap_or(u32::MAX);

        let path = grid.find_path(start, target, &all_edges(&grid), driving);
        assert_eq!(path, vec![key((0, 0), (1, 0))]);
        assert_eq!(HexGrid::path_cost(start, &path, driving), Some(1));
    }

    #[test]
    fn unreachable_target_yields_empty_path() {
        let grid = row(4);
        let allowed: BTreeSet<EdgeKey> = [key((0, 0), (1, 0))].into_iter().collect();
        let path = grid.find_path(Position::new(0, 0), Position::new(3, 0), &allowed, |_, _| 1);
        assert!(path.is_empty());
    }

    #[test]
    fn start_equal_to_target_yields_empty_path() {
        let grid = row(2);
        let origin = Position::ORIGIN;
        assert!(grid.find_path(origin, origin, &all_edges(&grid), |_, _| 1).is_empty());
    }

    #[test]
    fn cheaper_detour_beats_expensive_direct_step() {
        let grid = HexGrid::from_tiles(
            CostTables::default(),
            Position::ORIGIN
                .spiral(1)
                .into_iter()
                .map(|p| (p, TileType::Plain)),
        );
        let start = Position::new(0, 0);
        let target = Position::new(1, 0);
        let direct = EdgeKey::new(start, target);
        let cost = |a: Position, b: Position| if EdgeKey::new(a, b) == direct { 10 } else { 1 };

        let path = grid.find_path(start, target, &all_edges(&grid), cost);
        assert_eq!(path.len(), 2);
        assert_eq!(HexGrid::path_cost(start, &path, cost), Some(2));
    }

    #[test]
    fn path_cost_equals_sum_of_step_costs() {
        let grid = HexGrid::from_tiles(
            CostTables::default(),
            Position::ORIGIN
                .spiral(3)
                .into_iter()
                .map(|p| (p, TileType::Plain)),
        );
        let start = Position::new(-3, 0);
        let target = Position::new(3, -1);
        let costs: [fn(Position, Position) -> u32; 3] = [
            |_, _| 1,
            |a, b| a.q.unsigned_abs().saturating_add(b.r.unsigned_abs()).saturating_add(1),
            |_, b| if b.r == 0 { 1 } else { 4 },
        ];

        for cost in costs {
            let path = grid.find_path(start, target, &all_edges(&grid), cost);
            assert!(!path.is_empty());
            let positions = HexGrid::path_positions(start, &path);
            assert_eq!(positions.first().copied(), Some(start));
            assert_eq!(positions.last().copied(), Some(target));
            let manual: u32 = positions
                .windows(2)
                .map(|pair| match pair {
                    [a, b] => cost(*a, *b),
                    _ => 0,
                })
                .sum();
            assert_eq!(HexGrid::path_cost(start, &path, cost), Some(manual));
        }
    }

    #[test]
    fn path_cost_rejects_broken_paths() {
        let broken = [key((0, 0), (1, 0)), key((2, 0), (3, 0))];
        assert_eq!(HexGrid::path_cost(Position::ORIGIN, &broken, |_, _| 1), None);
    }
}
