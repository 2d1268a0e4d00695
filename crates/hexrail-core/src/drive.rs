//! Reachability of tiles within one dice roll.
//!
//! A driver moves along its own rails and the rails it rented. Tiles are
//! explored cheapest first. The driver may stop:
//!
//! - on the journey's target, if it is reachable at all (then it is the
//!   only option);
//! - on a tile reached with exactly the rolled value;
//! - on a tile from which some step would overshoot the roll, or from
//!   which there is nowhere new to go. This includes the current tile.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use hexrail_types::{DrivableTile, EdgeKey, Position};
use hexrail_world::HexGrid;

/// Tiles a driver on `start` may end its move on with `roll` points.
///
/// `allowed` are the edges the driver may use; `target` is the journey's
/// destination. The result is sorted by tile position and every cost is
/// at most `roll`.
pub fn drivable_tiles(
    grid: &HexGrid,
    start: Position,
    target: Option<Position>,
    allowed: &BTreeSet<EdgeKey>,
    roll: u32,
) -> Vec<DrivableTile> {
    let step_cost = |from: Position, to: Position| grid.driving_cost(from, to).unwrap_or(u32::MAX);

    let mut dist: BTreeMap<Position, u32> = BTreeMap::new();
    let mut previous: BTreeMap<Position, Position> = BTreeMap::new();
    let mut settled: BTreeSet<Position> = BTreeSet::new();
    let mut queue: BTreeSet<(u32, Position)> = BTreeSet::new();
    let mut stops: BTreeSet<Position> = BTreeSet::new();

    dist.insert(start, 0);
    queue.insert((0, start));

    while let Some((current_dist, current)) = queue.pop_first() {
        settled.insert(current);

        if target == Some(current) && current != start {
            return vec![drivable(&previous, start, current, current_dist)];
        }
        if current_dist >= roll {
            stops.insert(current);
            continue;
        }

        let mut can_continue = false;
        let mut overshoots = false;
        for neighbour in grid.connected_neighbours(current, allowed) {
            if settled.contains(&neighbour) {
                continue;
            }
            let new_dist = current_dist.saturating_add(step_cost(current, neighbour));
            if new_dist > roll {
                overshoots = true;
                continue;
            }
            can_continue = true;

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

        if overshoots || !can_continue {
            stops.insert(current);
        }
    }

    stops
        .into_iter()
        .filter_map(|tile| {
            let cost = dist.get(&tile).copied()?;
            Some(drivable(&previous, start, tile, cost))
        })
        .collect()
}

fn drivable(
    previous: &BTreeMap<Position, Position>,
    start: Position,
    tile: Position,
    cost: u32,
) -> DrivableTile {
    let mut path = VecDeque::from([tile]);
    let mut current = tile;
    while current != start {
        let Some(&predecessor) = previous.get(&current) else {
            break;
        };
        path.push_front(predecessor);
        current = predecessor;
    }
    DrivableTile {
        tile,
        path: path.into(),
        cost,
    }
}
