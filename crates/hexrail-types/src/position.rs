//! Axial hex coordinates and edge keys.
//!
//! A [`Position`] addresses a hexagon with two axial coordinates `(q, r)`;
//! the third cube coordinate `s = -q - r` is derived. Positions order by
//! `(q, r)`, which keeps every map and set keyed by them deterministic.
//!
//! An [`EdgeKey`] names the border between two adjacent hexagons. The pair
//! is unordered: `EdgeKey::new(a, b) == EdgeKey::new(b, a)`.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// One of the six neighbour directions of a hexagon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// `(+1, 0)`
    East,
    /// `(+1, -1)`
    NorthEast,
    /// `(0, -1)`
    NorthWest,
    /// `(-1, 0)`
    West,
    /// `(-1, +1)`
    SouthWest,
    /// `(0, +1)`
    SouthEast,
}

impl Direction {
    /// All directions, counter-clockwise starting east.
    pub const ALL: [Self; 6] = [
        Self::East,
        Self::NorthEast,
        Self::NorthWest,
        Self::West,
        Self::SouthWest,
        Self::SouthEast,
    ];

    /// Axial `(q, r)` offset of one step in this direction.
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Self::East => (1, 0),
            Self::NorthEast => (1, -1),
            Self::NorthWest => (0, -1),
            Self::West => (-1, 0),
            Self::SouthWest => (-1, 1),
            Self::SouthEast => (0, 1),
        }
    }
}

/// Axial coordinate of a hexagon.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub struct Position {
    /// Column axis.
    pub q: i32,
    /// Row axis.
    pub r: i32,
}

impl Position {
    /// The map origin.
    pub const ORIGIN: Self = Self { q: 0, r: 0 };

    /// Create a position from axial coordinates.
    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    /// The derived third cube coordinate.
    pub const fn s(self) -> i32 {
        0_i32.saturating_sub(self.q).saturating_sub(self.r)
    }

    /// Component-wise sum.
    #[must_use]
    pub const fn add(self, other: Self) -> Self {
        Self {
            q: self.q.saturating_add(other.q),
            r: self.r.saturating_add(other.r),
        }
    }

    /// Component-wise difference.
    #[must_use]
    pub const fn sub(self, other: Self) -> Self {
        Self {
            q: self.q.saturating_sub(other.q),
            r: self.r.saturating_sub(other.r),
        }
    }

    /// Multiply both coordinates by `factor`.
    #[must_use]
    pub const fn scale(self, factor: i32) -> Self {
        Self {
            q: self.q.saturating_mul(factor),
            r: self.r.saturating_mul(factor),
        }
    }

    /// The adjacent position in `direction`.
    #[must_use]
    pub const fn neighbour(self, direction: Direction) -> Self {
        let (dq, dr) = direction.offset();
        self.add(Self::new(dq, dr))
    }

    /// All six adjacent positions in [`Direction::ALL`] order.
    pub fn neighbours(self) -> [Self; 6] {
        Direction::ALL.map(|direction| self.neighbour(direction))
    }

    /// Whether `other` is one step away.
    pub fn is_adjacent(self, other: Self) -> bool {
        self.distance(other) == 1
    }

    /// Hex (cube) distance between two positions.
    pub const fn distance(self, other: Self) -> u32 {
        let diff = self.sub(other);
        let total = diff
            .q
            .unsigned_abs()
            .saturating_add(diff.r.unsigned_abs())
            .saturating_add(diff.s().unsigned_abs());
        total / 2
    }

    /// Positions at exactly `radius` steps from `self`.
    ///
    /// The walk starts at `self + SouthWest * radius` and follows the six
    /// sides in [`Direction::ALL`] order. Radius 0 yields `self` alone.
    pub fn ring(self, radius: u32) -> Vec<Self> {
        if radius == 0 {
            return vec![self];
        }
        let steps = i32::try_from(radius).unwrap_or(i32::MAX);
        let (dq, dr) = Direction::SouthWest.offset();
        let mut current = self.add(Self::new(dq, dr).scale(steps));
        let mut ring = Vec::with_capacity(usize::try_from(radius).unwrap_or(0).saturating_mul(6));
        for direction in Direction::ALL {
            for _ in 0..radius {
                ring.push(current);
                current = current.neighbour(direction);
            }
        }
        ring
    }

    /// Every position within `radius` steps, ring by ring from the centre.
    pub fn spiral(self, radius: u32) -> Vec<Self> {
        (0..=radius).flat_map(|ring| self.ring(ring)).collect()
    }
}

impl core::fmt::Display for Position {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({:+}, {:+}, {:+})", self.q, self.r, self.s())
    }
}

/// Unordered pair of adjacent positions identifying one edge of the grid.
///
/// The smaller position is always stored first, so equality, ordering and
/// hashing ignore the order the endpoints were given in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(from = "EdgeEndpoints")]
pub struct EdgeKey {
    a: Position,
    b: Position,
}

/// Wire form of an [`EdgeKey`] before normalisation.
#[derive(Deserialize)]
struct EdgeEndpoints {
    a: Position,
    b: Position,
}

impl From<EdgeEndpoints> for EdgeKey {
    fn from(endpoints: EdgeEndpoints) -> Self {
        Self::new(endpoints.a, endpoints.b)
    }
}

impl EdgeKey {
    /// Create the key for the edge between `x` and `y`.
    pub fn new(x: Position, y: Position) -> Self {
        if x <= y {
            Self { a: x, b: y }
        } else {
            Self { a: y, b: x }
        }
    }

    /// The smaller endpoint.
    pub const fn first(&self) -> Position {
        self.a
    }

    /// The larger endpoint.
    pub const fn second(&self) -> Position {
        self.b
    }

    /// Both endpoints, smaller first.
    pub const fn positions(&self) -> [Position; 2] {
        [self.a, self.b]
    }

    /// Whether `position` is one of the endpoints.
    pub fn contains(&self, position: Position) -> bool {
        self.a == position || self.b == position
    }

    /// The endpoint opposite `position`, if `position` is an endpoint.
    pub fn other(&self, position: Position) -> Option<Position> {
        if self.a == position {
            Some(self.b)
        } else if self.b == position {
            Some(self.a)
        } else {
            None
        }
    }

    /// Whether the two endpoints are neighbours on the grid.
    pub fn is_adjacent(&self) -> bool {
        self.a.is_adjacent(self.b)
    }

    /// Whether the two edges share exactly one endpoint.
    pub fn touches(&self, other: &Self) -> bool {
        self != other && (other.contains(self.a) || other.contains(self.b))
    }
}

impl core::fmt::Display for EdgeKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}-{}", self.a, self.b)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    #[test]
    fn s_is_derived() {
        assert_eq!(Position::new(2, -5).s(), 3);
        assert_eq!(Position::ORIGIN.s(), 0);
    }

    #[test]
    fn order_is_q_then_r() {
        assert!(Position::new(0, 5) < Position::new(1, -5));
        assert!(Position::new(1, -5) < Position::new(1, 0));
    }

    #[test]
    fn neighbours_are_all_adjacent_and_distinct() {
        let centre = Position::new(3, -1);
        let neighbours = centre.neighbours();
        let unique: BTreeSet<_> = neighbours.iter().copied().collect();
        assert_eq!(unique.len(), 6);
        assert!(neighbours.iter().all(|n| centre.distance(*n) == 1));
    }

    #[test]
    fn distance_matches_cube_metric() {
        assert_eq!(Position::ORIGIN.distance(Position::new(3, -3)), 3);
        assert_eq!(Position::ORIGIN.distance(Position::new(2, 1)), 3);
        assert_eq!(Position::new(-1, 2).distance(Position::new(-1, 2)), 0);
    }

    #[test]
    fn ring_starts_south_west_and_has_six_times_radius_tiles() {
        let ring = Position::ORIGIN.ring(2);
        assert_eq!(ring.len(), 12);
        assert_eq!(ring.first().copied(), Some(Position::new(-2, 2)));
        assert!(ring.iter().all(|p| Position::ORIGIN.distance(*p) == 2));
    }

    #[test]
    fn spiral_covers_every_tile_within_radius() {
        let spiral = Position::new(1, 1).spiral(2);
        assert_eq!(spiral.len(), 19);
        assert_eq!(spiral.first().copied(), Some(Position::new(1, 1)));
        let unique: BTreeSet<_> = spiral.iter().copied().collect();
        assert_eq!(unique.len(), 19);
    }

    #[test]
    fn edge_key_is_unordered() {
        let a = Position::new(0, 0);
        let b = Position::new(1, 0);
        assert_eq!(EdgeKey::new(a, b), EdgeKey::new(b, a));
        assert_eq!(EdgeKey::new(b, a).first(), a);
        assert!(EdgeKey::new(a, b).is_adjacent());
    }

    #[test]
    fn edge_touches_requires_shared_endpoint() {
        let origin = Position::ORIGIN;
        let east = EdgeKey::new(origin, Position::new(1, 0));
        let west = EdgeKey::new(origin, Position::new(-1, 0));
        let far = EdgeKey::new(Position::new(5, 0), Position::new(6, 0));
        assert!(east.touches(&west));
        assert!(!east.touches(&east));
        assert!(!east.touches(&far));
        assert_eq!(east.other(origin), Some(Position::new(1, 0)));
        assert_eq!(far.other(origin), None);
    }

    #[test]
    fn edge_key_deserialises_normalised() {
        let json = r#"{"a":{"q":1,"r":0},"b":{"q":0,"r":0}}"#;
        let key: EdgeKey = serde_json::from_str(json).unwrap();
        assert_eq!(key.first(), Position::ORIGIN);
    }
}
