//! Edges between adjacent tiles and the rails built on them.

use hexrail_types::{EdgeKey, PlayerId};
use serde::{Deserialize, Serialize};

/// The border between two adjacent tiles.
///
/// Owners are kept in build order and never repeat; an edge carries a
/// rail exactly when it has at least one owner. Ownership only changes
/// through [`HexGrid::add_rail`](crate::HexGrid::add_rail) and
/// [`HexGrid::remove_rail`](crate::HexGrid::remove_rail).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    key: EdgeKey,
    owners: Vec<PlayerId>,
}

impl Edge {
    /// Create an edge without rails.
    pub const fn new(key: EdgeKey) -> Self {
        Self {
            key,
            owners: Vec::new(),
        }
    }

    /// The edge's identity.
    pub const fn key(&self) -> EdgeKey {
        self.key
    }

    /// Owners in build order.
    pub fn owners(&self) -> &[PlayerId] {
        &self.owners
    }

    /// Whether any player has a rail here.
    pub fn has_rail(&self) -> bool {
        !self.owners.is_empty()
    }

    /// Whether `player` has a rail here.
    pub fn is_owned_by(&self, player: PlayerId) -> bool {
        self.owners.contains(&player)
    }

    /// Whether someone other than `player` has a rail here.
    pub fn has_foreign_rail(&self, player: PlayerId) -> bool {
        self.owners.iter().any(|&owner| owner != player)
    }

    pub(crate) fn push_owner(&mut self, player: PlayerId) -> bool {
        if self.is_owned_by(player) {
            return false;
        }
        self.owners.push(player);
        true
    }

    pub(crate) fn remove_owner(&mut self, player: PlayerId) -> bool {
        let before = self.owners.len();
        self.owners.retain(|&owner| owner != player);
        self.owners.len() != before
    }
}
