//! Error types for the `hexrail-world` crate.
//!
//! All fallible operations in this crate return [`WorldError`] through the
//! standard [`Result`] type alias.

use hexrail_types::{EdgeKey, PlayerId, Position};

/// Errors that can occur during grid operations.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// No tile exists at the position.
    #[error("no tile at {0}")]
    UnknownTile(Position),

    /// No edge exists between the positions.
    #[error("no edge {0}")]
    UnknownEdge(EdgeKey),

    /// The two positions are not neighbours.
    #[error("{a} and {b} are not adjacent")]
    NotAdjacent {
        /// First position.
        a: Position,
        /// Second position.
        b: Position,
    },

    /// The player already has a rail on the edge.
    #[error("player {player} already owns a rail on {edge}")]
    AlreadyOwner {
        /// The edge.
        edge: EdgeKey,
        /// The owner.
        player: PlayerId,
    },

    /// The edge does not touch the player's existing network.
    #[error("{edge} is not connected to the rails of player {player}")]
    NotConnected {
        /// The edge.
        edge: EdgeKey,
        /// The builder.
        player: PlayerId,
    },

    /// A player's first rail must touch a starting city.
    #[error("first rail of player {player} must touch a starting city, {edge} does not")]
    NotAtStartingCity {
        /// The edge.
        edge: EdgeKey,
        /// The builder.
        player: PlayerId,
    },

    /// Cities can only be founded on plain tiles.
    #[error("cannot found a city on non-plain tile {0}")]
    CityNotOnPlain(Position),

    /// A city already exists at the position.
    #[error("a city already exists at {0}")]
    DuplicateCity(Position),

    /// City placement gave up before placing every city.
    #[error("placed {placed} of {wanted} cities after {attempts} attempts")]
    CityPlacementExhausted {
        /// Cities placed so far.
        placed: u32,
        /// Cities requested.
        wanted: u32,
        /// Samples drawn.
        attempts: u32,
    },

    /// A cost table lacks an entry for a terrain combination.
    #[error("cost table has no entry for {0}")]
    IncompleteCostTable(String),

    /// The name generator has nothing to learn from.
    #[error("name corpus has no usable names for order {order}")]
    EmptyNameCorpus {
        /// The Markov order requested.
        order: usize,
    },
}
