//! Hex grid, terrain generation, rail economy and routing for hexrail.
//!
//! This crate models the board: hexagonal tiles connected by edges on
//! which players build rails, the cities they connect, and the prices of
//! building, renting and driving.
//!
//! # Modules
//!
//! - [`config`] -- Map generation parameters and validated cost tables.
//! - [`edge`] -- [`Edge`]: an adjacent tile pair and its rail owners.
//! - [`economy`] -- Building, parallel, rent and driving costs.
//! - [`error`] -- Error types for grid operations.
//! - [`generation`] -- Seeded random terrain walks and city placement.
//! - [`grid`] -- [`HexGrid`]: tiles, edges, cities and rail connectivity.
//! - [`names`] -- Markov-chain city name generator.
//! - [`pathfinding`] -- Dijkstra over a restricted edge set.
//! - [`tile`] -- [`Tile`] and [`City`].

pub mod config;
pub mod economy;
pub mod edge;
pub mod error;
pub mod generation;
pub mod grid;
pub mod names;
pub mod pathfinding;
pub mod tile;

// Re-export primary types at crate root.
pub use config::{BuildingCost, CostTables, CostTablesSpec, DrivingCost, MapConfig, TerrainPair};
pub use edge::Edge;
pub use error::WorldError;
pub use grid::HexGrid;
pub use names::{MarkovNameGenerator, NameSource};
pub use tile::{City, Tile};
