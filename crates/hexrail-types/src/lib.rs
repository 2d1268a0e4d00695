//! Shared type definitions for the hexrail board game engine.
//!
//! This crate is the single source of truth for values that cross crate
//! boundaries: coordinates, identifiers, objectives, actions and the
//! snapshots published to observers. Types flow downstream to `TypeScript`
//! via `ts-rs` for user interfaces.
//!
//! # Modules
//!
//! - [`ids`] -- Player and game identifiers, AI kinds, player colours
//! - [`position`] -- Axial hex coordinates, directions and edge keys
//! - [`enums`] -- Terrain, game phase and action kinds
//! - [`objective`] -- Player objectives and their allowed actions
//! - [`actions`] -- Commands submitted to player mailboxes
//! - [`snapshot`] -- Published player/game snapshots and game events

pub mod actions;
pub mod enums;
pub mod ids;
pub mod objective;
pub mod position;
pub mod snapshot;

// Re-export all public types at crate root for convenience.
pub use actions::PlayerAction;
pub use enums::{ActionKind, GamePhase, TileType};
pub use ids::{AiKind, GameId, InvalidColor, PlayerColor, PlayerId};
pub use objective::PlayerObjective;
pub use position::{Direction, EdgeKey, Position};
pub use snapshot::{
    DrivableTile, GameEvent, GameSnapshot, Journey, PlayerState, PlayerSummary, RailView,
};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        // ts-rs writes the bindings to `bindings/` relative to the crate
        // root when `export_all` is called.
        use ts_rs::TS;

        // IDs
        let _ = crate::ids::PlayerId::export_all();
        let _ = crate::ids::GameId::export_all();
        let _ = crate::ids::AiKind::export_all();

        // Geometry
        let _ = crate::position::Direction::export_all();
        let _ = crate::position::Position::export_all();
        let _ = crate::position::EdgeKey::export_all();

        // Enums
        let _ = crate::enums::TileType::export_all();
        let _ = crate::enums::GamePhase::export_all();
        let _ = crate::enums::ActionKind::export_all();
        let _ = crate::objective::PlayerObjective::export_all();

        // Commands and snapshots
        let _ = crate::actions::PlayerAction::export_all();
        let _ = crate::snapshot::Journey::export_all();
        let _ = crate::snapshot::DrivableTile::export_all();
        let _ = crate::snapshot::PlayerState::export_all();
        let _ = crate::snapshot::PlayerSummary::export_all();
        let _ = crate::snapshot::RailView::export_all();
        let _ = crate::snapshot::GameSnapshot::export_all();
        let _ = crate::snapshot::GameEvent::export_all();
    }
}
