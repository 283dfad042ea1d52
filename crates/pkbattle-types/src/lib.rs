//! Shared type definitions for the PK battle engine.
//!
//! This crate is the single source of truth for the data contracts at the
//! core's boundary: the inbound event record from the live-event source and
//! the outbound notifications consumed by the renderer. Types flow to
//! `TypeScript` via `ts-rs` for the overlay front end.
//!
//! # Modules
//!
//! - [`ids`] -- Entity and viewer identifiers
//! - [`enums`] -- Teams, event kinds, zones, round phases and outcomes
//! - [`events`] -- The normalized inbound event record
//! - [`notifications`] -- Outbound state-change notifications
//! - [`structs`] -- Display entity and round state snapshots

pub mod enums;
pub mod events;
pub mod ids;
pub mod notifications;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{
    EntityKind, EventKind, RemovalReason, RoundOutcome, RoundPhase, Team, ZoneAffinity,
};
pub use events::InboundEvent;
pub use ids::{EntityId, ViewerId};
pub use notifications::Notification;
pub use structs::{
    BubbleContent, BubbleStyle, DisplayEntity, Position, RoundState, ViewerSlot,
};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation for the overlay front end.

    #[test]
    fn export_bindings() {
        // ts-rs generates TypeScript bindings when types with
        // #[ts(export)] are used. The files are written to the `bindings/`
        // directory relative to the crate root.
        use ts_rs::TS;

        // IDs
        let _ = crate::ids::EntityId::export_all();
        let _ = crate::ids::ViewerId::export_all();

        // Enums
        let _ = crate::enums::Team::export_all();
        let _ = crate::enums::EventKind::export_all();
        let _ = crate::enums::ZoneAffinity::export_all();
        let _ = crate::enums::EntityKind::export_all();
        let _ = crate::enums::RemovalReason::export_all();
        let _ = crate::enums::RoundPhase::export_all();
        let _ = crate::enums::RoundOutcome::export_all();

        // Structs
        let _ = crate::structs::Position::export_all();
        let _ = crate::structs::BubbleStyle::export_all();
        let _ = crate::structs::BubbleContent::export_all();
        let _ = crate::structs::DisplayEntity::export_all();
        let _ = crate::structs::ViewerSlot::export_all();
        let _ = crate::structs::RoundState::export_all();

        // Boundary records
        let _ = crate::events::InboundEvent::export_all();
        let _ = crate::notifications::Notification::export_all();
    }
}
