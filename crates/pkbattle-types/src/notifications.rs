//! Outbound notifications consumed by the rendering collaborator.
//!
//! Notifications are emitted in the order the state changes happen. Within
//! one dispatch step (an inbound event, an operator command, or a fired
//! timer) every notification is delivered before the next step begins;
//! nothing is batched or coalesced.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{RemovalReason, RoundPhase, Team};
use crate::ids::{EntityId, ViewerId};
use crate::structs::{DisplayEntity, Position};

/// A state change the renderer may want to reflect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Notification {
    /// A team's current-round points changed.
    PointsChanged {
        /// The team whose total changed.
        team: Team,
        /// The new total.
        total: u64,
    },

    /// The round-win tally changed.
    RoundWinsChanged {
        /// Rounds won by team A.
        team_a_wins: u32,
        /// Rounds won by team B.
        team_b_wins: u32,
    },

    /// The round clock changed (tick or reset).
    ClockTick {
        /// Seconds left in the round.
        seconds_remaining: u32,
    },

    /// One-time late-round cue (used for an audio warning).
    RoundWarning {
        /// Seconds left when the warning fired.
        seconds_remaining: u32,
    },

    /// A team won the round. Never emitted for a draw.
    RoundWon {
        /// The winning team.
        team: Team,
    },

    /// Points and clock were reset for the next round.
    RoundReset,

    /// The round state machine changed phase.
    PhaseChanged {
        /// The new phase.
        phase: RoundPhase,
    },

    /// An ephemeral bubble appeared.
    EntitySpawned {
        /// The new entity.
        entity: Box<DisplayEntity>,
    },

    /// An ephemeral bubble was destroyed.
    EntityRemoved {
        /// The destroyed entity.
        id: EntityId,
        /// Why it was destroyed.
        reason: RemovalReason,
    },

    /// A viewer got a persistent tile.
    ViewerAdded {
        /// The viewer.
        viewer_id: ViewerId,
        /// The tile's entity id.
        entity: EntityId,
        /// Dense grid index.
        grid_index: u32,
        /// Pixel position of the tile.
        position: Position,
    },

    /// A present viewer interacted again; the tile should pulse.
    ViewerPulsed {
        /// The viewer.
        viewer_id: ViewerId,
    },

    /// A tile moved after a re-layout.
    ViewerMoved {
        /// The viewer.
        viewer_id: ViewerId,
        /// New dense grid index.
        grid_index: u32,
        /// New pixel position.
        position: Position,
    },

    /// A viewer's tile was removed.
    ViewerRemoved {
        /// The viewer.
        viewer_id: ViewerId,
        /// The tile's entity id.
        entity: EntityId,
        /// Why it was removed.
        reason: RemovalReason,
    },

    /// The number of persistent viewers changed.
    ViewerCountChanged {
        /// Viewers currently on the grid.
        count: u32,
    },
}

impl Notification {
    /// Short snake_case name of the variant, for logging.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::PointsChanged { .. } => "points_changed",
            Self::RoundWinsChanged { .. } => "round_wins_changed",
            Self::ClockTick { .. } => "clock_tick",
            Self::RoundWarning { .. } => "round_warning",
            Self::RoundWon { .. } => "round_won",
            Self::RoundReset => "round_reset",
            Self::PhaseChanged { .. } => "phase_changed",
            Self::EntitySpawned { .. } => "entity_spawned",
            Self::EntityRemoved { .. } => "entity_removed",
            Self::ViewerAdded { .. } => "viewer_added",
            Self::ViewerPulsed { .. } => "viewer_pulsed",
            Self::ViewerMoved { .. } => "viewer_moved",
            Self::ViewerRemoved { .. } => "viewer_removed",
            Self::ViewerCountChanged { .. } => "viewer_count_changed",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn tagged_by_kind() {
        let json = serde_json::to_string(&Notification::PointsChanged {
            team: Team::A,
            total: 250,
        })
        .unwrap();
        assert_eq!(json, r#"{"kind":"points_changed","team":"A","total":250}"#);
    }

    #[test]
    fn unit_variant_round_trips() {
        let json = serde_json::to_string(&Notification::RoundReset).unwrap();
        assert_eq!(json, r#"{"kind":"round_reset"}"#);
        let back: Notification = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Notification::RoundReset);
    }

    #[test]
    fn name_matches_wire_tag() {
        let notification = Notification::ViewerCountChanged { count: 3 };
        let json = serde_json::to_string(&notification).unwrap();
        assert!(json.contains(notification.name()));
    }
}
