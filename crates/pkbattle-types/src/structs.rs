//! Snapshot structs describing display entities and round state.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{EntityKind, EventKind, RoundOutcome, RoundPhase, Team, ZoneAffinity};
use crate::ids::{EntityId, ViewerId};

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// Top-left pixel coordinate of a display entity on the stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Position {
    /// Horizontal offset in pixels.
    pub x: i32,
    /// Vertical offset in pixels.
    pub y: i32,
}

impl Position {
    /// Create a position.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

// ---------------------------------------------------------------------------
// Display entities
// ---------------------------------------------------------------------------

/// Visual parameters the renderer applies to a bubble.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct BubbleStyle {
    /// Animation effect id (`"quick_pop"`, `"sparkle_zoom"`, ...).
    pub effect: String,
    /// Bubble diameter in pixels.
    pub size_px: u32,
    /// Accent color as `#RRGGBB`.
    pub color: String,
    /// Border width in pixels; `None` uses the renderer default.
    pub border_width: Option<u32>,
    /// Glow strength; `None` uses the renderer default.
    pub glow_intensity: Option<u32>,
}

/// What a display entity shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct BubbleContent {
    /// Interaction that produced the entity.
    pub event: EventKind,
    /// Name shown on the bubble.
    pub username: String,
    /// Avatar image URL, if known.
    pub avatar_url: Option<String>,
    /// Secondary text: comment text, gift name and count, tier name.
    pub detail: Option<String>,
    /// Visual style.
    pub style: BubbleStyle,
}

/// A live display entity owned by one of the core's managers.
///
/// Created on spawn, moved only by its owning manager (grid reflow), and
/// destroyed exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct DisplayEntity {
    /// Unique, never-reused id.
    pub id: EntityId,
    /// Ephemeral (TTL) or persistent (explicit removal).
    pub kind: EntityKind,
    /// Viewer that caused the entity, if known.
    pub owner: Option<ViewerId>,
    /// Engine time of the spawn, in milliseconds.
    pub spawned_at_ms: u64,
    /// Nominal display duration; `None` for persistent entities.
    pub ttl_ms: Option<u64>,
    /// Placement hint the position was drawn from.
    pub zone: ZoneAffinity,
    /// Current position on the stage.
    pub position: Position,
    /// Rendered content.
    pub content: BubbleContent,
}

/// A viewer's place in the persistent grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ViewerSlot {
    /// The viewer occupying the slot.
    pub viewer_id: ViewerId,
    /// Dense 0-based grid index.
    pub grid_index: u32,
    /// The persistent entity drawn for this viewer.
    pub entity: DisplayEntity,
}

// ---------------------------------------------------------------------------
// Round state
// ---------------------------------------------------------------------------

/// Read-only snapshot of the round state machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RoundState {
    /// Rounds won by team A since the last full reset.
    pub team_a_round_wins: u32,
    /// Rounds won by team B since the last full reset.
    pub team_b_round_wins: u32,
    /// Team A points in the current round.
    pub team_a_points: u64,
    /// Team B points in the current round.
    pub team_b_points: u64,
    /// Seconds left on the round clock.
    pub seconds_remaining: u32,
    /// Configured round length in seconds.
    pub round_duration_seconds: u32,
    /// Current phase.
    pub phase: RoundPhase,
    /// Rounds that reached zero since the last full reset (draws included).
    pub rounds_completed: u64,
    /// Outcome latched when the clock last reached zero.
    pub last_outcome: Option<RoundOutcome>,
}

impl RoundState {
    /// Current-round points for one team.
    pub const fn points(&self, team: Team) -> u64 {
        match team {
            Team::A => self.team_a_points,
            Team::B => self.team_b_points,
        }
    }

    /// Round wins for one team.
    pub const fn round_wins(&self, team: Team) -> u32 {
        match team {
            Team::A => self.team_a_round_wins,
            Team::B => self.team_b_round_wins,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_state() -> RoundState {
        RoundState {
            team_a_round_wins: 2,
            team_b_round_wins: 1,
            team_a_points: 50,
            team_b_points: 30,
            seconds_remaining: 12,
            round_duration_seconds: 60,
            phase: RoundPhase::Running,
            rounds_completed: 3,
            last_outcome: Some(RoundOutcome::Draw),
        }
    }

    #[test]
    fn per_team_accessors() {
        let state = sample_state();
        assert_eq!(state.points(Team::A), 50);
        assert_eq!(state.points(Team::B), 30);
        assert_eq!(state.round_wins(Team::A), 2);
        assert_eq!(state.round_wins(Team::B), 1);
    }

    #[test]
    fn round_state_serializes_phase_in_snake_case() {
        let json = serde_json::to_string(&sample_state()).unwrap_or_default();
        assert!(json.contains("\"phase\":\"running\""));
        assert!(json.contains("\"last_outcome\":\"draw\""));
    }
}
