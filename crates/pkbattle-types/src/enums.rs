//! Enumeration types shared across the PK battle workspace.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Teams
// ---------------------------------------------------------------------------

/// One side of the battle.
///
/// Serialized as the single-letter tags `"A"` and `"B"` used by the
/// persisted assignment tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum Team {
    /// Team A (left / top side of the battle view).
    #[serde(rename = "A")]
    A,
    /// Team B (right / bottom side of the battle view).
    #[serde(rename = "B")]
    B,
}

impl Team {
    /// Both teams in display order.
    pub const ALL: [Self; 2] = [Self::A, Self::B];

    /// Parse a persisted team tag. Accepts `"A"`/`"B"` in either case.
    ///
    /// Returns `None` for anything else; callers treat an unknown tag as a
    /// scoring no-op.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim() {
            "A" | "a" => Some(Self::A),
            "B" | "b" => Some(Self::B),
            _ => None,
        }
    }

    /// The persisted tag for this team.
    pub const fn tag(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
        }
    }

    /// The opposing team.
    pub const fn opponent(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }
}

impl core::fmt::Display for Team {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.tag())
    }
}

// ---------------------------------------------------------------------------
// Inbound event kinds
// ---------------------------------------------------------------------------

/// The kind of social interaction delivered by the live-event source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum EventKind {
    /// A viewer joined the stream.
    Join,
    /// A viewer sent likes.
    Like,
    /// A viewer posted a chat comment.
    Comment,
    /// A viewer shared the stream.
    Share,
    /// A viewer followed the streamer.
    Follow,
    /// A viewer sent a paid gift.
    Gift,
}

impl EventKind {
    /// All event kinds, in the order the original source reports them.
    pub const ALL: [Self; 6] = [
        Self::Join,
        Self::Like,
        Self::Comment,
        Self::Share,
        Self::Follow,
        Self::Gift,
    ];

    /// Lowercase wire name (`"join"`, `"gift"`, ...).
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Join => "join",
            Self::Like => "like",
            Self::Comment => "comment",
            Self::Share => "share",
            Self::Follow => "follow",
            Self::Gift => "gift",
        }
    }

    /// Whether this kind scores through the per-interaction point table.
    pub const fn is_scored_interaction(self) -> bool {
        matches!(self, Self::Like | Self::Comment)
    }
}

impl core::fmt::Display for EventKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Display placement
// ---------------------------------------------------------------------------

/// Placement hint for a spawned display entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ZoneAffinity {
    /// Top strip of the stage, random horizontal position.
    Top,
    /// Bottom strip of the stage, random horizontal position.
    Bottom,
    /// Left edge of the battle view, random vertical position.
    Left,
    /// Right edge of the battle view, random vertical position.
    Right,
    /// Bottom strip, biased toward team A's side.
    TeamA,
    /// Bottom strip, biased toward team B's side.
    TeamB,
    /// Anywhere on the stage.
    Free,
}

impl ZoneAffinity {
    /// The team-biased zone for a team.
    pub const fn for_team(team: Team) -> Self {
        match team {
            Team::A => Self::TeamA,
            Team::B => Self::TeamB,
        }
    }

    /// The team implied by a team zone, if any.
    pub const fn implied_team(self) -> Option<Team> {
        match self {
            Self::TeamA => Some(Team::A),
            Self::TeamB => Some(Team::B),
            Self::Top | Self::Bottom | Self::Left | Self::Right | Self::Free => None,
        }
    }
}

/// Whether a display entity expires on its own or lives until removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum EntityKind {
    /// Has a time-to-live and is removed by the scheduler.
    Ephemeral,
    /// Has no time-to-live; removed explicitly (viewer left, eviction).
    Persistent,
}

/// Why a display entity was destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum RemovalReason {
    /// Time-to-live plus grace elapsed.
    Expired,
    /// Explicit removal by a caller.
    Removed,
    /// Evicted to make room for a newer viewer.
    Evicted,
    /// Forced teardown (clear-all, shutdown, display toggled off).
    Cleared,
}

// ---------------------------------------------------------------------------
// Round lifecycle
// ---------------------------------------------------------------------------

/// Phase of the round state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum RoundPhase {
    /// Not started, or fully reset.
    Idle,
    /// Clock ticking.
    Running,
    /// Clock stopped by the operator; resumable.
    Paused,
    /// Clock hit zero; winner latched; cooldown before the next round.
    Ended,
}

/// Result of a finished round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum RoundOutcome {
    /// Team A had strictly more points.
    TeamA,
    /// Team B had strictly more points.
    TeamB,
    /// Equal points. No round win is awarded, but the round still resets.
    Draw,
}

impl RoundOutcome {
    /// The winning team, or `None` for a draw.
    pub const fn winner(self) -> Option<Team> {
        match self {
            Self::TeamA => Some(Team::A),
            Self::TeamB => Some(Team::B),
            Self::Draw => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn team_tags_parse_both_cases() {
        assert_eq!(Team::from_tag("A"), Some(Team::A));
        assert_eq!(Team::from_tag("b"), Some(Team::B));
        assert_eq!(Team::from_tag(" B "), Some(Team::B));
        assert_eq!(Team::from_tag("C"), None);
        assert_eq!(Team::from_tag(""), None);
    }

    #[test]
    fn team_serializes_as_tag() {
        let json = serde_json::to_string(&Team::B).ok();
        assert_eq!(json.as_deref(), Some("\"B\""));
        let parsed: Result<Team, _> = serde_json::from_str("\"A\"");
        assert_eq!(parsed.ok(), Some(Team::A));
    }

    #[test]
    fn opponent_flips() {
        assert_eq!(Team::A.opponent(), Team::B);
        assert_eq!(Team::B.opponent(), Team::A);
    }

    #[test]
    fn event_kind_wire_names() {
        for kind in EventKind::ALL {
            let json = serde_json::to_string(&kind).ok();
            assert_eq!(json, Some(format!("\"{}\"", kind.as_str())));
        }
    }

    #[test]
    fn zone_affinity_team_round_trip() {
        assert_eq!(ZoneAffinity::for_team(Team::A).implied_team(), Some(Team::A));
        assert_eq!(ZoneAffinity::for_team(Team::B).implied_team(), Some(Team::B));
        assert_eq!(ZoneAffinity::Top.implied_team(), None);
    }

    #[test]
    fn zone_affinity_uses_snake_case() {
        let parsed: Result<ZoneAffinity, _> = serde_json::from_str("\"team_a\"");
        assert_eq!(parsed.ok(), Some(ZoneAffinity::TeamA));
    }

    #[test]
    fn draw_has_no_winner() {
        assert_eq!(RoundOutcome::Draw.winner(), None);
        assert_eq!(RoundOutcome::TeamB.winner(), Some(Team::B));
    }
}
