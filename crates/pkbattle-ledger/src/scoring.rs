//! The authoritative round scoreboard.
//!
//! [`ScoringLedger`] holds the two current-round point totals and the two
//! round-win tallies. Every mutator returns the notifications describing
//! the change instead of publishing them, so the owner decides when they
//! are flushed.
//!
//! # Invariants
//!
//! - Points only grow within a round; they return to zero only through
//!   [`ScoringLedger::reset_round_points`] or [`ScoringLedger::reset_all`].
//! - Round wins grow by exactly one per decisive round and return to zero
//!   only through [`ScoringLedger::reset_all`].
//! - Additions saturate at `u64::MAX` rather than wrapping.

use pkbattle_types::{Notification, RoundOutcome, Team};
use tracing::{debug, warn};

/// Current-round points and round wins for both teams.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoringLedger {
    team_a_points: u64,
    team_b_points: u64,
    team_a_round_wins: u32,
    team_b_round_wins: u32,
}

impl ScoringLedger {
    /// Create an empty ledger.
    pub const fn new() -> Self {
        Self {
            team_a_points: 0,
            team_b_points: 0,
            team_a_round_wins: 0,
            team_b_round_wins: 0,
        }
    }

    /// Add points to a team's current-round total.
    ///
    /// A zero amount still reports the (unchanged) total.
    pub fn add_points(&mut self, team: Team, amount: u64) -> Notification {
        let slot = self.points_mut(team);
        *slot = slot.saturating_add(amount);
        let total = *slot;
        debug!(team = %team, amount, total, "points added");
        Notification::PointsChanged { team, total }
    }

    /// Add points to the team named by a persisted tag.
    ///
    /// An unrecognized tag changes nothing and returns `None`.
    pub fn add_points_for_tag(&mut self, tag: &str, amount: u64) -> Option<Notification> {
        let Some(team) = Team::from_tag(tag) else {
            warn!(tag, amount, "unknown team tag, points dropped");
            return None;
        };
        Some(self.add_points(team, amount))
    }

    /// Decide the outcome from the current totals. Equal totals (including
    /// 0-0) are a draw.
    pub const fn decide_round_winner(&self) -> RoundOutcome {
        if self.team_a_points > self.team_b_points {
            RoundOutcome::TeamA
        } else if self.team_b_points > self.team_a_points {
            RoundOutcome::TeamB
        } else {
            RoundOutcome::Draw
        }
    }

    /// Credit one round win to `team`.
    ///
    /// Returns `[RoundWon, RoundWinsChanged]` in that order.
    pub fn record_round_win(&mut self, team: Team) -> [Notification; 2] {
        match team {
            Team::A => self.team_a_round_wins = self.team_a_round_wins.saturating_add(1),
            Team::B => self.team_b_round_wins = self.team_b_round_wins.saturating_add(1),
        }
        [Notification::RoundWon { team }, self.round_wins_notification()]
    }

    /// Zero both current-round totals, keeping round wins.
    ///
    /// Returns the two `PointsChanged` notifications, team A first.
    pub fn reset_round_points(&mut self) -> [Notification; 2] {
        self.team_a_points = 0;
        self.team_b_points = 0;
        [
            Notification::PointsChanged {
                team: Team::A,
                total: 0,
            },
            Notification::PointsChanged {
                team: Team::B,
                total: 0,
            },
        ]
    }

    /// Zero points and round wins.
    ///
    /// Returns the notifications for both point totals followed by the
    /// round-win tally.
    pub fn reset_all(&mut self) -> [Notification; 3] {
        self.team_a_round_wins = 0;
        self.team_b_round_wins = 0;
        let [a, b] = self.reset_round_points();
        [a, b, self.round_wins_notification()]
    }

    /// Current-round points for a team.
    pub const fn points(&self, team: Team) -> u64 {
        match team {
            Team::A => self.team_a_points,
            Team::B => self.team_b_points,
        }
    }

    /// Round wins for a team.
    pub const fn round_wins(&self, team: Team) -> u32 {
        match team {
            Team::A => self.team_a_round_wins,
            Team::B => self.team_b_round_wins,
        }
    }

    /// Whole-percent split of the current-round points, team A first.
    ///
    /// The two shares always sum to 100. With no points on the board the
    /// split is 50/50.
    pub fn point_shares(&self) -> (u8, u8) {
        let a = u128::from(self.team_a_points);
        let total = a.saturating_add(u128::from(self.team_b_points));
        let share_a = a
            .saturating_mul(100)
            .checked_div(total)
            .and_then(|share| u8::try_from(share).ok())
            .unwrap_or(50);
        (share_a, 100_u8.saturating_sub(share_a))
    }

    const fn points_mut(&mut self, team: Team) -> &mut u64 {
        match team {
            Team::A => &mut self.team_a_points,
            Team::B => &mut self.team_b_points,
        }
    }

    const fn round_wins_notification(&self) -> Notification {
        Notification::RoundWinsChanged {
            team_a_wins: self.team_a_round_wins,
            team_b_wins: self.team_b_round_wins,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger_with(a: u64, b: u64) -> ScoringLedger {
        let mut ledger = ScoringLedger::new();
        let _ = ledger.add_points(Team::A, a);
        let _ = ledger.add_points(Team::B, b);
        ledger
    }

    #[test]
    fn new_ledger_is_empty() {
        let ledger = ScoringLedger::new();
        assert_eq!(ledger.points(Team::A), 0);
        assert_eq!(ledger.points(Team::B), 0);
        assert_eq!(ledger.round_wins(Team::A), 0);
        assert_eq!(ledger.decide_round_winner(), RoundOutcome::Draw);
    }

    #[test]
    fn add_points_reports_new_total() {
        let mut ledger = ScoringLedger::new();
        let _ = ledger.add_points(Team::B, 5);
        let notification = ledger.add_points(Team::B, 25);
        assert_eq!(
            notification,
            Notification::PointsChanged {
                team: Team::B,
                total: 30
            }
        );
    }

    #[test]
    fn add_points_saturates() {
        let mut ledger = ledger_with(u64::MAX - 1, 0);
        let _ = ledger.add_points(Team::A, 10);
        assert_eq!(ledger.points(Team::A), u64::MAX);
    }

    #[test]
    fn unknown_tag_is_a_no_op() {
        let mut ledger = ledger_with(3, 4);
        assert!(ledger.add_points_for_tag("C", 100).is_none());
        assert!(ledger.add_points_for_tag("", 100).is_none());
        assert_eq!(ledger, ledger_with(3, 4));
    }

    #[test]
    fn known_tag_adds_points() {
        let mut ledger = ScoringLedger::new();
        let notification = ledger.add_points_for_tag("b", 7);
        assert_eq!(
            notification,
            Some(Notification::PointsChanged {
                team: Team::B,
                total: 7
            })
        );
    }

    #[test]
    fn winner_requires_strictly_more_points() {
        assert_eq!(ledger_with(50, 30).decide_round_winner(), RoundOutcome::TeamA);
        assert_eq!(ledger_with(30, 50).decide_round_winner(), RoundOutcome::TeamB);
        assert_eq!(ledger_with(40, 40).decide_round_winner(), RoundOutcome::Draw);
    }

    #[test]
    fn record_round_win_emits_won_then_tally() {
        let mut ledger = ScoringLedger::new();
        let _ = ledger.record_round_win(Team::B);
        let [won, tally] = ledger.record_round_win(Team::B);
        assert_eq!(won, Notification::RoundWon { team: Team::B });
        assert_eq!(
            tally,
            Notification::RoundWinsChanged {
                team_a_wins: 0,
                team_b_wins: 2
            }
        );
    }

    #[test]
    fn reset_round_points_keeps_wins() {
        let mut ledger = ledger_with(50, 30);
        let _ = ledger.record_round_win(Team::A);
        let notifications = ledger.reset_round_points();
        assert_eq!(ledger.points(Team::A), 0);
        assert_eq!(ledger.points(Team::B), 0);
        assert_eq!(ledger.round_wins(Team::A), 1);
        assert!(matches!(
            notifications,
            [
                Notification::PointsChanged { team: Team::A, total: 0 },
                Notification::PointsChanged { team: Team::B, total: 0 }
            ]
        ));
    }

    #[test]
    fn reset_all_zeroes_everything() {
        let mut ledger = ledger_with(10, 20);
        let _ = ledger.record_round_win(Team::A);
        let [_, _, tally] = ledger.reset_all();
        assert_eq!(ledger, ScoringLedger::new());
        assert_eq!(
            tally,
            Notification::RoundWinsChanged {
                team_a_wins: 0,
                team_b_wins: 0
            }
        );
    }

    #[test]
    fn point_shares_split_the_bar() {
        assert_eq!(ScoringLedger::new().point_shares(), (50, 50));
        assert_eq!(ledger_with(50, 30).point_shares(), (62, 38));
        assert_eq!(ledger_with(0, 9).point_shares(), (0, 100));
        assert_eq!(ledger_with(u64::MAX, u64::MAX).point_shares(), (50, 50));
    }
}
