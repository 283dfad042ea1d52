//! The round state machine.
//!
//! [`BattleRoundEngine`] wraps the [`ScoringLedger`] with a countdown clock
//! and drives the round lifecycle:
//!
//! ```text
//!            start                 clock hits 0
//!   Idle ──────────────▶ Running ──────────────▶ Ended
//!    ▲  ◀── reset_all ──  │  ▲                     │
//!    │                pause│  │resume               │ cooldown elapsed
//!    │                    ▼  │                     ▼
//!    └──── reset_all ─── Paused        reset_round (Idle, then Running)
//! ```
//!
//! The engine owns no timers itself. It schedules clock ticks and the
//! post-round cooldown on the shared [`Scheduler`] and remembers the one
//! handle of each kind it is waiting for. A fired timer whose handle does
//! not match is stale and ignored, so a cancelled or superseded callback
//! can never act twice.
//!
//! The winner is latched in the same step the clock reaches zero. Points
//! that arrive during the cooldown still land on the ledger but cannot
//! change the decided outcome, and the reset wipes them.

use pkbattle_ledger::ScoringLedger;
use pkbattle_types::{Notification, RoundOutcome, RoundPhase, RoundState, Team};
use tracing::{debug, info, warn};

use crate::clock::{ClockError, RoundClock};
use crate::config::RoundConfig;
use crate::notify::Outbox;
use crate::scheduler::{Scheduler, TimerHandle, TimerKind};

/// How a round-duration change was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationChange {
    /// The clock was refilled with the new duration now.
    Applied,
    /// The new duration takes effect at the next round reset.
    Deferred,
    /// The value was unusable and ignored.
    Rejected,
}

/// Round lifecycle and scoring.
#[derive(Debug)]
pub struct BattleRoundEngine {
    ledger: ScoringLedger,
    clock: RoundClock,
    phase: RoundPhase,
    /// Pending clock tick, if the clock is running.
    tick_timer: Option<TimerHandle>,
    /// Pending post-round reset, if the round has ended.
    cooldown_timer: Option<TimerHandle>,
    last_outcome: Option<RoundOutcome>,
    rounds_completed: u64,
    /// Whether this round's warning has fired.
    warned: bool,
    warning_at_seconds: u32,
    cooldown_ms: u64,
    tick_interval_ms: u64,
}

impl BattleRoundEngine {
    /// Create an idle engine with a full clock.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError`] if the configured duration is unusable.
    pub fn new(config: &RoundConfig) -> Result<Self, ClockError> {
        Ok(Self {
            ledger: ScoringLedger::new(),
            clock: RoundClock::new(config.duration_minutes)?,
            phase: RoundPhase::Idle,
            tick_timer: None,
            cooldown_timer: None,
            last_outcome: None,
            rounds_completed: 0,
            warned: false,
            warning_at_seconds: config.warning_at_seconds,
            cooldown_ms: config.cooldown_ms,
            tick_interval_ms: config.tick_interval_ms.max(1),
        })
    }

    // -----------------------------------------------------------------------
    // Operator transitions
    // -----------------------------------------------------------------------

    /// Start the clock from Idle or Paused. No-op otherwise.
    pub fn start(&mut self, scheduler: &mut Scheduler, outbox: &mut Outbox) {
        match self.phase {
            RoundPhase::Idle | RoundPhase::Paused => {
                info!(
                    seconds_remaining = self.clock.seconds_remaining(),
                    "round clock started"
                );
                self.run(scheduler, outbox);
            }
            RoundPhase::Running | RoundPhase::Ended => {
                debug!(phase = ?self.phase, "start ignored");
            }
        }
    }

    /// Pause a running clock. No-op outside Running.
    pub fn pause(&mut self, scheduler: &mut Scheduler, outbox: &mut Outbox) {
        if self.phase != RoundPhase::Running {
            debug!(phase = ?self.phase, "pause ignored");
            return;
        }
        if let Some(handle) = self.tick_timer.take() {
            let _ = scheduler.cancel(handle);
        }
        info!(seconds_remaining = self.clock.seconds_remaining(), "round paused");
        self.set_phase(RoundPhase::Paused, outbox);
    }

    /// Resume a paused clock. No-op outside Paused.
    pub fn resume(&mut self, scheduler: &mut Scheduler, outbox: &mut Outbox) {
        if self.phase != RoundPhase::Paused {
            debug!(phase = ?self.phase, "resume ignored");
            return;
        }
        info!(seconds_remaining = self.clock.seconds_remaining(), "round resumed");
        self.run(scheduler, outbox);
    }

    /// Begin the next round: zero the points, refill the clock (picking up
    /// a deferred duration), and start running again.
    ///
    /// Called by the cooldown timer. Any pending tick or cooldown is
    /// cancelled first.
    pub fn reset_round(&mut self, scheduler: &mut Scheduler, outbox: &mut Outbox) {
        self.cancel_timers(scheduler);
        self.set_phase(RoundPhase::Idle, outbox);
        outbox.extend(self.ledger.reset_round_points());
        self.clock.reset();
        self.warned = false;
        outbox.push(self.clock_notification());
        outbox.push(Notification::RoundReset);
        info!(
            round = self.rounds_completed.saturating_add(1),
            duration_seconds = self.clock.duration_seconds(),
            "next round starting"
        );
        self.run(scheduler, outbox);
    }

    /// Stop everything and return to Idle with zero points, zero round
    /// wins, and a full clock. Cancels any pending tick and cooldown.
    pub fn reset_all(&mut self, scheduler: &mut Scheduler, outbox: &mut Outbox) {
        self.cancel_timers(scheduler);
        outbox.extend(self.ledger.reset_all());
        self.clock.reset();
        self.warned = false;
        self.last_outcome = None;
        self.rounds_completed = 0;
        outbox.push(self.clock_notification());
        if self.phase != RoundPhase::Idle {
            self.set_phase(RoundPhase::Idle, outbox);
        }
        info!("battle fully reset");
    }

    /// Change the round length.
    ///
    /// In Idle and Paused the clock is refilled immediately. In Running and
    /// Ended the change waits for the next round reset. Zero minutes is
    /// rejected.
    pub fn set_round_duration(&mut self, minutes: u32, outbox: &mut Outbox) -> DurationChange {
        let immediate = matches!(self.phase, RoundPhase::Idle | RoundPhase::Paused);
        let result = if immediate {
            self.clock.set_duration(minutes)
        } else {
            self.clock.defer_duration(minutes)
        };
        if let Err(err) = result {
            warn!(minutes, error = %err, "round duration change rejected");
            return DurationChange::Rejected;
        }
        if immediate {
            self.warned = false;
            outbox.push(self.clock_notification());
            info!(minutes, "round duration changed");
            DurationChange::Applied
        } else {
            info!(minutes, "round duration change deferred to next round");
            DurationChange::Deferred
        }
    }

    // -----------------------------------------------------------------------
    // Scoring
    // -----------------------------------------------------------------------

    /// Credit points to a team.
    pub fn add_points(&mut self, team: Team, amount: u64, outbox: &mut Outbox) {
        outbox.push(self.ledger.add_points(team, amount));
    }

    /// Credit points to the team named by a persisted tag. Returns the team
    /// credited, or `None` for an unknown tag.
    pub fn add_points_for_tag(&mut self, tag: &str, amount: u64, outbox: &mut Outbox) -> Option<Team> {
        let notification = self.ledger.add_points_for_tag(tag, amount)?;
        outbox.push(notification);
        Team::from_tag(tag)
    }

    // -----------------------------------------------------------------------
    // Timers
    // -----------------------------------------------------------------------

    /// Handle a fired timer. Returns `true` if the timer was the one the
    /// engine was waiting for; stale and foreign timers return `false`.
    pub fn on_timer(
        &mut self,
        handle: TimerHandle,
        kind: TimerKind,
        scheduler: &mut Scheduler,
        outbox: &mut Outbox,
    ) -> bool {
        match kind {
            TimerKind::ClockTick if self.tick_timer == Some(handle) => {
                self.tick_timer = None;
                self.on_clock_tick(scheduler, outbox);
                true
            }
            TimerKind::RoundCooldown if self.cooldown_timer == Some(handle) => {
                self.cooldown_timer = None;
                self.reset_round(scheduler, outbox);
                true
            }
            TimerKind::ClockTick | TimerKind::RoundCooldown => {
                debug!(timer = handle.raw(), ?kind, "stale round timer ignored");
                false
            }
            TimerKind::ExpireEntity(_) => false,
        }
    }

    fn on_clock_tick(&mut self, scheduler: &mut Scheduler, outbox: &mut Outbox) {
        if self.phase != RoundPhase::Running {
            return;
        }
        let remaining = self.clock.tick();
        outbox.push(Notification::ClockTick {
            seconds_remaining: remaining,
        });

        if self.clock.is_expired() {
            self.end_round(scheduler, outbox);
            return;
        }
        if !self.warned && self.warning_at_seconds > 0 && remaining == self.warning_at_seconds {
            self.warned = true;
            info!(seconds_remaining = remaining, "round ending soon");
            outbox.push(Notification::RoundWarning {
                seconds_remaining: remaining,
            });
        }
        self.tick_timer = Some(scheduler.schedule(self.tick_interval_ms, TimerKind::ClockTick));
    }

    fn end_round(&mut self, scheduler: &mut Scheduler, outbox: &mut Outbox) {
        self.set_phase(RoundPhase::Ended, outbox);
        let outcome = self.ledger.decide_round_winner();
        self.last_outcome = Some(outcome);
        self.rounds_completed = self.rounds_completed.saturating_add(1);

        info!(
            outcome = ?outcome,
            team_a_points = self.ledger.points(Team::A),
            team_b_points = self.ledger.points(Team::B),
            "round ended"
        );
        if let Some(team) = outcome.winner() {
            outbox.extend(self.ledger.record_round_win(team));
        }
        self.cooldown_timer = Some(scheduler.schedule(self.cooldown_ms, TimerKind::RoundCooldown));
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Snapshot of the round state.
    pub const fn state(&self) -> RoundState {
        RoundState {
            team_a_round_wins: self.ledger.round_wins(Team::A),
            team_b_round_wins: self.ledger.round_wins(Team::B),
            team_a_points: self.ledger.points(Team::A),
            team_b_points: self.ledger.points(Team::B),
            seconds_remaining: self.clock.seconds_remaining(),
            round_duration_seconds: self.clock.duration_seconds(),
            phase: self.phase,
            rounds_completed: self.rounds_completed,
            last_outcome: self.last_outcome,
        }
    }

    /// Current phase.
    pub const fn phase(&self) -> RoundPhase {
        self.phase
    }

    /// The scoring ledger.
    pub const fn ledger(&self) -> &ScoringLedger {
        &self.ledger
    }

    /// The round clock.
    pub const fn clock(&self) -> &RoundClock {
        &self.clock
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn run(&mut self, scheduler: &mut Scheduler, outbox: &mut Outbox) {
        if let Some(handle) = self.tick_timer.take() {
            let _ = scheduler.cancel(handle);
        }
        self.tick_timer = Some(scheduler.schedule(self.tick_interval_ms, TimerKind::ClockTick));
        self.set_phase(RoundPhase::Running, outbox);
    }

    fn cancel_timers(&mut self, scheduler: &mut Scheduler) {
        if let Some(handle) = self.tick_timer.take() {
            let _ = scheduler.cancel(handle);
        }
        if let Some(handle) = self.cooldown_timer.take() {
            let _ = scheduler.cancel(handle);
        }
    }

    fn set_phase(&mut self, phase: RoundPhase, outbox: &mut Outbox) {
        self.phase = phase;
        outbox.push(Notification::PhaseChanged { phase });
    }

    const fn clock_notification(&self) -> Notification {
        Notification::ClockTick {
            seconds_remaining: self.clock.seconds_remaining(),
        }
    }
}
