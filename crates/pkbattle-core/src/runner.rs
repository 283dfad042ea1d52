//! Async driver that connects a [`Battle`] to the outside world.
//!
//! [`run_battle`] is the one logical event loop. Producers (the live-event
//! client, the simulator, operator controls) run in their own tasks and
//! only send [`Inbound`] messages over a single `mpsc` channel, so the
//! battle itself is never touched concurrently.
//!
//! Wall-clock time reaches the battle in two ways: on every frame of a
//! fixed interval, and right before each inbound message is handled, so a
//! message always sees timers that were due before it arrived.
//!
//! The loop ends on a [`Command::Shutdown`], when every sender is dropped,
//! or when the configured real-time limit elapses. In every case the
//! battle is torn down with a final shutdown before returning.

use std::time::Duration;

use pkbattle_types::{InboundEvent, RoundState};
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{info, warn};

use crate::battle::{Battle, Command};
use crate::config::RuntimeConfig;
use crate::notify::NotificationSink;

/// Errors that can occur when starting the loop.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// The battle was already shut down before the loop started.
    #[error("battle is already shut down")]
    AlreadyShutDown,
}

/// One message on the inbound channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// A social interaction.
    Event(InboundEvent),
    /// An operator command.
    Command(Command),
}

/// Loop settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Real milliseconds between scheduler advances.
    pub frame_interval_ms: u64,
    /// Wall-clock limit in seconds. 0 runs until stopped.
    pub max_real_time_seconds: u64,
}

impl RunOptions {
    /// Take the loop settings from the runtime configuration.
    pub const fn from_config(config: &RuntimeConfig) -> Self {
        Self {
            frame_interval_ms: config.frame_interval_ms,
            max_real_time_seconds: config.max_real_time_seconds,
        }
    }
}

impl Default for RunOptions {
    fn default() -> Self {
        Self::from_config(&RuntimeConfig::default())
    }
}

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEndReason {
    /// A shutdown command arrived.
    Shutdown,
    /// Every sender was dropped.
    ChannelClosed,
    /// The real-time limit elapsed.
    MaxRealTimeReached,
}

/// Result of a finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Why the loop stopped.
    pub end_reason: RunEndReason,
    /// Inbound events handled.
    pub events_handled: u64,
    /// Operator commands applied, the final shutdown excluded.
    pub commands_applied: u64,
    /// Scheduler timers fired.
    pub timers_fired: u64,
    /// Round state just before teardown.
    pub final_state: RoundState,
    /// Wall-clock run time in milliseconds.
    pub elapsed_ms: u64,
}

/// Run the event loop until shutdown, channel close, or the time limit.
///
/// # Errors
///
/// Returns [`RunnerError::AlreadyShutDown`] if `battle` was shut down
/// before the call.
pub async fn run_battle(
    battle: &mut Battle,
    inbound: &mut mpsc::Receiver<Inbound>,
    sink: &mut dyn NotificationSink,
    options: &RunOptions,
) -> Result<RunSummary, RunnerError> {
    if battle.is_shut_down() {
        return Err(RunnerError::AlreadyShutDown);
    }

    let started = Instant::now();
    let time_limit_ms = (options.max_real_time_seconds > 0)
        .then(|| options.max_real_time_seconds.saturating_mul(1000));
    let mut frames = tokio::time::interval(Duration::from_millis(options.frame_interval_ms.max(1)));
    frames.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut events_handled: u64 = 0;
    let mut commands_applied: u64 = 0;
    let mut timers_fired: u64 = 0;

    info!(
        frame_interval_ms = options.frame_interval_ms,
        max_real_time_seconds = options.max_real_time_seconds,
        "battle loop starting"
    );

    let end_reason = loop {
        tokio::select! {
            message = inbound.recv() => {
                let Some(message) = message else {
                    info!("inbound channel closed");
                    break RunEndReason::ChannelClosed;
                };
                let fired = battle.advance_to(elapsed_ms(started), sink);
                timers_fired = timers_fired.saturating_add(count_u64(fired));
                match message {
                    Inbound::Event(event) => {
                        let _ = battle.handle_event(&event, sink);
                        events_handled = events_handled.saturating_add(1);
                    }
                    Inbound::Command(Command::Shutdown) => {
                        info!("shutdown requested");
                        break RunEndReason::Shutdown;
                    }
                    Inbound::Command(command) => {
                        battle.apply(command, sink);
                        commands_applied = commands_applied.saturating_add(1);
                    }
                }
            }
            _ = frames.tick() => {
                let now_ms = elapsed_ms(started);
                let fired = battle.advance_to(now_ms, sink);
                timers_fired = timers_fired.saturating_add(count_u64(fired));
                if let Some(limit) = time_limit_ms {
                    if now_ms >= limit {
                        warn!(limit_ms = limit, "real-time limit reached");
                        break RunEndReason::MaxRealTimeReached;
                    }
                }
            }
        }
    };

    let elapsed = elapsed_ms(started);
    let fired = battle.advance_to(elapsed, sink);
    timers_fired = timers_fired.saturating_add(count_u64(fired));
    let final_state = battle.state();
    battle.apply(Command::Shutdown, sink);

    let summary = RunSummary {
        end_reason,
        events_handled,
        commands_applied,
        timers_fired,
        final_state,
        elapsed_ms: elapsed,
    };
    log_run_end(&summary);
    Ok(summary)
}

/// Log the end of a run.
pub fn log_run_end(summary: &RunSummary) {
    info!(
        reason = ?summary.end_reason,
        events = summary.events_handled,
        commands = summary.commands_applied,
        timers = summary.timers_fired,
        rounds = summary.final_state.rounds_completed,
        team_a_wins = summary.final_state.team_a_round_wins,
        team_b_wins = summary.final_state.team_b_round_wins,
        elapsed_ms = summary.elapsed_ms,
        "battle loop ended"
    );
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

fn count_u64(count: usize) -> u64 {
    u64::try_from(count).unwrap_or(u64::MAX)
}
