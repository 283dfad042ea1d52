//! The round countdown clock.
//!
//! The clock counts whole seconds down from the configured round length.
//! It does not know about time itself: the round engine calls
//! [`RoundClock::tick`] once per clock-tick timer.
//!
//! A duration change can take effect immediately ([`RoundClock::set_duration`])
//! or be parked until the next reset ([`RoundClock::defer_duration`]), so a
//! running round is never shortened or lengthened mid-flight.

/// Seconds per minute of configured round length.
const SECONDS_PER_MINUTE: u32 = 60;

/// Errors that can occur when configuring the clock.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ClockError {
    /// A round must last at least one minute.
    #[error("round duration must be at least 1 minute")]
    ZeroDuration,

    /// The duration does not fit in the seconds counter.
    #[error("round duration of {minutes} minutes is too long")]
    DurationOverflow {
        /// The rejected duration.
        minutes: u32,
    },
}

/// Countdown clock for one round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundClock {
    /// Configured round length in seconds.
    duration_seconds: u32,
    /// Duration waiting for the next reset, if any.
    pending_duration_seconds: Option<u32>,
    /// Seconds left in the current round.
    seconds_remaining: u32,
}

impl RoundClock {
    /// Create a full clock for rounds of `minutes` minutes.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError`] for zero or oversized durations.
    pub fn new(minutes: u32) -> Result<Self, ClockError> {
        let seconds = minutes_to_seconds(minutes)?;
        Ok(Self {
            duration_seconds: seconds,
            pending_duration_seconds: None,
            seconds_remaining: seconds,
        })
    }

    /// Count down one second. Returns the seconds left, never below 0.
    pub const fn tick(&mut self) -> u32 {
        self.seconds_remaining = self.seconds_remaining.saturating_sub(1);
        self.seconds_remaining
    }

    /// Refill the clock, applying any deferred duration first.
    pub const fn reset(&mut self) {
        if let Some(seconds) = self.pending_duration_seconds.take() {
            self.duration_seconds = seconds;
        }
        self.seconds_remaining = self.duration_seconds;
    }

    /// Change the round length and refill the clock now.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError`] for zero or oversized durations.
    pub fn set_duration(&mut self, minutes: u32) -> Result<(), ClockError> {
        let seconds = minutes_to_seconds(minutes)?;
        self.duration_seconds = seconds;
        self.pending_duration_seconds = None;
        self.seconds_remaining = seconds;
        Ok(())
    }

    /// Change the round length from the next reset on.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError`] for zero or oversized durations.
    pub fn defer_duration(&mut self, minutes: u32) -> Result<(), ClockError> {
        self.pending_duration_seconds = Some(minutes_to_seconds(minutes)?);
        Ok(())
    }

    /// Seconds left in the current round.
    pub const fn seconds_remaining(&self) -> u32 {
        self.seconds_remaining
    }

    /// Configured round length in seconds.
    pub const fn duration_seconds(&self) -> u32 {
        self.duration_seconds
    }

    /// Deferred round length, if a change is waiting for the next reset.
    pub const fn pending_duration_seconds(&self) -> Option<u32> {
        self.pending_duration_seconds
    }

    /// Whether the countdown reached zero.
    pub const fn is_expired(&self) -> bool {
        self.seconds_remaining == 0
    }

    /// Remaining time as `MM:SS`. Minutes are not capped at 59.
    pub fn display(&self) -> String {
        let minutes = self
            .seconds_remaining
            .checked_div(SECONDS_PER_MINUTE)
            .unwrap_or(0);
        let seconds = self
            .seconds_remaining
            .checked_rem(SECONDS_PER_MINUTE)
            .unwrap_or(0);
        format!("{minutes:02}:{seconds:02}")
    }
}

fn minutes_to_seconds(minutes: u32) -> Result<u32, ClockError> {
    if minutes == 0 {
        return Err(ClockError::ZeroDuration);
    }
    minutes
        .checked_mul(SECONDS_PER_MINUTE)
        .ok_or(ClockError::DurationOverflow { minutes })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn new_clock_is_full() {
        let clock = RoundClock::new(1).unwrap();
        assert_eq!(clock.seconds_remaining(), 60);
        assert_eq!(clock.duration_seconds(), 60);
        assert!(!clock.is_expired());
    }

    #[test]
    fn zero_minutes_is_rejected() {
        assert_eq!(RoundClock::new(0), Err(ClockError::ZeroDuration));
        let mut clock = RoundClock::new(1).unwrap();
        assert_eq!(clock.set_duration(0), Err(ClockError::ZeroDuration));
        assert_eq!(clock.defer_duration(0), Err(ClockError::ZeroDuration));
        assert_eq!(clock.duration_seconds(), 60);
    }

    #[test]
    fn oversized_duration_is_rejected() {
        assert_eq!(
            RoundClock::new(u32::MAX),
            Err(ClockError::DurationOverflow { minutes: u32::MAX })
        );
    }

    #[test]
    fn tick_stops_at_zero() {
        let mut clock = RoundClock::new(1).unwrap();
        for _ in 0..60 {
            let _ = clock.tick();
        }
        assert!(clock.is_expired());
        assert_eq!(clock.tick(), 0);
    }

    #[test]
    fn deferred_duration_waits_for_reset() {
        let mut clock = RoundClock::new(1).unwrap();
        let _ = clock.tick();
        clock.defer_duration(2).unwrap();
        assert_eq!(clock.seconds_remaining(), 59);
        assert_eq!(clock.pending_duration_seconds(), Some(120));

        clock.reset();
        assert_eq!(clock.seconds_remaining(), 120);
        assert_eq!(clock.duration_seconds(), 120);
        assert_eq!(clock.pending_duration_seconds(), None);
    }

    #[test]
    fn immediate_duration_refills_and_drops_pending() {
        let mut clock = RoundClock::new(5).unwrap();
        clock.defer_duration(3).unwrap();
        clock.set_duration(2).unwrap();
        assert_eq!(clock.seconds_remaining(), 120);
        clock.reset();
        assert_eq!(clock.duration_seconds(), 120);
    }

    #[test]
    fn display_is_minutes_and_seconds() {
        let mut clock = RoundClock::new(60).unwrap();
        assert_eq!(clock.display(), "60:00");
        let _ = clock.tick();
        assert_eq!(clock.display(), "59:59");
        clock.set_duration(1).unwrap();
        for _ in 0..55 {
            let _ = clock.tick();
        }
        assert_eq!(clock.display(), "00:05");
    }
}
