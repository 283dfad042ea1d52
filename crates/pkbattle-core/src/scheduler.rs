//! Fire-once timers on a virtual millisecond clock.
//!
//! Every time-driven behavior of the battle (the one-second clock tick, the
//! post-round cooldown, bubble expiry) is a timer in one [`Scheduler`]. The
//! scheduler never sleeps: the owner advances it with
//! [`Scheduler::pop_due`], and timers fire in `(due time, scheduling order)`
//! order so equal deadlines resolve deterministically.
//!
//! Handles are never reused. Cancelling a handle that already fired or was
//! already cancelled is a no-op, so callers can cancel unconditionally.

use std::collections::BTreeMap;

use pkbattle_types::EntityId;

/// Opaque, copyable reference to a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerHandle(u64);

impl TimerHandle {
    /// The raw sequence number, for logging.
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// What a timer means when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// One second of round clock elapsed.
    ClockTick,
    /// The post-round cooldown finished; the next round should begin.
    RoundCooldown,
    /// An ephemeral entity's display time plus grace elapsed.
    ExpireEntity(EntityId),
}

/// A timer popped from the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DueTimer {
    /// The handle returned when the timer was scheduled.
    pub handle: TimerHandle,
    /// Virtual time the timer was due.
    pub due_ms: u64,
    /// What the timer means.
    pub kind: TimerKind,
}

/// Deterministic timer queue.
#[derive(Debug, Default)]
pub struct Scheduler {
    /// Current virtual time.
    now_ms: u64,
    /// Next handle to hand out.
    next_seq: u64,
    /// Pending timers keyed by `(due, seq)`.
    queue: BTreeMap<(u64, u64), TimerKind>,
    /// Reverse index from handle to due time, for cancellation.
    due_by_seq: BTreeMap<u64, u64>,
}

impl Scheduler {
    /// Create an empty scheduler at virtual time 0.
    pub const fn new() -> Self {
        Self {
            now_ms: 0,
            next_seq: 0,
            queue: BTreeMap::new(),
            due_by_seq: BTreeMap::new(),
        }
    }

    /// Schedule `kind` to fire `delay_ms` after the current virtual time.
    pub fn schedule(&mut self, delay_ms: u64, kind: TimerKind) -> TimerHandle {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.saturating_add(1);
        let due = self.now_ms.saturating_add(delay_ms);
        self.queue.insert((due, seq), kind);
        self.due_by_seq.insert(seq, due);
        TimerHandle(seq)
    }

    /// Cancel a pending timer. Returns `true` if the timer was still
    /// pending.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let Some(due) = self.due_by_seq.remove(&handle.0) else {
            return false;
        };
        self.queue.remove(&(due, handle.0)).is_some()
    }

    /// Pop the earliest timer due at or before `until_ms`.
    ///
    /// Popping moves the virtual clock to the timer's due time. When
    /// nothing more is due the clock moves to `until_ms` (it never runs
    /// backwards) and `None` is returned. Timers scheduled while draining
    /// are considered in the same pass.
    pub fn pop_due(&mut self, until_ms: u64) -> Option<DueTimer> {
        let first = self
            .queue
            .first_key_value()
            .map(|(&(due, seq), &kind)| (due, seq, kind));
        match first {
            Some((due, seq, kind)) if due <= until_ms => {
                self.queue.remove(&(due, seq));
                self.due_by_seq.remove(&seq);
                self.now_ms = self.now_ms.max(due);
                Some(DueTimer {
                    handle: TimerHandle(seq),
                    due_ms: due,
                    kind,
                })
            }
            _ => {
                self.now_ms = self.now_ms.max(until_ms);
                None
            }
        }
    }

    /// Current virtual time in milliseconds.
    pub const fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Due time of the earliest pending timer.
    pub fn next_due(&self) -> Option<u64> {
        self.queue.first_key_value().map(|(&(due, _), _)| due)
    }

    /// Number of pending timers.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Whether a handle is still pending.
    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.due_by_seq.contains_key(&handle.0)
    }
}
