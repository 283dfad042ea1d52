//! Delivery of outbound notifications.
//!
//! Components never talk to the renderer directly. They append to an
//! [`Outbox`] while they mutate, and the dispatch point flushes the outbox
//! into a [`NotificationSink`] at the end of every step. Flushing preserves
//! emission order and never merges or drops entries.

use pkbattle_types::Notification;

/// Receiver of outbound notifications.
///
/// Implementations should return quickly; they run on the event loop.
pub trait NotificationSink: Send {
    /// Called once per notification, in emission order.
    fn notify(&mut self, notification: &Notification);
}

/// A sink that discards everything.
pub struct NoOpSink;

impl NotificationSink for NoOpSink {
    fn notify(&mut self, _notification: &Notification) {}
}

/// A sink that keeps every notification, for tests and snapshots.
#[derive(Debug, Default)]
pub struct RecordingSink {
    /// Everything received so far, oldest first.
    pub notifications: Vec<Notification>,
}

impl RecordingSink {
    /// Create an empty recording sink.
    pub const fn new() -> Self {
        Self {
            notifications: Vec::new(),
        }
    }

    /// Take everything recorded so far, leaving the sink empty.
    pub fn take(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    /// Variant names of everything recorded, oldest first.
    pub fn names(&self) -> Vec<&'static str> {
        self.notifications.iter().map(Notification::name).collect()
    }

    /// How many recorded notifications have the given variant name.
    pub fn count_of(&self, name: &str) -> usize {
        self.notifications
            .iter()
            .filter(|notification| notification.name() == name)
            .count()
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&mut self, notification: &Notification) {
        self.notifications.push(notification.clone());
    }
}

/// Forwards every notification to each registered sink in turn.
#[derive(Default)]
pub struct FanOut {
    sinks: Vec<Box<dyn NotificationSink>>,
}

impl FanOut {
    /// Create a fan-out with no subscribers.
    pub const fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    /// Register a subscriber. Subscribers are called in registration order.
    #[must_use]
    pub fn with(mut self, sink: Box<dyn NotificationSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Number of subscribers.
    pub const fn len(&self) -> usize {
        self.sinks.len()
    }

    /// Whether there are no subscribers.
    pub const fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl NotificationSink for FanOut {
    fn notify(&mut self, notification: &Notification) {
        for sink in &mut self.sinks {
            sink.notify(notification);
        }
    }
}

/// Pending notifications for the current dispatch step.
#[derive(Debug, Default)]
pub struct Outbox {
    pending: Vec<Notification>,
}

impl Outbox {
    /// Create an empty outbox.
    pub const fn new() -> Self {
        Self {
            pending: Vec::new(),
        }
    }

    /// Queue one notification.
    pub fn push(&mut self, notification: Notification) {
        self.pending.push(notification);
    }

    /// Queue several notifications, preserving their order.
    pub fn extend(&mut self, notifications: impl IntoIterator<Item = Notification>) {
        self.pending.extend(notifications);
    }

    /// Deliver everything queued to `sink` and empty the outbox. Returns
    /// the number delivered.
    pub fn flush(&mut self, sink: &mut dyn NotificationSink) -> usize {
        let count = self.pending.len();
        for notification in self.pending.drain(..) {
            sink.notify(&notification);
        }
        count
    }

    /// Take everything queued without delivering it.
    pub fn drain(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.pending)
    }

    /// Number of queued notifications.
    pub const fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is queued.
    pub const fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use pkbattle_types::Team;

    use super::*;

    #[test]
    fn flush_preserves_order_and_empties() {
        let mut outbox = Outbox::new();
        outbox.push(Notification::RoundReset);
        outbox.extend([
            Notification::PointsChanged {
                team: Team::A,
                total: 1,
            },
            Notification::PointsChanged {
                team: Team::A,
                total: 2,
            },
        ]);

        let mut sink = RecordingSink::new();
        assert_eq!(outbox.flush(&mut sink), 3);
        assert!(outbox.is_empty());
        assert_eq!(
            sink.names(),
            vec!["round_reset", "points_changed", "points_changed"]
        );
        assert_eq!(sink.count_of("points_changed"), 2);
    }

    #[test]
    fn fan_out_reaches_every_sink() {
        struct Counter(usize);
        impl NotificationSink for Counter {
            fn notify(&mut self, _notification: &Notification) {
                self.0 = self.0.saturating_add(1);
            }
        }

        let mut fan_out = FanOut::new()
            .with(Box::new(NoOpSink))
            .with(Box::new(Counter(0)));
        assert_eq!(fan_out.len(), 2);

        let mut outbox = Outbox::new();
        outbox.push(Notification::RoundReset);
        assert_eq!(outbox.flush(&mut fan_out), 1);
    }

    #[test]
    fn take_empties_recording() {
        let mut sink = RecordingSink::new();
        sink.notify(&Notification::RoundReset);
        assert_eq!(sink.take().len(), 1);
        assert!(sink.notifications.is_empty());
    }
}
