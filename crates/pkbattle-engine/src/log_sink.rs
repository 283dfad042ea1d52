//! Notification sinks used by the binary.
//!
//! [`LogSink`] mirrors notifications into the structured log: round-level
//! changes at `info`, per-entity traffic at `debug`. [`JsonLinesSink`]
//! writes each notification as one JSON object per line, which is what a
//! renderer process reads.

use std::io::{self, Write};

use pkbattle_core::notify::NotificationSink;
use pkbattle_types::Notification;
use tracing::{debug, info, warn};

/// Logs every notification through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn notify(&mut self, notification: &Notification) {
        match notification {
            Notification::RoundWon { team } => info!(team = ?team, "round won"),
            Notification::RoundWinsChanged {
                team_a_wins,
                team_b_wins,
            } => info!(team_a_wins, team_b_wins, "round wins changed"),
            Notification::RoundWarning { seconds_remaining } => {
                info!(seconds_remaining, "round ending soon");
            }
            Notification::RoundReset => info!("round reset"),
            Notification::PhaseChanged { phase } => info!(phase = ?phase, "phase changed"),
            Notification::PointsChanged { team, total } => {
                debug!(team = ?team, total, "points changed");
            }
            Notification::ViewerCountChanged { count } => debug!(count, "viewer count changed"),
            other => debug!(kind = other.name(), "notification"),
        }
    }
}

/// Writes notifications as JSON lines.
#[derive(Debug)]
pub struct JsonLinesSink<W> {
    writer: W,
    failed: u64,
}

impl<W: Write> JsonLinesSink<W> {
    /// Wrap a writer.
    pub const fn new(writer: W) -> Self {
        Self { writer, failed: 0 }
    }

    /// Number of notifications that could not be written.
    #[cfg(test)]
    pub const fn failed(&self) -> u64 {
        self.failed
    }

    /// Unwrap the writer.
    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_line(&mut self, notification: &Notification) -> io::Result<()> {
        serde_json::to_writer(&mut self.writer, notification)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }
}

impl<W: Write + Send> NotificationSink for JsonLinesSink<W> {
    fn notify(&mut self, notification: &Notification) {
        if let Err(e) = self.write_line(notification) {
            self.failed = self.failed.saturating_add(1);
            warn!(
                error = %e,
                kind = notification.name(),
                failed = self.failed,
                "failed to write notification"
            );
        }
    }
}
