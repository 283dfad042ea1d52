//! JSON-lines event source.
//!
//! Each non-empty line is one JSON object. Objects with a `command` key are
//! operator commands (`{"command": "pause"}`); everything else is an
//! inbound event (`{"type": "gift", "user_id": "u1", "gift_name": "Rose"}`).
//! Blank lines and lines starting with `#` are skipped. Malformed lines are
//! logged and skipped; they never stop the source.

use pkbattle_core::runner::Inbound;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Why a line could not be turned into an inbound message.
#[derive(Debug, thiserror::Error)]
pub enum LineError {
    /// The line is not valid JSON, or does not match the event or command
    /// shape.
    #[error("invalid JSON: {source}")]
    Json {
        /// The underlying parse error.
        #[from]
        source: serde_json::Error,
    },

    /// The line is valid JSON but not an object.
    #[error("expected a JSON object")]
    NotAnObject,
}

/// Parse one input line. `Ok(None)` for blank and comment lines.
///
/// # Errors
///
/// Returns [`LineError`] when the line is not a valid event or command.
pub fn parse_line(line: &str) -> Result<Option<Inbound>, LineError> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    let value: serde_json::Value = serde_json::from_str(trimmed)?;
    if !value.is_object() {
        return Err(LineError::NotAnObject);
    }
    let inbound = if value.get("command").is_some() {
        Inbound::Command(serde_json::from_value(value)?)
    } else {
        Inbound::Event(serde_json::from_value(value)?)
    };
    Ok(Some(inbound))
}

/// Forward every parsed line of `reader` until end of input or until the
/// battle loop goes away. Returns the number of messages forwarded.
///
/// # Errors
///
/// Returns an I/O error if reading fails.
pub async fn forward_lines<R>(reader: R, tx: &mpsc::Sender<Inbound>) -> std::io::Result<u64>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut line_number: u64 = 0;
    let mut forwarded: u64 = 0;
    while let Some(line) = lines.next_line().await? {
        line_number = line_number.saturating_add(1);
        match parse_line(&line) {
            Ok(Some(inbound)) => {
                if tx.send(inbound).await.is_err() {
                    debug!("battle loop gone, input source stopping");
                    break;
                }
                forwarded = forwarded.saturating_add(1);
            }
            Ok(None) => {}
            Err(e) => warn!(line = line_number, error = %e, "skipping malformed input line"),
        }
    }
    Ok(forwarded)
}

/// Forward standard input.
///
/// # Errors
///
/// Returns an I/O error if reading stdin fails.
pub async fn run_stdin_source(tx: mpsc::Sender<Inbound>) -> std::io::Result<()> {
    info!("reading events from stdin");
    let forwarded = forward_lines(BufReader::new(tokio::io::stdin()), &tx).await?;
    info!(forwarded, "stdin closed");
    Ok(())
}
