//! The normalized inbound event record produced by the live-event source.
//!
//! The record is a flat mapping keyed by `type`, with type-specific fields
//! that are all optional on the wire. The core never rejects a record for a
//! missing field: accessors here supply the documented defaults (empty
//! gift name, gift count 1, like count 1) so that a malformed paid
//! interaction is still scored and displayed.
//!
//! Producers are loosely typed: absent attributes arrive as `null`, ids
//! may arrive as numbers, and counts or timestamps may be out of range.
//! Each field decodes leniently and falls back to its default rather than
//! failing the record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::EventKind;
use crate::ids::ViewerId;

/// One social interaction from the live stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct InboundEvent {
    /// Interaction kind (`"join"`, `"like"`, `"comment"`, `"share"`,
    /// `"follow"`, `"gift"`).
    #[serde(rename = "type")]
    pub kind: EventKind,

    /// Display name of the viewer.
    #[serde(default, deserialize_with = "lenient::text")]
    pub username: String,

    /// Stable platform identity of the viewer. Numeric ids are kept as
    /// their decimal text.
    #[serde(default, deserialize_with = "lenient::text")]
    pub user_id: String,

    /// Avatar image URL, passed through to the renderer.
    #[serde(
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub avatar_url: Option<String>,

    /// Source timestamp in epoch milliseconds, when the source provides one.
    /// Fractional or otherwise unusable values are dropped.
    #[serde(
        default,
        deserialize_with = "lenient::opt_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<i64>,

    /// Gift catalogue name (gift events).
    #[serde(
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub gift_name: Option<String>,

    /// Platform gift id (gift events), informational only.
    #[serde(
        default,
        deserialize_with = "lenient::opt_unsigned",
        skip_serializing_if = "Option::is_none"
    )]
    pub gift_id: Option<u64>,

    /// Repeat count of a combo gift (gift events). A present but unusable
    /// count reads as 1.
    #[serde(
        default,
        deserialize_with = "lenient::opt_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub gift_count: Option<u32>,

    /// Chat text (comment events).
    #[serde(
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub comment: Option<String>,

    /// Number of likes batched into this event (like events).
    #[serde(
        default,
        deserialize_with = "lenient::opt_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub like_count: Option<u32>,
}

impl InboundEvent {
    /// Create a bare event of the given kind.
    pub fn new(kind: EventKind, username: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            kind,
            username: username.into(),
            user_id: user_id.into(),
            avatar_url: None,
            timestamp: None,
            gift_name: None,
            gift_id: None,
            gift_count: None,
            comment: None,
            like_count: None,
        }
    }

    /// Attach gift details.
    #[must_use]
    pub fn with_gift(mut self, gift_name: impl Into<String>, gift_count: u32) -> Self {
        self.gift_name = Some(gift_name.into());
        self.gift_count = Some(gift_count);
        self
    }

    /// Attach comment text.
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Attach a like count.
    #[must_use]
    pub const fn with_like_count(mut self, like_count: u32) -> Self {
        self.like_count = Some(like_count);
        self
    }

    /// Stamp the event with the current wall-clock time if the source did not.
    #[must_use]
    pub fn stamped(mut self) -> Self {
        if self.timestamp.is_none() {
            self.timestamp = Some(Utc::now().timestamp_millis());
        }
        self
    }

    /// The viewer identity this event belongs to.
    pub fn viewer_id(&self) -> ViewerId {
        ViewerId::new(self.user_id.clone())
    }

    /// Name to show on the bubble: the username, or the user id when the
    /// source sent no username.
    pub fn display_name(&self) -> &str {
        if self.username.trim().is_empty() {
            &self.user_id
        } else {
            &self.username
        }
    }

    /// Gift name, empty when missing.
    pub fn gift_name(&self) -> &str {
        self.gift_name.as_deref().unwrap_or("")
    }

    /// Gift repeat count, at least 1.
    pub fn gift_count(&self) -> u32 {
        self.gift_count.unwrap_or(1).max(1)
    }

    /// Like count, at least 1.
    pub fn like_count(&self) -> u32 {
        self.like_count.unwrap_or(1).max(1)
    }

    /// Comment text, empty when missing.
    pub fn comment_text(&self) -> &str {
        self.comment.as_deref().unwrap_or("")
    }

    /// Source timestamp as a UTC date-time, if present and in range.
    pub fn occurred_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp.and_then(DateTime::from_timestamp_millis)
    }
}

// ---------------------------------------------------------------------------
// Field decoders
// ---------------------------------------------------------------------------

mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// Text, or a number as its decimal text. Anything else is empty.
    pub fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        opt_text(deserializer).map(Option::unwrap_or_default)
    }

    pub fn opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(text) => Some(text),
            Value::Number(number) => Some(number.to_string()),
            _ => None,
        })
    }

    /// `null` is absent; any other value that is not a `u32` reads as 1.
    pub fn opt_count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Null => None,
            value => Some(
                unsigned(&value)
                    .and_then(|count| u32::try_from(count).ok())
                    .unwrap_or(1),
            ),
        })
    }

    pub fn opt_unsigned<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer).map(|value| unsigned(&value))
    }

    pub fn opt_timestamp<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Number(number) => number.as_i64(),
            Value::String(text) => text.trim().parse().ok(),
            _ => None,
        })
    }

    fn unsigned(value: &Value) -> Option<u64> {
        match value {
            Value::Number(number) => number.as_u64(),
            Value::String(text) => text.trim().parse().ok(),
            _ => None,
        }
    }
}
