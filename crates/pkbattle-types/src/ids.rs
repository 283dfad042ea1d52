//! Strongly-typed identifiers for display entities and viewers.
//!
//! Entity ids are plain sequence numbers handed out by the core in
//! strictly increasing order and never reused within a run. A timer that
//! still refers to an old id can therefore never touch a newer entity.
//!
//! Viewer ids wrap the external platform's user identity string.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Unique identifier for a display entity (bubble or viewer tile).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub struct EntityId(pub u64);

impl EntityId {
    /// Wrap a raw sequence number.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Return the inner sequence number.
    pub const fn into_inner(self) -> u64 {
        self.0
    }
}

impl core::fmt::Display for EntityId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "entity-{}", self.0)
    }
}

impl From<u64> for EntityId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

/// Identity of a viewer on the live stream (the platform's `user_id`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ViewerId(pub String);

impl ViewerId {
    /// Create a viewer id from anything string-like.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Borrow the identity string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the identity is blank (events with no `user_id`).
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl core::fmt::Display for ViewerId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ViewerId {
    fn from(raw: &str) -> Self {
        Self(raw.to_owned())
    }
}

impl From<String> for ViewerId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_ids_order_by_sequence() {
        let first = EntityId::new(1);
        let second = EntityId::new(2);
        assert!(first < second);
        assert_eq!(second.into_inner(), 2);
    }

    #[test]
    fn entity_id_serializes_as_number() {
        let json = serde_json::to_string(&EntityId::new(42)).ok();
        assert_eq!(json.as_deref(), Some("42"));
    }

    #[test]
    fn blank_viewer_ids_are_detected() {
        assert!(ViewerId::new("").is_blank());
        assert!(ViewerId::new("   ").is_blank());
        assert!(!ViewerId::new("user_001").is_blank());
    }

    #[test]
    fn viewer_id_display_is_raw_identity() {
        assert_eq!(ViewerId::from("user_002").to_string(), "user_002");
    }
}
