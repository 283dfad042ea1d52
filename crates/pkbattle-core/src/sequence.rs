//! Entity id allocation.
//!
//! Bubbles and viewer tiles draw from one shared sequence so that an id is
//! never handed out twice in a run, whichever manager created it. A stale
//! expiry timer therefore can never address a newer entity.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use pkbattle_types::EntityId;

/// Cloneable handle to the shared id counter. Ids start at 1.
#[derive(Debug, Clone)]
pub struct EntityIdSource {
    next: Arc<AtomicU64>,
}

impl EntityIdSource {
    /// Create a fresh sequence.
    pub fn new() -> Self {
        Self {
            next: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Hand out the next id.
    pub fn next_id(&self) -> EntityId {
        EntityId::new(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for EntityIdSource {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_one_sequence() {
        let bubbles = EntityIdSource::new();
        let viewers = bubbles.clone();
        assert_eq!(bubbles.next_id(), EntityId::new(1));
        assert_eq!(viewers.next_id(), EntityId::new(2));
        assert_eq!(bubbles.next_id(), EntityId::new(3));
    }
}
