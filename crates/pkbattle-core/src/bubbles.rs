//! Lifecycle of ephemeral display entities ("bubbles").
//!
//! Every bubble is spawned with a display duration and gets an expiry timer
//! at `ttl + grace`. The timer is scheduled unconditionally at spawn, so a
//! bubble can never outlive its deadline even if nothing else touches it.
//!
//! Destruction happens exactly once. Whichever path gets there first
//! (expiry timer, explicit [`EntityLifecycleManager::remove`], or
//! [`EntityLifecycleManager::clear_all`]) removes the entity and cancels its
//! timer; the other paths then find nothing and do nothing.

use std::collections::BTreeMap;

use pkbattle_types::{
    BubbleContent, DisplayEntity, EntityId, EntityKind, Notification, RemovalReason, Team,
    ViewerId, ZoneAffinity,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::debug;

use crate::layout::StageLayout;
use crate::notify::Outbox;
use crate::scheduler::{Scheduler, TimerHandle, TimerKind};
use crate::sequence::EntityIdSource;

/// Everything needed to spawn one bubble.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnRequest {
    /// Nominal display duration in milliseconds.
    pub ttl_ms: u64,
    /// Placement hint.
    pub zone: ZoneAffinity,
    /// Team whose band the bubble should land in, if any.
    pub team: Option<Team>,
    /// Viewer that caused the bubble, if known.
    pub owner: Option<ViewerId>,
    /// What the bubble shows.
    pub content: BubbleContent,
}

#[derive(Debug)]
struct LiveBubble {
    entity: DisplayEntity,
    expiry: TimerHandle,
}

/// Owner of all live ephemeral entities.
#[derive(Debug)]
pub struct EntityLifecycleManager {
    live: BTreeMap<EntityId, LiveBubble>,
    layout: StageLayout,
    grace_ms: u64,
    rng: StdRng,
    ids: EntityIdSource,
}

impl EntityLifecycleManager {
    /// Create a manager. A `seed` makes placement reproducible; without
    /// one the placement RNG is seeded from the OS.
    pub fn new(layout: StageLayout, grace_ms: u64, seed: Option<u64>, ids: EntityIdSource) -> Self {
        let rng = seed.map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        Self {
            live: BTreeMap::new(),
            layout,
            grace_ms,
            rng,
            ids,
        }
    }

    /// Spawn a bubble and schedule its removal at `ttl_ms + grace_ms`.
    pub fn spawn(
        &mut self,
        request: SpawnRequest,
        scheduler: &mut Scheduler,
        outbox: &mut Outbox,
    ) -> EntityId {
        let id = self.ids.next_id();
        let position = self
            .layout
            .allocate(request.zone, request.team, &mut self.rng);
        let entity = DisplayEntity {
            id,
            kind: EntityKind::Ephemeral,
            owner: request.owner,
            spawned_at_ms: scheduler.now_ms(),
            ttl_ms: Some(request.ttl_ms),
            zone: request.zone,
            position,
            content: request.content,
        };
        let expiry = scheduler.schedule(
            request.ttl_ms.saturating_add(self.grace_ms),
            TimerKind::ExpireEntity(id),
        );
        debug!(
            entity = %id,
            event = %entity.content.event,
            zone = ?entity.zone,
            x = position.x,
            y = position.y,
            ttl_ms = request.ttl_ms,
            "bubble spawned"
        );
        outbox.push(Notification::EntitySpawned {
            entity: Box::new(entity.clone()),
        });
        self.live.insert(id, LiveBubble { entity, expiry });
        id
    }

    /// Remove a bubble before its deadline. Returns `false` if it was
    /// already gone.
    pub fn remove(&mut self, id: EntityId, scheduler: &mut Scheduler, outbox: &mut Outbox) -> bool {
        let Some(bubble) = self.live.remove(&id) else {
            debug!(entity = %id, "remove ignored, bubble already gone");
            return false;
        };
        let _ = scheduler.cancel(bubble.expiry);
        outbox.push(Notification::EntityRemoved {
            id,
            reason: RemovalReason::Removed,
        });
        true
    }

    /// Handle a fired expiry timer. Returns `false` if the bubble was
    /// already gone.
    pub fn on_expired(&mut self, id: EntityId, outbox: &mut Outbox) -> bool {
        if self.live.remove(&id).is_none() {
            debug!(entity = %id, "expiry ignored, bubble already gone");
            return false;
        }
        debug!(entity = %id, "bubble expired");
        outbox.push(Notification::EntityRemoved {
            id,
            reason: RemovalReason::Expired,
        });
        true
    }

    /// Destroy every live bubble and cancel every pending expiry. Returns
    /// the number destroyed.
    pub fn clear_all(&mut self, scheduler: &mut Scheduler, outbox: &mut Outbox) -> usize {
        let live = std::mem::take(&mut self.live);
        let count = live.len();
        for (id, bubble) in live {
            let _ = scheduler.cancel(bubble.expiry);
            outbox.push(Notification::EntityRemoved {
                id,
                reason: RemovalReason::Cleared,
            });
        }
        if count > 0 {
            debug!(count, "bubbles cleared");
        }
        count
    }

    /// Look up a live bubble.
    pub fn get(&self, id: EntityId) -> Option<&DisplayEntity> {
        self.live.get(&id).map(|bubble| &bubble.entity)
    }

    /// Whether a bubble is live.
    pub fn contains(&self, id: EntityId) -> bool {
        self.live.contains_key(&id)
    }

    /// Live bubbles in id order.
    pub fn live(&self) -> impl Iterator<Item = &DisplayEntity> {
        self.live.values().map(|bubble| &bubble.entity)
    }

    /// Number of live bubbles.
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// Whether no bubbles are live.
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pkbattle_types::{BubbleStyle, EventKind};

    use super::*;
    use crate::config::StageConfig;

    fn manager() -> EntityLifecycleManager {
        EntityLifecycleManager::new(
            StageLayout::new(StageConfig::default()),
            1000,
            Some(5),
            EntityIdSource::new(),
        )
    }

    fn request(ttl_ms: u64) -> SpawnRequest {
        SpawnRequest {
            ttl_ms,
            zone: ZoneAffinity::Top,
            team: None,
            owner: Some(ViewerId::new("user_001")),
            content: BubbleContent {
                event: EventKind::Like,
                username: "Alice".to_owned(),
                avatar_url: None,
                detail: None,
                style: BubbleStyle {
                    effect: "quick_pop".to_owned(),
                    size_px: 90,
                    color: "#FF69B4".to_owned(),
                    border_width: None,
                    glow_intensity: None,
                },
            },
        }
    }

    /// Fire every due timer up to `until`, routing expiries to the manager.
    fn run_until(
        manager: &mut EntityLifecycleManager,
        scheduler: &mut Scheduler,
        outbox: &mut Outbox,
        until: u64,
    ) {
        while let Some(timer) = scheduler.pop_due(until) {
            if let TimerKind::ExpireEntity(id) = timer.kind {
                let _ = manager.on_expired(id, outbox);
            }
        }
    }

    #[test]
    fn bubble_lives_until_ttl_plus_grace() {
        let mut manager = manager();
        let mut scheduler = Scheduler::new();
        let mut outbox = Outbox::new();
        let id = manager.spawn(request(3000), &mut scheduler, &mut outbox);

        run_until(&mut manager, &mut scheduler, &mut outbox, 3999);
        assert!(manager.contains(id));

        run_until(&mut manager, &mut scheduler, &mut outbox, 4001);
        assert!(!manager.contains(id));
        assert!(manager.is_empty());

        let names: Vec<&str> = outbox.drain().iter().map(Notification::name).collect();
        assert_eq!(names, vec!["entity_spawned", "entity_removed"]);
    }

    #[test]
    fn spawned_entity_carries_request_fields() {
        let mut manager = manager();
        let mut scheduler = Scheduler::new();
        let mut outbox = Outbox::new();
        let _ = scheduler.pop_due(250);
        let id = manager.spawn(request(1500), &mut scheduler, &mut outbox);
        let entity = manager.get(id).unwrap();
        assert_eq!(entity.kind, EntityKind::Ephemeral);
        assert_eq!(entity.spawned_at_ms, 250);
        assert_eq!(entity.ttl_ms, Some(1500));
        assert_eq!(entity.owner.as_ref().unwrap().as_str(), "user_001");
        assert_eq!(scheduler.next_due(), Some(2750));
    }

    #[test]
    fn remove_is_idempotent_and_cancels_expiry() {
        let mut manager = manager();
        let mut scheduler = Scheduler::new();
        let mut outbox = Outbox::new();
        let id = manager.spawn(request(3000), &mut scheduler, &mut outbox);

        assert!(manager.remove(id, &mut scheduler, &mut outbox));
        assert!(!manager.remove(id, &mut scheduler, &mut outbox));
        assert_eq!(scheduler.pending(), 0);
        assert!(!manager.on_expired(id, &mut outbox));

        let removals = outbox
            .drain()
            .into_iter()
            .filter(|n| matches!(n, Notification::EntityRemoved { .. }))
            .count();
        assert_eq!(removals, 1);
    }

    #[test]
    fn clear_all_prevents_pending_expiry() {
        let mut manager = manager();
        let mut scheduler = Scheduler::new();
        let mut outbox = Outbox::new();
        for ttl in [1000, 2000, 3000] {
            let _ = manager.spawn(request(ttl), &mut scheduler, &mut outbox);
        }
        assert_eq!(manager.len(), 3);

        assert_eq!(manager.clear_all(&mut scheduler, &mut outbox), 3);
        assert_eq!(scheduler.pending(), 0);
        let _ = outbox.drain();

        run_until(&mut manager, &mut scheduler, &mut outbox, 10_000);
        assert!(outbox.is_empty());
    }

    #[test]
    fn stale_expiry_after_manual_remove_is_ignored() {
        let mut manager = manager();
        let mut scheduler = Scheduler::new();
        let mut outbox = Outbox::new();
        let id = manager.spawn(request(500), &mut scheduler, &mut outbox);
        let _ = manager.remove(id, &mut scheduler, &mut outbox);
        // A timer that slipped through would address a dead id.
        assert!(!manager.on_expired(id, &mut outbox));
    }

    #[test]
    fn ids_are_never_reused() {
        let mut manager = manager();
        let mut scheduler = Scheduler::new();
        let mut outbox = Outbox::new();
        let first = manager.spawn(request(10), &mut scheduler, &mut outbox);
        let _ = manager.clear_all(&mut scheduler, &mut outbox);
        let second = manager.spawn(request(10), &mut scheduler, &mut outbox);
        assert!(second > first);
    }
}
