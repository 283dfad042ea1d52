//! Persistent viewer tiles on a dense grid.
//!
//! Viewers who join while persistent display is on get a tile that stays
//! until it is removed, evicted, or cleared. The registry keeps two
//! structures side by side: `order`, the viewer ids in insertion order, and
//! `slots`, the tile for each id. Grid indices are always exactly the
//! positions in `order`, so they are dense (`0..count`) at all times.
//!
//! At capacity the viewer at the front of `order` (the oldest insertion,
//! not the least recently active) is evicted before the new one goes in.
//! Every removal re-lays out the remaining tiles in one pass.

use std::collections::BTreeMap;

use pkbattle_types::{
    BubbleContent, DisplayEntity, EntityKind, Notification, Position, RemovalReason, ViewerId,
    ViewerSlot, ZoneAffinity,
};
use tracing::{debug, info, warn};

use crate::config::ViewersConfig;
use crate::notify::Outbox;
use crate::sequence::EntityIdSource;

/// Grid geometry: index to pixel position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewerGrid {
    columns: u32,
    pitch_px: u32,
    origin: Position,
}

impl ViewerGrid {
    /// Build the grid from configuration. Zero columns is treated as one.
    pub fn new(config: &ViewersConfig) -> Self {
        Self {
            columns: config.columns.max(1),
            pitch_px: config.cell_size_px.saturating_add(config.spacing_px),
            origin: Position::new(config.origin_x, config.origin_y),
        }
    }

    /// Pixel position of the tile at `index`.
    ///
    /// `row = index / columns`, `col = index % columns`, and each step is
    /// one cell plus spacing from the origin.
    pub fn position_for(&self, index: u32) -> Position {
        let row = index.checked_div(self.columns).unwrap_or(0);
        let col = index.checked_rem(self.columns).unwrap_or(0);
        Position::new(
            offset(self.origin.x, col, self.pitch_px),
            offset(self.origin.y, row, self.pitch_px),
        )
    }
}

fn offset(origin: i32, steps: u32, pitch: u32) -> i32 {
    let delta = i64::from(steps).saturating_mul(i64::from(pitch));
    let value = i64::from(origin).saturating_add(delta);
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// What [`PersistentViewerRegistry::upsert`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// The viewer was already present; their tile pulsed.
    Pulsed,
    /// A new tile was placed.
    Inserted {
        /// Index of the new tile.
        grid_index: u32,
    },
    /// The oldest viewer was evicted to make room for a new tile.
    InsertedWithEviction {
        /// The viewer that lost their tile.
        evicted: ViewerId,
        /// Index of the new tile.
        grid_index: u32,
    },
    /// The viewer id was blank; nothing happened.
    Ignored,
}

#[derive(Debug, Clone)]
struct Slot {
    grid_index: u32,
    entity: DisplayEntity,
}

/// Bounded, insertion-ordered registry of viewer tiles.
#[derive(Debug)]
pub struct PersistentViewerRegistry {
    /// Viewer ids, oldest insertion first. Index in this vector is the grid
    /// index.
    order: Vec<ViewerId>,
    /// Tile per viewer.
    slots: BTreeMap<ViewerId, Slot>,
    capacity: usize,
    grid: ViewerGrid,
    ids: EntityIdSource,
}

impl PersistentViewerRegistry {
    /// Create an empty registry.
    pub fn new(config: &ViewersConfig, ids: EntityIdSource) -> Self {
        let capacity = usize::try_from(config.max_capacity)
            .unwrap_or(usize::MAX)
            .max(1);
        Self {
            order: Vec::with_capacity(capacity.min(64)),
            slots: BTreeMap::new(),
            capacity,
            grid: ViewerGrid::new(config),
            ids,
        }
    }

    /// Pulse a present viewer, or give a new viewer a tile, evicting the
    /// oldest tile first when full.
    pub fn upsert(
        &mut self,
        viewer_id: ViewerId,
        content: BubbleContent,
        now_ms: u64,
        outbox: &mut Outbox,
    ) -> UpsertOutcome {
        if viewer_id.is_blank() {
            debug!("join without viewer id, no tile placed");
            return UpsertOutcome::Ignored;
        }
        if self.pulse(&viewer_id, outbox) {
            return UpsertOutcome::Pulsed;
        }

        let evicted = if self.order.len() >= self.capacity {
            self.evict_oldest(outbox)
        } else {
            None
        };

        let grid_index = index_u32(self.order.len());
        let position = self.grid.position_for(grid_index);
        let entity = DisplayEntity {
            id: self.ids.next_id(),
            kind: EntityKind::Persistent,
            owner: Some(viewer_id.clone()),
            spawned_at_ms: now_ms,
            ttl_ms: None,
            zone: ZoneAffinity::Free,
            position,
            content,
        };
        outbox.push(Notification::ViewerAdded {
            viewer_id: viewer_id.clone(),
            entity: entity.id,
            grid_index,
            position,
        });
        debug!(viewer = %viewer_id, grid_index, "viewer tile placed");
        self.order.push(viewer_id.clone());
        self.slots.insert(viewer_id, Slot { grid_index, entity });
        self.push_count(outbox);

        match evicted {
            Some(evicted) => UpsertOutcome::InsertedWithEviction {
                evicted,
                grid_index,
            },
            None => UpsertOutcome::Inserted { grid_index },
        }
    }

    /// Emphasize a present viewer's tile. Returns `false` if the viewer has
    /// no tile.
    pub fn pulse(&self, viewer_id: &ViewerId, outbox: &mut Outbox) -> bool {
        if !self.slots.contains_key(viewer_id) {
            return false;
        }
        outbox.push(Notification::ViewerPulsed {
            viewer_id: viewer_id.clone(),
        });
        true
    }

    /// Remove a viewer's tile and close the gap. Returns `false` if the
    /// viewer had no tile.
    pub fn remove(&mut self, viewer_id: &ViewerId, outbox: &mut Outbox) -> bool {
        if !self.detach(viewer_id, RemovalReason::Removed, outbox) {
            return false;
        }
        self.reflow(outbox);
        self.push_count(outbox);
        true
    }

    /// Remove every tile. Returns the number removed.
    pub fn clear_all(&mut self, outbox: &mut Outbox) -> usize {
        let order = std::mem::take(&mut self.order);
        let count = order.len();
        for viewer_id in order {
            if let Some(slot) = self.slots.remove(&viewer_id) {
                outbox.push(Notification::ViewerRemoved {
                    viewer_id,
                    entity: slot.entity.id,
                    reason: RemovalReason::Cleared,
                });
            }
        }
        if count > 0 {
            info!(count, "viewer grid cleared");
            self.push_count(outbox);
        }
        count
    }

    /// Whether a viewer has a tile.
    pub fn contains(&self, viewer_id: &ViewerId) -> bool {
        self.slots.contains_key(viewer_id)
    }

    /// Grid index of a viewer's tile.
    pub fn grid_index(&self, viewer_id: &ViewerId) -> Option<u32> {
        self.slots.get(viewer_id).map(|slot| slot.grid_index)
    }

    /// Viewer ids in insertion (and grid) order.
    pub fn order(&self) -> &[ViewerId] {
        &self.order
    }

    /// Snapshot of every slot in grid order.
    pub fn slots(&self) -> Vec<ViewerSlot> {
        self.order
            .iter()
            .filter_map(|viewer_id| {
                self.slots.get(viewer_id).map(|slot| ViewerSlot {
                    viewer_id: viewer_id.clone(),
                    grid_index: slot.grid_index,
                    entity: slot.entity.clone(),
                })
            })
            .collect()
    }

    /// Number of tiles.
    pub const fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether there are no tiles.
    pub const fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Maximum number of tiles.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Grid geometry.
    pub const fn grid(&self) -> &ViewerGrid {
        &self.grid
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn evict_oldest(&mut self, outbox: &mut Outbox) -> Option<ViewerId> {
        let oldest = self.order.first().cloned()?;
        warn!(viewer = %oldest, capacity = self.capacity, "viewer grid full, evicting oldest");
        if !self.detach(&oldest, RemovalReason::Evicted, outbox) {
            return None;
        }
        self.reflow(outbox);
        Some(oldest)
    }

    /// Drop a viewer from both structures without re-laying out.
    fn detach(&mut self, viewer_id: &ViewerId, reason: RemovalReason, outbox: &mut Outbox) -> bool {
        let Some(slot) = self.slots.remove(viewer_id) else {
            debug!(viewer = %viewer_id, "remove ignored, viewer has no tile");
            return false;
        };
        self.order.retain(|id| id != viewer_id);
        outbox.push(Notification::ViewerRemoved {
            viewer_id: viewer_id.clone(),
            entity: slot.entity.id,
            reason,
        });
        true
    }

    /// Reassign every grid index from `order` and report tiles that moved.
    fn reflow(&mut self, outbox: &mut Outbox) {
        for (index, viewer_id) in self.order.iter().enumerate() {
            let grid_index = index_u32(index);
            let Some(slot) = self.slots.get_mut(viewer_id) else {
                continue;
            };
            if slot.grid_index == grid_index {
                continue;
            }
            let position = self.grid.position_for(grid_index);
            slot.grid_index = grid_index;
            slot.entity.position = position;
            outbox.push(Notification::ViewerMoved {
                viewer_id: viewer_id.clone(),
                grid_index,
                position,
            });
        }
    }

    fn push_count(&self, outbox: &mut Outbox) {
        outbox.push(Notification::ViewerCountChanged {
            count: index_u32(self.order.len()),
        });
    }
}

fn index_u32(index: usize) -> u32 {
    u32::try_from(index).unwrap_or(u32::MAX)
}
