//! The single dispatch point of the battle core.
//!
//! [`Battle`] owns every stateful component (scheduler, round engine,
//! bubble manager, viewer registry) plus the immutable gift catalog and the
//! routing tables from configuration. Nothing outside it mutates those
//! components. There are exactly three ways in:
//!
//! - [`Battle::handle_event`] for an inbound social interaction,
//! - [`Battle::apply`] for an operator [`Command`],
//! - [`Battle::advance_to`] to let virtual time pass and fire due timers.
//!
//! Each step ends by flushing its notifications into the caller's sink, in
//! the order they were produced. Timers flush one by one, so a renderer
//! sees the state after every individual tick or expiry.

use pkbattle_ledger::{GiftCatalog, LedgerError};
use pkbattle_types::{
    BubbleContent, BubbleStyle, EntityId, EventKind, InboundEvent, RoundState, Team, ViewerId,
    ViewerSlot, ZoneAffinity,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::bubbles::{EntityLifecycleManager, SpawnRequest};
use crate::clock::ClockError;
use crate::config::{BattleConfig, ConfigError};
use crate::layout::StageLayout;
use crate::notify::{NotificationSink, Outbox};
use crate::round::BattleRoundEngine;
use crate::scheduler::{Scheduler, TimerKind};
use crate::sequence::EntityIdSource;
use crate::viewers::{PersistentViewerRegistry, UpsertOutcome};

/// Errors that can occur when building a battle.
#[derive(Debug, thiserror::Error)]
pub enum BattleError {
    /// The configuration is unusable.
    #[error("configuration error: {source}")]
    Config {
        /// The underlying configuration error.
        #[from]
        source: ConfigError,
    },

    /// The round clock rejected the configured duration.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },

    /// The configured gift tier table is malformed.
    #[error("gift catalog error: {source}")]
    Catalog {
        /// The underlying ledger error.
        #[from]
        source: LedgerError,
    },
}

/// Operator commands.
///
/// On the wire a command is a JSON object tagged by `command`, for example
/// `{"command": "set_round_duration", "minutes": 3}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    /// Start (or continue) the round clock.
    Start,
    /// Pause the round clock.
    Pause,
    /// Resume a paused round clock.
    Resume,
    /// Zero everything and return to idle.
    ResetAll,
    /// Change the round length.
    SetRoundDuration {
        /// New length in minutes.
        minutes: u32,
    },
    /// Switch persistent viewer tiles on or off. Off clears the grid.
    SetViewersEnabled {
        /// Whether joins create tiles.
        enabled: bool,
    },
    /// Remove one viewer's tile.
    RemoveViewer {
        /// The viewer whose tile goes.
        viewer_id: ViewerId,
    },
    /// Destroy every live bubble.
    ClearBubbles,
    /// Tear everything down. Later events are ignored.
    Shutdown,
}

/// What one inbound event did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventReport {
    /// The event kind.
    pub kind: EventKind,
    /// Team and points credited, if the event scored.
    pub credited: Option<(Team, u64)>,
    /// Gift tier id, for gifts.
    pub gift_tier: Option<String>,
    /// Bubble spawned, if any.
    pub bubble: Option<EntityId>,
    /// Viewer registry outcome, for joins with persistent display on.
    pub viewer: Option<UpsertOutcome>,
    /// Whether an existing viewer tile pulsed.
    pub pulsed: bool,
}

impl EventReport {
    const fn new(kind: EventKind) -> Self {
        Self {
            kind,
            credited: None,
            gift_tier: None,
            bubble: None,
            viewer: None,
            pulsed: false,
        }
    }
}

/// The battle core.
#[derive(Debug)]
pub struct Battle {
    config: BattleConfig,
    catalog: GiftCatalog,
    scheduler: Scheduler,
    round: BattleRoundEngine,
    bubbles: EntityLifecycleManager,
    viewers: PersistentViewerRegistry,
    viewers_enabled: bool,
    outbox: Outbox,
    shut_down: bool,
}

impl Battle {
    /// Build a battle from configuration. The round starts Idle.
    ///
    /// # Errors
    ///
    /// Returns [`BattleError`] if the configuration fails validation, the
    /// round duration is unusable, or a custom tier table is malformed.
    pub fn new(config: &BattleConfig) -> Result<Self, BattleError> {
        config.validate()?;
        let catalog = config.gifts.catalog()?;
        let round = BattleRoundEngine::new(&config.round)?;
        let ids = EntityIdSource::new();
        let bubbles = EntityLifecycleManager::new(
            StageLayout::new(config.stage.clone()),
            config.bubbles.grace_ms,
            config.bubbles.seed,
            ids.clone(),
        );
        let viewers = PersistentViewerRegistry::new(&config.viewers, ids);

        info!(
            round_minutes = config.round.duration_minutes,
            viewers_enabled = config.viewers.enabled,
            viewer_capacity = config.viewers.max_capacity,
            gifts_catalogued = catalog.gift_names().count(),
            "battle ready"
        );

        Ok(Self {
            config: config.clone(),
            catalog,
            scheduler: Scheduler::new(),
            round,
            bubbles,
            viewers,
            viewers_enabled: config.viewers.enabled,
            outbox: Outbox::new(),
            shut_down: false,
        })
    }

    // -----------------------------------------------------------------------
    // Inbound events
    // -----------------------------------------------------------------------

    /// Score and display one inbound event.
    pub fn handle_event(
        &mut self,
        event: &InboundEvent,
        sink: &mut dyn NotificationSink,
    ) -> EventReport {
        let mut report = EventReport::new(event.kind);
        if self.shut_down {
            debug!(kind = %event.kind, "event after shutdown ignored");
            return report;
        }

        match event.kind {
            EventKind::Gift => self.on_gift(event, &mut report),
            EventKind::Like | EventKind::Comment => self.on_interaction(event, &mut report),
            EventKind::Join => self.on_join(event, &mut report),
            EventKind::Share | EventKind::Follow => {
                let style = self.config.bubbles.style_for(event.kind);
                let zone = self.config.bubble_position(event.kind);
                let content = bubble_content(event, style.bubble_style(), None);
                report.bubble = Some(self.spawn_bubble(event, zone, None, style.duration_ms, content));
            }
        }

        if event.kind != EventKind::Join && self.viewers_enabled {
            report.pulsed = self.viewers.pulse(&event.viewer_id(), &mut self.outbox);
        }

        let _ = self.outbox.flush(sink);
        report
    }

    fn on_gift(&mut self, event: &InboundEvent, report: &mut EventReport) {
        let gift_name = event.gift_name();
        let count = event.gift_count();
        let unit_value = self.catalog.value_for(gift_name);
        let coins = unit_value.saturating_mul(u64::from(count));
        let points = coins.saturating_mul(self.config.points.gift_multiplier);
        let tier = self.catalog.tier_for(unit_value).clone();

        let tag = self.config.gift_team_tag(gift_name);
        let team = self.round.add_points_for_tag(tag, points, &mut self.outbox);
        report.credited = team.map(|team| (team, points));
        report.gift_tier = Some(tier.id.clone());

        info!(
            user = event.display_name(),
            gift = gift_name,
            count,
            coins,
            points,
            team = ?team,
            tier = %tier.id,
            "gift received"
        );

        let zone = team.map_or_else(
            || self.config.bubble_position(EventKind::Gift),
            ZoneAffinity::for_team,
        );
        let style = BubbleStyle {
            effect: tier.effect.clone(),
            size_px: tier.size_px,
            color: tier.color.clone(),
            border_width: Some(tier.border_width),
            glow_intensity: Some(tier.glow_intensity),
        };
        let detail = if gift_name.is_empty() {
            tier.name.clone()
        } else {
            format!("{gift_name} x{count}")
        };
        let content = bubble_content(event, style, Some(detail));
        report.bubble = Some(self.spawn_bubble(event, zone, team, tier.duration_ms, content));
    }

    fn on_interaction(&mut self, event: &InboundEvent, report: &mut EventReport) {
        let amount = self.config.points.for_interaction(event.kind);
        let tag = self.config.interaction_team_tag(event.kind);
        let team = self.round.add_points_for_tag(tag, amount, &mut self.outbox);
        report.credited = team.map(|team| (team, amount));
        debug!(
            kind = %event.kind,
            user = event.display_name(),
            amount,
            team = ?team,
            "interaction scored"
        );

        let detail = match event.kind {
            EventKind::Comment if !event.comment_text().is_empty() => {
                Some(event.comment_text().to_owned())
            }
            EventKind::Like if event.like_count() > 1 => Some(format!("x{}", event.like_count())),
            _ => None,
        };
        let style = self.config.bubbles.style_for(event.kind);
        let zone = self.config.bubble_position(event.kind);
        let content = bubble_content(event, style.bubble_style(), detail);
        report.bubble = Some(self.spawn_bubble(event, zone, None, style.duration_ms, content));
    }

    fn on_join(&mut self, event: &InboundEvent, report: &mut EventReport) {
        let style = self.config.bubbles.style_for(EventKind::Join);
        if self.viewers_enabled {
            let tile_style = BubbleStyle {
                size_px: self.config.viewers.cell_size_px,
                ..style.bubble_style()
            };
            let content = bubble_content(event, tile_style, None);
            let outcome = self.viewers.upsert(
                event.viewer_id(),
                content,
                self.scheduler.now_ms(),
                &mut self.outbox,
            );
            report.pulsed = outcome == UpsertOutcome::Pulsed;
            report.viewer = Some(outcome);
            return;
        }
        let zone = self.config.bubble_position(EventKind::Join);
        let content = bubble_content(event, style.bubble_style(), None);
        report.bubble = Some(self.spawn_bubble(event, zone, None, style.duration_ms, content));
    }

    fn spawn_bubble(
        &mut self,
        event: &InboundEvent,
        zone: ZoneAffinity,
        team: Option<Team>,
        ttl_ms: u64,
        content: BubbleContent,
    ) -> EntityId {
        let owner = Some(event.viewer_id()).filter(|id| !id.is_blank());
        let request = SpawnRequest {
            ttl_ms,
            zone,
            team,
            owner,
            content,
        };
        self.bubbles
            .spawn(request, &mut self.scheduler, &mut self.outbox)
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// Apply an operator command.
    pub fn apply(&mut self, command: Command, sink: &mut dyn NotificationSink) {
        if self.shut_down {
            debug!(command = ?command, "command after shutdown ignored");
            return;
        }
        debug!(command = ?command, "command");
        match command {
            Command::Start => self.round.start(&mut self.scheduler, &mut self.outbox),
            Command::Pause => self.round.pause(&mut self.scheduler, &mut self.outbox),
            Command::Resume => self.round.resume(&mut self.scheduler, &mut self.outbox),
            Command::ResetAll => self.round.reset_all(&mut self.scheduler, &mut self.outbox),
            Command::SetRoundDuration { minutes } => {
                let _ = self.round.set_round_duration(minutes, &mut self.outbox);
            }
            Command::SetViewersEnabled { enabled } => self.set_viewers_enabled(enabled),
            Command::RemoveViewer { viewer_id } => {
                let _ = self.viewers.remove(&viewer_id, &mut self.outbox);
            }
            Command::ClearBubbles => {
                let _ = self.bubbles.clear_all(&mut self.scheduler, &mut self.outbox);
            }
            Command::Shutdown => self.shutdown(),
        }
        let _ = self.outbox.flush(sink);
    }

    fn set_viewers_enabled(&mut self, enabled: bool) {
        if self.viewers_enabled == enabled {
            return;
        }
        self.viewers_enabled = enabled;
        if !enabled {
            let _ = self.viewers.clear_all(&mut self.outbox);
        }
        info!(enabled, "persistent viewer display toggled");
    }

    fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        let bubbles = self.bubbles.clear_all(&mut self.scheduler, &mut self.outbox);
        let viewers = self.viewers.clear_all(&mut self.outbox);
        self.round.reset_all(&mut self.scheduler, &mut self.outbox);
        info!(bubbles, viewers, "battle shut down");
    }

    // -----------------------------------------------------------------------
    // Time
    // -----------------------------------------------------------------------

    /// Let virtual time pass up to `now_ms`, firing every due timer in
    /// order. Returns the number of timers fired.
    pub fn advance_to(&mut self, now_ms: u64, sink: &mut dyn NotificationSink) -> usize {
        let mut fired: usize = 0;
        if self.shut_down {
            return fired;
        }
        while let Some(timer) = self.scheduler.pop_due(now_ms) {
            fired = fired.saturating_add(1);
            match timer.kind {
                TimerKind::ExpireEntity(id) => {
                    let _ = self.bubbles.on_expired(id, &mut self.outbox);
                }
                TimerKind::ClockTick | TimerKind::RoundCooldown => {
                    let _ = self.round.on_timer(
                        timer.handle,
                        timer.kind,
                        &mut self.scheduler,
                        &mut self.outbox,
                    );
                }
            }
            let _ = self.outbox.flush(sink);
        }
        fired
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Snapshot of the round state.
    pub const fn state(&self) -> RoundState {
        self.round.state()
    }

    /// Current virtual time in milliseconds.
    pub const fn now_ms(&self) -> u64 {
        self.scheduler.now_ms()
    }

    /// Due time of the next pending timer.
    pub fn next_due(&self) -> Option<u64> {
        self.scheduler.next_due()
    }

    /// The round engine.
    pub const fn round(&self) -> &BattleRoundEngine {
        &self.round
    }

    /// Live bubbles.
    pub const fn bubbles(&self) -> &EntityLifecycleManager {
        &self.bubbles
    }

    /// Persistent viewer tiles.
    pub const fn viewers(&self) -> &PersistentViewerRegistry {
        &self.viewers
    }

    /// Viewer tiles in grid order.
    pub fn viewer_slots(&self) -> Vec<ViewerSlot> {
        self.viewers.slots()
    }

    /// The gift catalog.
    pub const fn catalog(&self) -> &GiftCatalog {
        &self.catalog
    }

    /// The configuration the battle was built from.
    pub const fn config(&self) -> &BattleConfig {
        &self.config
    }

    /// Whether joins currently create viewer tiles.
    pub const fn viewers_enabled(&self) -> bool {
        self.viewers_enabled
    }

    /// Whether the battle has been shut down.
    pub const fn is_shut_down(&self) -> bool {
        self.shut_down
    }
}

fn bubble_content(event: &InboundEvent, style: BubbleStyle, detail: Option<String>) -> BubbleContent {
    BubbleContent {
        event: event.kind,
        username: event.display_name().to_owned(),
        avatar_url: event.avatar_url.clone(),
        detail,
        style,
    }
}
