//! Configuration loading and typed config structures for the PK battle.
//!
//! The persisted configuration is one JSON document, `pkbattle-config.json`
//! by default. Every section and every field is optional; missing values
//! fall back to the defaults below, which match the stock overlay.
//!
//! Values that the battle treats as soft (an unknown team tag in an
//! assignment table, a gift name nobody has catalogued) are accepted here
//! and degrade at use time. [`BattleConfig::validate`] only rejects values
//! that would make the engine itself misbehave, such as a zero-minute round
//! or a grid with no columns.

use std::collections::BTreeMap;
use std::path::Path;

use pkbattle_ledger::gifts::FALLBACK_TIER_ID;
use pkbattle_ledger::{GiftCatalog, GiftTier, LedgerError};
use pkbattle_types::{BubbleStyle, EventKind, Team, ZoneAffinity};
use serde::{Deserialize, Serialize};

/// Errors that can occur when loading or saving configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read or write the configuration file.
    #[error("failed to access config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse or render JSON content.
    #[error("failed to parse config JSON: {source}")]
    Json {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },

    /// The configuration parsed but holds an unusable value.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong.
        reason: String,
    },
}

/// Top-level battle configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleConfig {
    /// Round timing.
    #[serde(default)]
    pub round: RoundConfig,

    /// Points per scored interaction.
    #[serde(default)]
    pub points: PointsConfig,

    /// Gift name to team tag (`"A"` / `"B"`). Unlisted gifts go to team A.
    #[serde(default)]
    pub gift_assignments: BTreeMap<String, String>,

    /// Scored interaction to team tag. Unlisted interactions go to team A.
    #[serde(default = "default_interaction_assignments")]
    pub interaction_assignments: BTreeMap<EventKind, String>,

    /// Where bubbles for each event kind appear. Unlisted kinds use the top
    /// strip.
    #[serde(default = "default_bubble_positions")]
    pub bubble_positions: BTreeMap<EventKind, ZoneAffinity>,

    /// Ephemeral bubble behavior and styles.
    #[serde(default)]
    pub bubbles: BubblesConfig,

    /// Stage geometry for bubble placement.
    #[serde(default)]
    pub stage: StageConfig,

    /// Persistent viewer grid.
    #[serde(default)]
    pub viewers: ViewersConfig,

    /// Gift catalog overrides.
    #[serde(default)]
    pub gifts: GiftsConfig,

    /// Process-level settings for the engine binary.
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

impl BattleConfig {
    /// Load configuration from a JSON file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Json`] if the content is not valid JSON.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] if the string is not valid JSON.
    pub fn parse(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Render the configuration as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] if serialization fails.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the configuration to `path` as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if serialization or the write fails.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Check values the engine cannot work with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure(self.round.duration_minutes >= 1, "round.duration_minutes must be at least 1")?;
        ensure(self.round.tick_interval_ms >= 1, "round.tick_interval_ms must be at least 1")?;
        ensure(self.viewers.max_capacity >= 1, "viewers.max_capacity must be at least 1")?;
        ensure(self.viewers.columns >= 1, "viewers.columns must be at least 1")?;
        ensure(
            self.runtime.frame_interval_ms >= 1,
            "runtime.frame_interval_ms must be at least 1",
        )?;
        for (name, rect) in self.stage.rects() {
            ensure(
                rect.x_min <= rect.x_max && rect.y_min <= rect.y_max,
                &format!("stage.{name} has an inverted range"),
            )?;
        }
        for (name, band) in self.stage.bands() {
            ensure(
                band.min <= band.max,
                &format!("stage.{name} has an inverted range"),
            )?;
        }
        Ok(())
    }

    /// Team tag for a gift; team A when unassigned.
    pub fn gift_team_tag(&self, gift_name: &str) -> &str {
        self.gift_assignments
            .get(gift_name)
            .map_or(Team::A.tag(), String::as_str)
    }

    /// Team tag for a scored interaction; team A when unassigned.
    pub fn interaction_team_tag(&self, kind: EventKind) -> &str {
        self.interaction_assignments
            .get(&kind)
            .map_or(Team::A.tag(), String::as_str)
    }

    /// Placement zone for bubbles of an event kind. Unassigned gifts go to
    /// the bottom strip, everything else to the top strip.
    pub fn bubble_position(&self, kind: EventKind) -> ZoneAffinity {
        self.bubble_positions.get(&kind).copied().unwrap_or(match kind {
            EventKind::Gift => ZoneAffinity::Bottom,
            _ => ZoneAffinity::Top,
        })
    }
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            round: RoundConfig::default(),
            points: PointsConfig::default(),
            gift_assignments: BTreeMap::new(),
            interaction_assignments: default_interaction_assignments(),
            bubble_positions: default_bubble_positions(),
            bubbles: BubblesConfig::default(),
            stage: StageConfig::default(),
            viewers: ViewersConfig::default(),
            gifts: GiftsConfig::default(),
            runtime: RuntimeConfig::default(),
        }
    }
}

fn ensure(condition: bool, reason: &str) -> Result<(), ConfigError> {
    if condition {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            reason: reason.to_owned(),
        })
    }
}

// ---------------------------------------------------------------------------
// Round
// ---------------------------------------------------------------------------

/// Round timing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundConfig {
    /// Round length in minutes.
    #[serde(default = "default_duration_minutes")]
    pub duration_minutes: u32,

    /// Pause between a round reaching zero and the next round starting.
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,

    /// Seconds remaining at which the one-time warning fires. 0 disables it.
    #[serde(default = "default_warning_at_seconds")]
    pub warning_at_seconds: u32,

    /// Milliseconds per clock second.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            duration_minutes: default_duration_minutes(),
            cooldown_ms: default_cooldown_ms(),
            warning_at_seconds: default_warning_at_seconds(),
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

// ---------------------------------------------------------------------------
// Points
// ---------------------------------------------------------------------------

/// Points per scored interaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsConfig {
    /// Points per like event.
    #[serde(default = "default_interaction_points")]
    pub like: u64,

    /// Points per comment event.
    #[serde(default = "default_interaction_points")]
    pub comment: u64,

    /// Points per gift coin.
    #[serde(default = "default_gift_multiplier")]
    pub gift_multiplier: u64,
}

impl PointsConfig {
    /// Points for one interaction of `kind`. Kinds without a point value
    /// score nothing.
    pub const fn for_interaction(&self, kind: EventKind) -> u64 {
        match kind {
            EventKind::Like => self.like,
            EventKind::Comment => self.comment,
            EventKind::Join | EventKind::Share | EventKind::Follow | EventKind::Gift => 0,
        }
    }
}

impl Default for PointsConfig {
    fn default() -> Self {
        Self {
            like: default_interaction_points(),
            comment: default_interaction_points(),
            gift_multiplier: default_gift_multiplier(),
        }
    }
}

// ---------------------------------------------------------------------------
// Bubbles
// ---------------------------------------------------------------------------

/// Look of a non-gift bubble. Gift bubbles take their look from the gift
/// tier instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventStyleConfig {
    /// Animation effect id.
    pub effect: String,
    /// Bubble diameter in pixels.
    pub size_px: u32,
    /// Nominal display duration in milliseconds.
    pub duration_ms: u64,
    /// Accent color as `#RRGGBB`.
    pub color: String,
}

impl EventStyleConfig {
    /// The renderer-facing style, with default border and glow.
    pub fn bubble_style(&self) -> BubbleStyle {
        BubbleStyle {
            effect: self.effect.clone(),
            size_px: self.size_px,
            color: self.color.clone(),
            border_width: None,
            glow_intensity: None,
        }
    }

    fn new(effect: &str, size_px: u32, duration_ms: u64, color: &str) -> Self {
        Self {
            effect: effect.to_owned(),
            size_px,
            duration_ms,
            color: color.to_owned(),
        }
    }
}

/// Ephemeral bubble behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BubblesConfig {
    /// Extra time after a bubble's display duration before it is removed.
    #[serde(default = "default_grace_ms")]
    pub grace_ms: u64,

    /// Placement RNG seed. `None` seeds from the OS.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Style per event kind. Unlisted kinds use the built-in style.
    #[serde(default = "default_event_styles")]
    pub styles: BTreeMap<EventKind, EventStyleConfig>,
}

impl BubblesConfig {
    /// Style for an event kind, falling back to the built-in table.
    pub fn style_for(&self, kind: EventKind) -> EventStyleConfig {
        self.styles
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| builtin_event_style(kind))
    }
}

impl Default for BubblesConfig {
    fn default() -> Self {
        Self {
            grace_ms: default_grace_ms(),
            seed: None,
            styles: default_event_styles(),
        }
    }
}

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// An inclusive pixel rectangle bubbles are placed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneRect {
    /// Leftmost x.
    pub x_min: i32,
    /// Rightmost x.
    pub x_max: i32,
    /// Topmost y.
    pub y_min: i32,
    /// Bottommost y.
    pub y_max: i32,
}

impl ZoneRect {
    /// Create a rectangle from inclusive bounds.
    pub const fn new(x_min: i32, x_max: i32, y_min: i32, y_max: i32) -> Self {
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }
}

/// An inclusive horizontal pixel band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Band {
    /// Leftmost x.
    pub min: i32,
    /// Rightmost x.
    pub max: i32,
}

/// Stage geometry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageConfig {
    /// Top strip.
    #[serde(default = "default_top_zone")]
    pub top: ZoneRect,
    /// Bottom strip.
    #[serde(default = "default_bottom_zone")]
    pub bottom: ZoneRect,
    /// Left edge of the battle view.
    #[serde(default = "default_left_zone")]
    pub left: ZoneRect,
    /// Right edge of the battle view.
    #[serde(default = "default_right_zone")]
    pub right: ZoneRect,
    /// The whole stage.
    #[serde(default = "default_free_zone")]
    pub free: ZoneRect,
    /// Horizontal band for team A bubbles.
    #[serde(default = "default_team_a_band")]
    pub team_a_band: Band,
    /// Horizontal band for team B bubbles.
    #[serde(default = "default_team_b_band")]
    pub team_b_band: Band,
}

impl StageConfig {
    fn rects(&self) -> [(&'static str, ZoneRect); 5] {
        [
            ("top", self.top),
            ("bottom", self.bottom),
            ("left", self.left),
            ("right", self.right),
            ("free", self.free),
        ]
    }

    fn bands(&self) -> [(&'static str, Band); 2] {
        [("team_a_band", self.team_a_band), ("team_b_band", self.team_b_band)]
    }
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            top: default_top_zone(),
            bottom: default_bottom_zone(),
            left: default_left_zone(),
            right: default_right_zone(),
            free: default_free_zone(),
            team_a_band: default_team_a_band(),
            team_b_band: default_team_b_band(),
        }
    }
}

// ---------------------------------------------------------------------------
// Viewers
// ---------------------------------------------------------------------------

/// Persistent viewer grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewersConfig {
    /// Whether joins create persistent tiles instead of bubbles.
    #[serde(default)]
    pub enabled: bool,

    /// Maximum tiles on the grid; the oldest is evicted beyond this.
    #[serde(default = "default_max_capacity")]
    pub max_capacity: u32,

    /// Tiles per grid row.
    #[serde(default = "default_columns")]
    pub columns: u32,

    /// Tile edge length in pixels.
    #[serde(default = "default_cell_size_px")]
    pub cell_size_px: u32,

    /// Gap between tiles in pixels.
    #[serde(default = "default_spacing_px")]
    pub spacing_px: u32,

    /// Left edge of the grid.
    #[serde(default = "default_grid_origin")]
    pub origin_x: i32,

    /// Top edge of the grid.
    #[serde(default = "default_grid_origin")]
    pub origin_y: i32,
}

impl Default for ViewersConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_capacity: default_max_capacity(),
            columns: default_columns(),
            cell_size_px: default_cell_size_px(),
            spacing_px: default_spacing_px(),
            origin_x: default_grid_origin(),
            origin_y: default_grid_origin(),
        }
    }
}

// ---------------------------------------------------------------------------
// Gifts
// ---------------------------------------------------------------------------

/// Gift catalog overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GiftsConfig {
    /// Extra or replacement gift name to coin value entries.
    #[serde(default)]
    pub extra_values: BTreeMap<String, u64>,

    /// Replacement tier table. Empty keeps the standard tiers.
    #[serde(default)]
    pub tiers: Vec<GiftTier>,

    /// Tier used for coin values no custom tier covers.
    #[serde(default = "default_fallback_tier")]
    pub fallback_tier: String,
}

impl GiftsConfig {
    /// Build the gift catalog these settings describe.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] if a custom tier table is malformed.
    pub fn catalog(&self) -> Result<GiftCatalog, LedgerError> {
        let catalog = if self.tiers.is_empty() {
            GiftCatalog::standard()
        } else {
            let standard = GiftCatalog::standard();
            let values = standard
                .gift_names()
                .map(|name| (name.to_owned(), standard.value_for(name)))
                .collect();
            GiftCatalog::new(self.tiers.clone(), values, &self.fallback_tier)?
        };
        Ok(catalog.with_extra_values(&self.extra_values))
    }
}

impl Default for GiftsConfig {
    fn default() -> Self {
        Self {
            extra_values: BTreeMap::new(),
            tiers: Vec::new(),
            fallback_tier: default_fallback_tier(),
        }
    }
}

// ---------------------------------------------------------------------------
// Runtime
// ---------------------------------------------------------------------------

/// Where the engine binary reads inbound events from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSourceKind {
    /// Built-in random event generator.
    #[default]
    Simulated,
    /// JSON lines on standard input.
    Stdin,
}

/// Process-level settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Inbound event source.
    #[serde(default)]
    pub event_source: EventSourceKind,

    /// Real milliseconds between scheduler advances.
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,

    /// Milliseconds between simulated events.
    #[serde(default = "default_simulation_interval_ms")]
    pub simulation_interval_ms: u64,

    /// Wall-clock run limit in seconds. 0 runs until stopped.
    #[serde(default)]
    pub max_real_time_seconds: u64,

    /// Start the first round as soon as the engine comes up.
    #[serde(default = "default_auto_start")]
    pub auto_start: bool,

    /// Write every notification to stdout as one JSON line.
    #[serde(default = "default_emit_json")]
    pub emit_json: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            event_source: EventSourceKind::default(),
            frame_interval_ms: default_frame_interval_ms(),
            simulation_interval_ms: default_simulation_interval_ms(),
            max_real_time_seconds: 0,
            auto_start: default_auto_start(),
            emit_json: default_emit_json(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

const fn default_duration_minutes() -> u32 {
    60
}

const fn default_cooldown_ms() -> u64 {
    5000
}

const fn default_warning_at_seconds() -> u32 {
    10
}

const fn default_tick_interval_ms() -> u64 {
    1000
}

const fn default_interaction_points() -> u64 {
    1
}

const fn default_gift_multiplier() -> u64 {
    5
}

fn default_interaction_assignments() -> BTreeMap<EventKind, String> {
    [EventKind::Like, EventKind::Comment]
        .into_iter()
        .map(|kind| (kind, Team::A.tag().to_owned()))
        .collect()
}

fn default_bubble_positions() -> BTreeMap<EventKind, ZoneAffinity> {
    [EventKind::Like, EventKind::Comment]
        .into_iter()
        .map(|kind| (kind, ZoneAffinity::Top))
        .collect()
}

const fn default_grace_ms() -> u64 {
    1000
}

fn builtin_event_style(kind: EventKind) -> EventStyleConfig {
    match kind {
        EventKind::Join => EventStyleConfig::new("fade_in_out", 100, 2000, "#4CAF50"),
        EventKind::Like => EventStyleConfig::new("quick_pop", 90, 1500, "#FF69B4"),
        EventKind::Comment => EventStyleConfig::new("slide_bounce", 120, 3000, "#2196F3"),
        EventKind::Share => EventStyleConfig::new("float_away", 110, 2500, "#FF5722"),
        EventKind::Follow => EventStyleConfig::new("heart_pulse", 140, 3500, "#E91E63"),
        EventKind::Gift => EventStyleConfig::new("sparkle_zoom", 280, 5000, "#FFD700"),
    }
}

fn default_event_styles() -> BTreeMap<EventKind, EventStyleConfig> {
    EventKind::ALL
        .into_iter()
        .map(|kind| (kind, builtin_event_style(kind)))
        .collect()
}

const fn default_top_zone() -> ZoneRect {
    ZoneRect::new(50, 1400, 20, 150)
}

const fn default_bottom_zone() -> ZoneRect {
    ZoneRect::new(50, 1400, 820, 950)
}

const fn default_left_zone() -> ZoneRect {
    ZoneRect::new(10, 100, 100, 700)
}

const fn default_right_zone() -> ZoneRect {
    ZoneRect::new(1400, 1500, 100, 700)
}

const fn default_free_zone() -> ZoneRect {
    ZoneRect::new(0, 1500, 0, 950)
}

const fn default_team_a_band() -> Band {
    Band { min: 50, max: 600 }
}

const fn default_team_b_band() -> Band {
    Band { min: 900, max: 1400 }
}

const fn default_max_capacity() -> u32 {
    20
}

const fn default_columns() -> u32 {
    5
}

const fn default_cell_size_px() -> u32 {
    100
}

const fn default_spacing_px() -> u32 {
    10
}

const fn default_grid_origin() -> i32 {
    10
}

fn default_fallback_tier() -> String {
    FALLBACK_TIER_ID.to_owned()
}

const fn default_frame_interval_ms() -> u64 {
    100
}

const fn default_simulation_interval_ms() -> u64 {
    300
}

const fn default_auto_start() -> bool {
    true
}

const fn default_emit_json() -> bool {
    true
}
