//! Gift catalog: gift name to coin value, coin value to visual tier.
//!
//! Tiers are contiguous inclusive coin ranges. The standard table covers
//! every positive value:
//!
//! | Tier   | Coins          | Effect                | Size | Duration |
//! |--------|----------------|-----------------------|------|----------|
//! | micro  | 1 - 10         | `quick_pop`           | 140  | 2000 ms  |
//! | small  | 11 - 50        | `bounce_cascade`      | 180  | 3000 ms  |
//! | medium | 51 - 200       | `sparkle_zoom`        | 240  | 4000 ms  |
//! | large  | 201 - 1000     | `explosion_particles` | 300  | 5000 ms  |
//! | mega   | 1001 and above | `screen_takeover`     | 400  | 8000 ms  |
//!
//! A value that no tier contains (only 0 with the standard table) resolves
//! to the fallback tier, the smallest non-micro tier, and is logged.
//! Unknown gift names are expected (the platform adds gifts all the time)
//! and resolve to 1 coin.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::LedgerError;

/// Coin value used for gift names missing from the catalog.
pub const DEFAULT_GIFT_VALUE: u64 = 1;

/// Tier returned when a coin value falls outside every range.
pub const FALLBACK_TIER_ID: &str = "small";

/// A coin-value bracket and the visual treatment for gifts inside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GiftTier {
    /// Stable tier id (`"micro"`, `"small"`, ...).
    pub id: String,
    /// Human-readable tier name.
    pub name: String,
    /// Lowest coin value in the tier, inclusive.
    pub min_coin_value: u64,
    /// Highest coin value in the tier, inclusive.
    pub max_coin_value: u64,
    /// Animation effect id for the renderer.
    pub effect: String,
    /// Bubble diameter in pixels.
    pub size_px: u32,
    /// Nominal display duration in milliseconds.
    pub duration_ms: u64,
    /// Accent color as `#RRGGBB`.
    pub color: String,
    /// Border width in pixels.
    pub border_width: u32,
    /// Glow strength.
    pub glow_intensity: u32,
    /// Short caption shown in the activity log.
    pub description: String,
}

impl GiftTier {
    /// Whether `coin_value` lies inside this tier's inclusive range.
    pub const fn contains(&self, coin_value: u64) -> bool {
        self.min_coin_value <= coin_value && coin_value <= self.max_coin_value
    }
}

/// Result of a tier lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierMatch<'a> {
    /// A tier's range contains the value.
    Exact(&'a GiftTier),
    /// No range contains the value; the fallback tier was used.
    Fallback(&'a GiftTier),
}

impl<'a> TierMatch<'a> {
    /// The resolved tier, whichever way it was found.
    pub const fn tier(self) -> &'a GiftTier {
        match self {
            Self::Exact(tier) | Self::Fallback(tier) => tier,
        }
    }

    /// Whether the fallback tier was used.
    pub const fn is_fallback(self) -> bool {
        matches!(self, Self::Fallback(_))
    }
}

/// Immutable gift catalog: tier table plus name-to-coin table.
#[derive(Debug, Clone)]
pub struct GiftCatalog {
    /// Tiers sorted by `min_coin_value`, contiguous and disjoint.
    tiers: Vec<GiftTier>,
    /// Copy of the fallback tier, so lookups never need an index.
    fallback: GiftTier,
    /// Known gift names and their coin value.
    values: BTreeMap<String, u64>,
}

impl GiftCatalog {
    /// The standard catalog.
    pub fn standard() -> Self {
        let tiers = standard_tiers();
        let fallback = tiers
            .iter()
            .find(|tier| tier.id == FALLBACK_TIER_ID)
            .cloned()
            .unwrap_or_else(small_tier);
        Self {
            tiers,
            fallback,
            values: standard_gift_values(),
        }
    }

    /// Build a catalog from a custom tier table.
    ///
    /// The table must be non-empty, each range must satisfy `min <= max`,
    /// adjacent ranges must be contiguous (`next.min == prev.max + 1`), ids
    /// must be unique, and `fallback_tier_id` must name one of the tiers.
    /// Tiers may be given in any order; they are sorted by lower bound.
    ///
    /// # Errors
    ///
    /// Returns the first [`LedgerError`] violation found.
    pub fn new(
        mut tiers: Vec<GiftTier>,
        values: BTreeMap<String, u64>,
        fallback_tier_id: &str,
    ) -> Result<Self, LedgerError> {
        if tiers.is_empty() {
            return Err(LedgerError::EmptyTierTable);
        }
        tiers.sort_by_key(|tier| tier.min_coin_value);

        let mut seen = BTreeSet::new();
        for tier in &tiers {
            if tier.min_coin_value > tier.max_coin_value {
                return Err(LedgerError::InvalidRange {
                    tier_id: tier.id.clone(),
                    min: tier.min_coin_value,
                    max: tier.max_coin_value,
                });
            }
            if !seen.insert(tier.id.as_str()) {
                return Err(LedgerError::DuplicateTierId {
                    tier_id: tier.id.clone(),
                });
            }
        }

        for pair in tiers.windows(2) {
            if let [previous, next] = pair {
                let expected_min = previous.max_coin_value.checked_add(1);
                if expected_min != Some(next.min_coin_value) {
                    return Err(LedgerError::NotContiguous {
                        previous: previous.id.clone(),
                        next: next.id.clone(),
                        expected_min: expected_min.unwrap_or(u64::MAX),
                        actual_min: next.min_coin_value,
                    });
                }
            }
        }

        let fallback = tiers
            .iter()
            .find(|tier| tier.id == fallback_tier_id)
            .cloned()
            .ok_or_else(|| LedgerError::FallbackNotFound {
                tier_id: fallback_tier_id.to_owned(),
            })?;

        Ok(Self {
            tiers,
            fallback,
            values,
        })
    }

    /// Merge extra name-to-coin entries over the catalog.
    ///
    /// Zero values are skipped, since every gift is worth at least one coin.
    #[must_use]
    pub fn with_extra_values(mut self, extra: &BTreeMap<String, u64>) -> Self {
        for (name, &coins) in extra {
            if coins == 0 {
                warn!(gift = %name, "ignoring zero coin value for gift");
                continue;
            }
            self.values.insert(name.clone(), coins);
        }
        self
    }

    /// Find the tier for a coin value, reporting whether the fallback was
    /// used.
    pub fn lookup(&self, coin_value: u64) -> TierMatch<'_> {
        let upper = self
            .tiers
            .partition_point(|tier| tier.min_coin_value <= coin_value);
        upper
            .checked_sub(1)
            .and_then(|idx| self.tiers.get(idx))
            .filter(|tier| tier.contains(coin_value))
            .map_or(TierMatch::Fallback(&self.fallback), TierMatch::Exact)
    }

    /// The tier for a coin value. Falls back to the fallback tier (logged)
    /// when no range matches.
    pub fn tier_for(&self, coin_value: u64) -> &GiftTier {
        let found = self.lookup(coin_value);
        if found.is_fallback() {
            warn!(
                coin_value,
                fallback = %self.fallback.id,
                "no gift tier covers coin value, using fallback tier"
            );
        }
        found.tier()
    }

    /// Coin value of a gift by catalogue name. Unknown and empty names are
    /// worth [`DEFAULT_GIFT_VALUE`].
    pub fn value_for(&self, gift_name: &str) -> u64 {
        if let Some(&coins) = self.values.get(gift_name) {
            return coins;
        }
        debug!(gift = gift_name, "gift not catalogued, using default value");
        DEFAULT_GIFT_VALUE
    }

    /// Catalogued gift names in alphabetical order.
    pub fn gift_names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// The tier table, in ascending coin order.
    pub fn tiers(&self) -> &[GiftTier] {
        &self.tiers
    }

    /// The tier used when no range matches.
    pub const fn fallback_tier(&self) -> &GiftTier {
        &self.fallback
    }
}

impl Default for GiftCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

// ---------------------------------------------------------------------------
// Standard tables
// ---------------------------------------------------------------------------

fn small_tier() -> GiftTier {
    GiftTier {
        id: "small".to_owned(),
        name: "Small Gift".to_owned(),
        min_coin_value: 11,
        max_coin_value: 50,
        effect: "bounce_cascade".to_owned(),
        size_px: 180,
        duration_ms: 3000,
        color: "#FFD700".to_owned(),
        border_width: 4,
        glow_intensity: 60,
        description: "Nice gift!".to_owned(),
    }
}

fn standard_tiers() -> Vec<GiftTier> {
    vec![
        GiftTier {
            id: "micro".to_owned(),
            name: "Micro Gift".to_owned(),
            min_coin_value: 1,
            max_coin_value: 10,
            effect: "quick_pop".to_owned(),
            size_px: 140,
            duration_ms: 2000,
            color: "#FFA500".to_owned(),
            border_width: 3,
            glow_intensity: 40,
            description: "Small appreciation".to_owned(),
        },
        small_tier(),
        GiftTier {
            id: "medium".to_owned(),
            name: "Medium Gift".to_owned(),
            min_coin_value: 51,
            max_coin_value: 200,
            effect: "sparkle_zoom".to_owned(),
            size_px: 240,
            duration_ms: 4000,
            color: "#FF1493".to_owned(),
            border_width: 5,
            glow_intensity: 80,
            description: "Great support!".to_owned(),
        },
        GiftTier {
            id: "large".to_owned(),
            name: "Large Gift".to_owned(),
            min_coin_value: 201,
            max_coin_value: 1000,
            effect: "explosion_particles".to_owned(),
            size_px: 300,
            duration_ms: 5000,
            color: "#9400D3".to_owned(),
            border_width: 6,
            glow_intensity: 100,
            description: "Amazing generosity!".to_owned(),
        },
        GiftTier {
            id: "mega".to_owned(),
            name: "MEGA GIFT".to_owned(),
            min_coin_value: 1001,
            max_coin_value: u64::MAX,
            effect: "screen_takeover".to_owned(),
            size_px: 400,
            duration_ms: 8000,
            color: "#FF0000".to_owned(),
            border_width: 8,
            glow_intensity: 150,
            description: "LEGENDARY SUPPORT!".to_owned(),
        },
    ]
}

fn standard_gift_values() -> BTreeMap<String, u64> {
    [
        ("Rose", 1),
        ("TikTok", 1),
        ("Finger Heart", 5),
        ("Heart", 10),
        ("Doughnut", 30),
        ("Rainbow Puke", 100),
        ("Motorcycle", 100),
        ("Sports Car", 1000),
        ("Drama Queen", 5000),
        ("Drama King", 5000),
        ("Yacht", 7000),
        ("Falcon", 10_999),
        ("Castle", 20_000),
        ("Lion", 29_999),
        ("Planet", 40_000),
        ("Universe", 50_000),
    ]
    .into_iter()
    .map(|(name, coins)| (name.to_owned(), coins))
    .collect()
}
