//! Gift value resolution and the round scoring ledger for the PK battle.
//!
//! Both halves of this crate are pure: no timers, no I/O, no interior
//! mutability. The round engine in `pkbattle-core` owns a
//! [`ScoringLedger`] and funnels every score change through it.
//!
//! # Modules
//!
//! - [`gifts`] -- The [`GiftCatalog`]: gift name to coin value, coin value
//!   to visual tier.
//! - [`scoring`] -- The [`ScoringLedger`]: current-round points and round
//!   wins per team, plus the winner-decision rule.
//!
//! # Usage
//!
//! ```
//! use pkbattle_ledger::{GiftCatalog, ScoringLedger};
//! use pkbattle_types::{RoundOutcome, Team};
//!
//! let catalog = GiftCatalog::standard();
//! let coins = catalog.value_for("Doughnut");
//! assert_eq!(catalog.tier_for(coins).id, "small");
//!
//! let mut ledger = ScoringLedger::new();
//! let _ = ledger.add_points(Team::A, coins * 5);
//! assert_eq!(ledger.decide_round_winner(), RoundOutcome::TeamA);
//! ```

pub mod gifts;
pub mod scoring;

// Re-export primary types at crate root.
pub use gifts::{GiftCatalog, GiftTier, TierMatch};
pub use scoring::ScoringLedger;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors raised while building a custom gift tier table.
///
/// The scoring paths never fail; only catalog construction validates.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LedgerError {
    /// The tier table has no entries.
    #[error("gift tier table is empty")]
    EmptyTierTable,

    /// A tier's inclusive range is inverted.
    #[error("tier {tier_id} has min {min} above max {max}")]
    InvalidRange {
        /// The offending tier.
        tier_id: String,
        /// Its lower bound.
        min: u64,
        /// Its upper bound.
        max: u64,
    },

    /// Two adjacent tiers leave a gap or overlap.
    #[error("tier {next} must start at {expected_min} after {previous}, starts at {actual_min}")]
    NotContiguous {
        /// The lower tier.
        previous: String,
        /// The following tier.
        next: String,
        /// The lower bound the following tier should have.
        expected_min: u64,
        /// The lower bound it actually has.
        actual_min: u64,
    },

    /// Two tiers share an id.
    #[error("duplicate tier id: {tier_id}")]
    DuplicateTierId {
        /// The repeated id.
        tier_id: String,
    },

    /// The configured fallback tier is not part of the table.
    #[error("fallback tier {tier_id} is not in the tier table")]
    FallbackNotFound {
        /// The missing id.
        tier_id: String,
    },
}
