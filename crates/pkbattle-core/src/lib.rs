//! Round engine, scheduler, and display entity lifecycle for the PK battle.
//!
//! This crate is the battle core. It turns a stream of social interaction
//! events into team scores, a timed round lifecycle, short-lived bubbles,
//! and a grid of persistent viewer tiles, and reports every change as a
//! typed notification.
//!
//! # Modules
//!
//! - [`battle`] -- [`Battle`], the single dispatch point that owns all
//!   state.
//! - [`bubbles`] -- Ephemeral entity lifecycle: spawn, place, expire.
//! - [`clock`] -- The round countdown clock.
//! - [`config`] -- Configuration loading from `pkbattle-config.json` into
//!   strongly-typed structs.
//! - [`layout`] -- Bubble placement zones on the stage.
//! - [`notify`] -- [`NotificationSink`] and the per-step outbox.
//! - [`round`] -- The round state machine around the scoring ledger.
//! - [`runner`] -- The async event loop.
//! - [`scheduler`] -- Fire-once timers on a virtual millisecond clock.
//! - [`sequence`] -- Entity id allocation.
//! - [`viewers`] -- Persistent viewer tiles on a dense grid.
//!
//! [`Battle`]: battle::Battle
//! [`NotificationSink`]: notify::NotificationSink

pub mod battle;
pub mod bubbles;
pub mod clock;
pub mod config;
pub mod layout;
pub mod notify;
pub mod round;
pub mod runner;
pub mod scheduler;
pub mod sequence;
pub mod viewers;
