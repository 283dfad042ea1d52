//! Demo event generator.
//!
//! Produces a plausible live-stream mix from five dummy viewers: every
//! third event is a gift for a random team, the rest are mostly likes and
//! comments with the occasional join, share, or follow. Gifts are drawn
//! from those assigned to the chosen team, or from the whole catalog when
//! that team has none.

use std::collections::BTreeMap;
use std::time::Duration;

use pkbattle_core::config::BattleConfig;
use pkbattle_core::runner::Inbound;
use pkbattle_ledger::GiftCatalog;
use pkbattle_types::{EventKind, InboundEvent, Team};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::mpsc;
use tracing::{debug, info};

/// `(user_id, username, avatar image number)`.
const USERS: [(&str, &str, u8); 5] = [
    ("user_001", "Alice", 1),
    ("user_002", "Bob", 2),
    ("user_003", "Charlie", 3),
    ("user_004", "Diana", 4),
    ("user_005", "Eve", 5),
];

const COMMENTS: [&str; 6] = [
    "Amazing stream! 🔥",
    "Love your content!",
    "Hello from Indonesia! 🇮🇩",
    "You're the best! ❤️",
    "Keep it up!",
    "This is so cool! 😎",
];

/// Random event generator.
#[derive(Debug)]
pub struct Simulator {
    rng: StdRng,
    catalog_gifts: Vec<String>,
    assignments: BTreeMap<String, String>,
    step: u64,
}

impl Simulator {
    /// Build a generator. Uses `bubbles.seed` when set so demo runs are
    /// reproducible.
    pub fn new(config: &BattleConfig, catalog: &GiftCatalog) -> Self {
        let rng = config
            .bubbles
            .seed
            .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        Self {
            rng,
            catalog_gifts: catalog.gift_names().map(str::to_owned).collect(),
            assignments: config.gift_assignments.clone(),
            step: 0,
        }
    }

    /// Produce the next event.
    pub fn next_event(&mut self) -> InboundEvent {
        let step = self.step;
        self.step = step.wrapping_add(1);
        if step.checked_rem(3) == Some(0) {
            let team = if self.rng.random_bool(0.5) {
                Team::A
            } else {
                Team::B
            };
            return self.gift_for(team);
        }

        let kind = match self.rng.random_range(0..100_u32) {
            0..40 => EventKind::Like,
            40..75 => EventKind::Comment,
            75..90 => EventKind::Join,
            90..95 => EventKind::Share,
            _ => EventKind::Follow,
        };
        let mut event = self.random_viewer_event(kind);
        match kind {
            EventKind::Comment => {
                let pick = self.rng.random_range(0..COMMENTS.len());
                if let Some(text) = COMMENTS.get(pick) {
                    event = event.with_comment(*text);
                }
            }
            EventKind::Like => {
                let likes = self.rng.random_range(1..=15_u32);
                event = event.with_like_count(likes);
            }
            _ => {}
        }
        event
    }

    /// A gift meant for `team`.
    pub fn gift_for(&mut self, team: Team) -> InboundEvent {
        let assigned: Vec<&String> = self
            .assignments
            .iter()
            .filter(|(_, tag)| tag.as_str() == team.tag())
            .map(|(name, _)| name)
            .collect();
        let pool: Vec<&String> = if assigned.is_empty() {
            debug!(team = ?team, "no gifts assigned, drawing from the catalog");
            self.catalog_gifts.iter().collect()
        } else {
            assigned
        };

        let pick = self.rng.random_range(0..pool.len().max(1));
        let gift_name = pool.get(pick).map_or("Rose", |name| name.as_str()).to_owned();
        let count = if self.rng.random_bool(0.2) {
            self.rng.random_range(2..=5_u32)
        } else {
            1
        };
        self.random_viewer_event(EventKind::Gift).with_gift(gift_name, count)
    }

    fn random_viewer_event(&mut self, kind: EventKind) -> InboundEvent {
        let pick = self.rng.random_range(0..USERS.len());
        let (user_id, username, avatar) = USERS
            .get(pick)
            .copied()
            .unwrap_or(("user_001", "Alice", 1));
        let mut event = InboundEvent::new(kind, username, user_id).stamped();
        event.avatar_url = Some(format!("https://i.pravatar.cc/150?img={avatar}"));
        event
    }
}

/// Send a simulated event every `interval_ms` until the battle loop goes
/// away.
pub async fn run_simulator(mut simulator: Simulator, interval_ms: u64, tx: mpsc::Sender<Inbound>) {
    info!(interval_ms, "simulated event source started");
    let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms.max(1)));
    loop {
        let _ = ticker.tick().await;
        let event = simulator.next_event();
        if tx.send(Inbound::Event(event)).await.is_err() {
            debug!("battle loop gone, simulator stopping");
            return;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn simulator(edit: impl FnOnce(&mut BattleConfig)) -> Simulator {
        let mut config = BattleConfig::default();
        config.bubbles.seed = Some(11);
        edit(&mut config);
        Simulator::new(&config, &GiftCatalog::standard())
    }

    #[test]
    fn every_third_event_is_a_gift() {
        let mut sim = simulator(|_| {});
        for step in 0..30_u64 {
            let event = sim.next_event();
            let expect_gift = step.checked_rem(3) == Some(0);
            assert_eq!(event.kind == EventKind::Gift, expect_gift, "step {step}");
        }
    }

    #[test]
    fn gifts_come_from_the_team_assignment() {
        let mut sim = simulator(|config| {
            config.gift_assignments.insert("Lion".to_owned(), "B".to_owned());
            config.gift_assignments.insert("Rose".to_owned(), "A".to_owned());
        });
        for _ in 0..20 {
            assert_eq!(sim.gift_for(Team::B).gift_name(), "Lion");
            assert_eq!(sim.gift_for(Team::A).gift_name(), "Rose");
        }
    }

    #[test]
    fn unassigned_team_draws_from_the_catalog() {
        let catalog = GiftCatalog::standard();
        let mut sim = simulator(|_| {});
        for _ in 0..20 {
            let event = sim.gift_for(Team::B);
            assert!(catalog.gift_names().any(|name| name == event.gift_name()));
            assert!((1..=5).contains(&event.gift_count()));
        }
    }

    #[test]
    fn events_come_from_dummy_viewers() {
        let mut sim = simulator(|_| {});
        for _ in 0..50 {
            let event = sim.next_event();
            assert!(USERS.iter().any(|(id, _, _)| *id == event.user_id));
            assert!(event.avatar_url.as_deref().unwrap().starts_with("https://i.pravatar.cc/"));
            if event.kind == EventKind::Comment {
                assert!(COMMENTS.contains(&event.comment_text()));
            }
        }
    }

    #[test]
    fn same_seed_same_stream() {
        let mut a = simulator(|_| {});
        let mut b = simulator(|_| {});
        for _ in 0..20 {
            let (x, y) = (a.next_event(), b.next_event());
            assert_eq!((x.kind, x.user_id), (y.kind, y.user_id));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stops_when_the_receiver_drops() {
        let (tx, mut rx) = mpsc::channel(4);
        let handle = tokio::spawn(run_simulator(simulator(|_| {}), 300, tx));
        let first = rx.recv().await.unwrap();
        assert!(matches!(first, Inbound::Event(ref e) if e.kind == EventKind::Gift));
        drop(rx);
        handle.await.unwrap();
    }
}
