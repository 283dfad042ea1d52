//! Whole-battle scenarios driven on the virtual clock.

#![allow(clippy::unwrap_used)]

use pkbattle_core::battle::{Battle, Command};
use pkbattle_core::config::BattleConfig;
use pkbattle_core::notify::{NoOpSink, Outbox, RecordingSink};
use pkbattle_core::round::BattleRoundEngine;
use pkbattle_core::scheduler::Scheduler;
use pkbattle_ledger::GiftCatalog;
use pkbattle_types::{
    EventKind, InboundEvent, Notification, RoundOutcome, RoundPhase, Team, ViewerId,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// A battle where the gifts "Fifty" and "Thirty" score exactly their name
/// and "Thirty" belongs to team B.
fn scoring_battle(minutes: u32) -> Battle {
    let mut config = BattleConfig::default();
    config.round.duration_minutes = minutes;
    config.points.gift_multiplier = 1;
    config.bubbles.seed = Some(42);
    config.gifts.extra_values.insert("Fifty".to_owned(), 50);
    config.gifts.extra_values.insert("Thirty".to_owned(), 30);
    config.gifts.extra_values.insert("Twenty".to_owned(), 20);
    config
        .gift_assignments
        .insert("Thirty".to_owned(), "B".to_owned());
    Battle::new(&config).unwrap()
}

fn viewer_battle() -> Battle {
    let mut config = BattleConfig::default();
    config.viewers.enabled = true;
    config.bubbles.seed = Some(42);
    Battle::new(&config).unwrap()
}

fn gift(name: &str) -> InboundEvent {
    InboundEvent::new(EventKind::Gift, "Alice", "user_001").with_gift(name, 1)
}

fn join(n: u32) -> InboundEvent {
    InboundEvent::new(EventKind::Join, format!("Viewer {n}"), format!("v{n}"))
}

fn ids(battle: &Battle) -> Vec<String> {
    battle
        .viewers()
        .order()
        .iter()
        .map(|id| id.as_str().to_owned())
        .collect()
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

#[test]
fn points_are_the_running_sum_until_reset() {
    let mut engine = BattleRoundEngine::new(&BattleConfig::default().round).unwrap();
    let mut scheduler = Scheduler::new();
    let mut outbox = Outbox::new();
    let mut rng = StdRng::seed_from_u64(9);

    let (mut sum_a, mut sum_b) = (0_u64, 0_u64);
    for _ in 0..500 {
        let team = if rng.random_bool(0.5) { Team::A } else { Team::B };
        let amount = rng.random_range(0..1_000_u64);
        let before = engine.state().points(team);
        engine.add_points(team, amount, &mut outbox);

        let expected = match team {
            Team::A => {
                sum_a += amount;
                sum_a
            }
            Team::B => {
                sum_b += amount;
                sum_b
            }
        };
        let after = engine.state().points(team);
        assert!(after >= before);
        assert_eq!(after, expected);
    }

    engine.reset_round(&mut scheduler, &mut outbox);
    assert_eq!(engine.state().team_a_points, 0);
    assert_eq!(engine.state().team_b_points, 0);
}

#[test]
fn gift_tier_boundary_is_exact() {
    let catalog = GiftCatalog::standard();
    let ten = catalog.tier_for(10);
    let eleven = catalog.tier_for(11);
    assert_eq!(ten.id, "micro");
    assert_eq!(eleven.id, "small");
    assert_ne!(ten.id, eleven.id);
    assert!(ten.contains(10));
    assert!(eleven.contains(11));
}

// ---------------------------------------------------------------------------
// Round lifecycle
// ---------------------------------------------------------------------------

#[test]
fn round_ends_exactly_at_duration_and_resets_after_cooldown() {
    for minutes in 1..=3_u32 {
        let mut battle = scoring_battle(minutes);
        let end_ms = u64::from(minutes) * 60_000;
        battle.apply(Command::Start, &mut NoOpSink);
        let _ = battle.handle_event(&gift("Fifty"), &mut NoOpSink);

        let _ = battle.advance_to(end_ms - 1, &mut NoOpSink);
        assert_eq!(battle.state().seconds_remaining, 1);
        assert_eq!(battle.state().phase, RoundPhase::Running);

        let mut sink = RecordingSink::new();
        let _ = battle.advance_to(end_ms, &mut sink);
        assert_eq!(battle.state().seconds_remaining, 0);
        assert_eq!(battle.state().phase, RoundPhase::Ended);
        assert_eq!(sink.count_of("round_won"), 1);
        assert!(sink.notifications.contains(&Notification::ClockTick {
            seconds_remaining: 0
        }));

        let _ = battle.advance_to(end_ms + 4_999, &mut sink);
        assert_eq!(sink.count_of("round_reset"), 0);
        assert_eq!(battle.state().seconds_remaining, 0);

        let _ = battle.advance_to(end_ms + 5_000, &mut sink);
        assert_eq!(sink.count_of("round_reset"), 1);
        assert_eq!(battle.state().phase, RoundPhase::Running);
        assert_eq!(battle.state().seconds_remaining, minutes * 60);
    }
}

#[test]
fn draw_changes_no_wins_but_still_resets() {
    let mut config = scoring_battle(1).config().clone();
    config.gift_assignments.insert("Twenty".to_owned(), "B".to_owned());
    let mut battle = Battle::new(&config).unwrap();
    battle.apply(Command::Start, &mut NoOpSink);
    let _ = battle.handle_event(&gift("Fifty"), &mut NoOpSink);
    let _ = battle.handle_event(&gift("Thirty"), &mut NoOpSink);
    let _ = battle.handle_event(&gift("Twenty"), &mut NoOpSink);
    assert_eq!(battle.state().team_a_points, 50);
    assert_eq!(battle.state().team_b_points, 50);

    let mut sink = RecordingSink::new();
    let _ = battle.advance_to(60_000, &mut sink);
    let state = battle.state();
    assert_eq!(state.last_outcome, Some(RoundOutcome::Draw));
    assert_eq!(state.team_a_round_wins, 0);
    assert_eq!(state.team_b_round_wins, 0);
    assert_eq!(sink.count_of("round_won"), 0);
    assert_eq!(sink.count_of("round_wins_changed"), 0);

    let _ = battle.advance_to(65_000, &mut sink);
    assert_eq!(sink.count_of("round_reset"), 1);
    assert_eq!(battle.state().rounds_completed, 1);
}

#[test]
fn one_minute_round_scenario() {
    let mut battle = scoring_battle(1);
    battle.apply(Command::Start, &mut NoOpSink);

    let _ = battle.advance_to(10_000, &mut NoOpSink);
    assert_eq!(battle.state().seconds_remaining, 50);
    let _ = battle.handle_event(&gift("Fifty"), &mut NoOpSink);
    let _ = battle.handle_event(&gift("Thirty"), &mut NoOpSink);
    assert_eq!(battle.state().team_a_points, 50);
    assert_eq!(battle.state().team_b_points, 30);

    let _ = battle.advance_to(59_999, &mut NoOpSink);
    assert_eq!(battle.state().team_a_round_wins, 0);

    let mut sink = RecordingSink::new();
    let _ = battle.advance_to(60_000, &mut sink);
    let state = battle.state();
    assert_eq!(state.team_a_round_wins, 1);
    assert_eq!(state.team_b_round_wins, 0);
    assert_eq!(state.last_outcome, Some(RoundOutcome::TeamA));
    assert!(sink
        .notifications
        .contains(&Notification::RoundWon { team: Team::A }));

    let _ = battle.advance_to(64_999, &mut NoOpSink);
    assert_eq!(battle.state().team_a_points, 50);

    let _ = battle.advance_to(65_000, &mut NoOpSink);
    let state = battle.state();
    assert_eq!(state.team_a_points, 0);
    assert_eq!(state.team_b_points, 0);
    assert_eq!(state.seconds_remaining, 60);
    assert_eq!(state.phase, RoundPhase::Running);
    assert_eq!(state.team_a_round_wins, 1);

    let _ = battle.advance_to(66_000, &mut NoOpSink);
    assert_eq!(battle.state().seconds_remaining, 59);
}

#[test]
fn late_points_cannot_change_the_latched_outcome() {
    let mut battle = scoring_battle(1);
    battle.apply(Command::Start, &mut NoOpSink);
    let _ = battle.handle_event(&gift("Fifty"), &mut NoOpSink);
    let _ = battle.advance_to(60_000, &mut NoOpSink);

    let _ = battle.handle_event(&gift("Thirty"), &mut NoOpSink);
    let _ = battle.handle_event(&gift("Thirty"), &mut NoOpSink);
    assert_eq!(battle.state().team_b_points, 60);
    assert_eq!(battle.state().last_outcome, Some(RoundOutcome::TeamA));
    assert_eq!(battle.state().team_b_round_wins, 0);

    let _ = battle.advance_to(65_000, &mut NoOpSink);
    assert_eq!(battle.state().team_b_points, 0);
}

#[test]
fn reset_all_during_cooldown_cancels_the_next_round() {
    let mut battle = scoring_battle(1);
    battle.apply(Command::Start, &mut NoOpSink);
    let _ = battle.handle_event(&gift("Fifty"), &mut NoOpSink);
    let _ = battle.advance_to(61_000, &mut NoOpSink);
    assert_eq!(battle.state().phase, RoundPhase::Ended);

    battle.apply(Command::ResetAll, &mut NoOpSink);
    let mut sink = RecordingSink::new();
    let _ = battle.advance_to(120_000, &mut sink);
    assert_eq!(sink.count_of("round_reset"), 0);
    let state = battle.state();
    assert_eq!(state.phase, RoundPhase::Idle);
    assert_eq!(state.team_a_round_wins, 0);
    assert_eq!(state.seconds_remaining, 60);
}

#[test]
fn duration_change_while_running_waits_for_the_next_round() {
    let mut battle = scoring_battle(1);
    battle.apply(Command::Start, &mut NoOpSink);
    let _ = battle.advance_to(5_000, &mut NoOpSink);
    battle.apply(Command::SetRoundDuration { minutes: 2 }, &mut NoOpSink);
    assert_eq!(battle.state().seconds_remaining, 55);

    let _ = battle.advance_to(65_000, &mut NoOpSink);
    assert_eq!(battle.state().seconds_remaining, 120);
    assert_eq!(battle.state().round_duration_seconds, 120);
}

// ---------------------------------------------------------------------------
// Bubbles
// ---------------------------------------------------------------------------

#[test]
fn bubble_lives_for_ttl_plus_grace() {
    let mut config = BattleConfig::default();
    config.bubbles.seed = Some(3);
    config
        .bubbles
        .styles
        .get_mut(&EventKind::Like)
        .unwrap()
        .duration_ms = 3_000;
    let mut battle = Battle::new(&config).unwrap();

    let like = InboundEvent::new(EventKind::Like, "Bob", "user_002");
    let id = battle.handle_event(&like, &mut NoOpSink).bubble.unwrap();

    let _ = battle.advance_to(3_999, &mut NoOpSink);
    assert!(battle.bubbles().contains(id));
    let _ = battle.advance_to(4_001, &mut NoOpSink);
    assert!(!battle.bubbles().contains(id));
}

#[test]
fn clear_bubbles_cancels_pending_expiries() {
    let mut battle = scoring_battle(1);
    for _ in 0..5 {
        let _ = battle.handle_event(&gift("Fifty"), &mut NoOpSink);
    }
    assert_eq!(battle.bubbles().len(), 5);

    let mut sink = RecordingSink::new();
    battle.apply(Command::ClearBubbles, &mut sink);
    assert!(battle.bubbles().is_empty());
    assert_eq!(sink.count_of("entity_removed"), 5);
    assert_eq!(battle.next_due(), None);
}

// ---------------------------------------------------------------------------
// Viewer grid
// ---------------------------------------------------------------------------

#[test]
fn twenty_first_viewer_evicts_the_first() {
    let mut battle = viewer_battle();
    for n in 1..=21 {
        let _ = battle.handle_event(&join(n), &mut NoOpSink);
    }

    assert_eq!(battle.viewers().len(), 20);
    assert!(!battle.viewers().contains(&ViewerId::new("v1")));
    assert!(battle.viewers().contains(&ViewerId::new("v21")));

    let mut indexes: Vec<u32> = battle.viewer_slots().iter().map(|s| s.grid_index).collect();
    indexes.sort_unstable();
    assert_eq!(indexes, (0..20).collect::<Vec<u32>>());
}

#[test]
fn removing_a_middle_viewer_keeps_the_grid_dense() {
    let mut battle = viewer_battle();
    for n in 1..=10 {
        let _ = battle.handle_event(&join(n), &mut NoOpSink);
    }
    let mut sink = RecordingSink::new();
    battle.apply(
        Command::RemoveViewer {
            viewer_id: ViewerId::new("v5"),
        },
        &mut sink,
    );

    assert_eq!(battle.viewers().len(), 9);
    assert_eq!(
        ids(&battle),
        vec!["v1", "v2", "v3", "v4", "v6", "v7", "v8", "v9", "v10"]
    );
    let indexes: Vec<u32> = battle.viewer_slots().iter().map(|s| s.grid_index).collect();
    assert_eq!(indexes, (0..9).collect::<Vec<u32>>());
    assert_eq!(sink.count_of("viewer_moved"), 5);
    assert_eq!(
        sink.notifications.last(),
        Some(&Notification::ViewerCountChanged { count: 9 })
    );
}

#[test]
fn blank_viewer_id_places_no_tile() {
    let mut battle = viewer_battle();
    let anonymous = InboundEvent::new(EventKind::Join, "", "  ");
    let _ = battle.handle_event(&anonymous, &mut NoOpSink);
    assert!(battle.viewers().is_empty());
}
