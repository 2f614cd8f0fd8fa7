//! Multi-turn integration tests: full AI matches, save files and remote turns.
//!
//! These tests verify that matches run over many turns without panicking or
//! breaking invariants, and that state survives a save round trip.
//!
//! Run with: cargo test --release game_integration

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use phalanx::game::check_invariants;
use phalanx::net::{apply_submission, TurnSubmission};
use phalanx::save;
use phalanx::tournament::{play_out, run_match, setup_match, MatchConfig};
use phalanx::{AiPlanner, Phase, RuleSet, SubmitOutcome, TeamId};

fn short_config(max_turns: u32) -> MatchConfig {
    MatchConfig {
        max_turns,
        map_width: 16,
        map_height: 16,
        ..MatchConfig::default()
    }
}

#[test]
fn test_100_turn_match_no_panic() {
    let config = MatchConfig {
        max_turns: 100,
        ..MatchConfig::default()
    };

    let result = run_match(42, &config).expect("Match should complete");
    assert!(result.turns_played <= 100);
    assert_eq!(result.team_stats.len(), 2);
}

#[test]
fn test_multiple_seeds_no_panic() {
    let config = short_config(40);

    for seed in 0..10 {
        let result = run_match(seed, &config).unwrap_or_else(|e| panic!("seed {seed}: {e}"));
        assert!(result.turns_played <= 40, "seed {seed}");
        if let Some(winner) = result.winner {
            assert!(!result.elimination_order.contains(&winner), "seed {seed}");
        }
    }
}

#[test]
fn test_four_team_match() {
    let config = MatchConfig {
        teams: 4,
        ..short_config(30)
    };

    let result = run_match(7, &config).unwrap();
    let seated: Vec<TeamId> = result.team_stats.iter().map(|s| s.team).collect();
    assert_eq!(seated, TeamId::ALL.to_vec());
}

#[test]
fn test_match_determinism() {
    let config = short_config(30);
    for seed in [1, 99, 12345] {
        assert_eq!(run_match(seed, &config).unwrap(), run_match(seed, &config).unwrap());
    }
}

#[test]
fn test_ai_economy_grows() {
    let config = short_config(25);
    let state = setup_match(3, &config, RuleSet::base()).unwrap();
    let pieces_before = state.registry.len();

    let (_, state) = play_out(state, 3, config.max_turns).unwrap();

    assert!(check_invariants(&state).is_empty());
    assert!(
        state.registry.len() > pieces_before || state.is_game_over(),
        "AI built nothing in {} turns",
        config.max_turns
    );
}

#[test]
fn test_save_round_trip_and_resume() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("match.txt");

    let config = short_config(8);
    let state = setup_match(11, &config, RuleSet::base()).unwrap();
    let (_, state) = play_out(state, 11, config.max_turns).unwrap();
    save::save(&state, &path).unwrap();

    let loaded = save::load(&path, RuleSet::base()).unwrap();
    assert_eq!(loaded.turn(), state.turn());
    assert_eq!(loaded.phase(), state.phase());
    assert_eq!(loaded.map, state.map);
    assert_eq!(save::write_state(&loaded), save::write_state(&state));
    for (team, original) in &state.teams {
        assert_eq!(loaded.teams[team].resources, original.resources);
        assert_eq!(loaded.teams[team].owned, original.owned);
    }
    assert!(check_invariants(&loaded).is_empty());

    let (result, resumed) = play_out(loaded, 11, 16).unwrap();
    assert!(resumed.turn() > state.turn() || resumed.is_game_over());
    assert!(result.turns_played <= 16);
}

#[test]
fn test_remote_turn_meets_local_ai() {
    let config = short_config(10);
    let mut state = setup_match(5, &config, RuleSet::base()).unwrap();
    state.run_until_orders().unwrap();

    // A remote RED plans with its own AI and ships the turn over the wire.
    let mut remote = AiPlanner::new(TeamId::Red);
    let mut scratch = state.clone();
    remote.take_turn(&mut scratch).unwrap();
    let json = TurnSubmission::from_state(&scratch, TeamId::Red).to_json().unwrap();

    let submission = TurnSubmission::from_json(&json).unwrap();
    assert_eq!(apply_submission(&mut state, &submission).unwrap(), SubmitOutcome::Waiting);

    let mut local = AiPlanner::new(TeamId::Blue);
    let outcome = local.take_turn(&mut state).unwrap();
    assert_eq!(outcome, SubmitOutcome::Accepted);
    assert_ne!(state.phase(), Phase::Orders);
    assert!(check_invariants(&state).is_empty());
}
