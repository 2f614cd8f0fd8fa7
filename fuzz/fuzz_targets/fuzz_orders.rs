#![no_main]

//! Random order fuzzer.
//!
//! Drives generated matches with arbitrary orders for every team:
//! 1. Set each order through the public entry point (refusals are fine)
//! 2. Submit; rejected teams fall back to an idle turn
//! 3. Run the execute phases
//! 4. Check invariants after every turn
//!
//! This catches panics and invariant breaks that hand-built scenarios miss.

use arbitrary::Arbitrary;
use phalanx::game::{check_invariants, PieceKind, UpgradeKind};
use phalanx::tournament::{setup_match, MatchConfig};
use phalanx::{Coord, GameState, Order, Phase, RuleSet, SubmitOutcome, TeamId};
use libfuzzer_sys::fuzz_target;

/// A fuzzer-generated order.
#[derive(Arbitrary, Debug, Clone)]
enum FuzzOrder {
    Move { dx: i8, dy: i8 },
    Ranged { dx: i8, dy: i8 },
    Build { dx: i8, dy: i8, kind: u8 },
    Upgrade { upgrade: u8 },
    Terraform { dx: i8, dy: i8, raising: bool },
    Demolish,
    Heal,
    Clear,
}

/// Structured input for a short match.
#[derive(Arbitrary, Debug)]
struct MatchInput {
    seed: u64,
    teams: u8,
    num_turns: u8,
    /// (piece index, order) pairs, consumed round-robin across turns and teams.
    orders: Vec<(u8, FuzzOrder)>,
}

fn offset(at: Coord, dx: i8, dy: i8) -> Coord {
    let x = (i32::from(at.x) + i32::from(dx % 4)).clamp(0, i32::from(u16::MAX)) as u16;
    let y = (i32::from(at.y) + i32::from(dy % 4)).clamp(0, i32::from(u16::MAX)) as u16;
    Coord::new(x, y)
}

fn to_order(at: Coord, order: &FuzzOrder) -> Option<Order> {
    Some(match *order {
        FuzzOrder::Move { dx, dy } => Order::Move { dest: offset(at, dx, dy) },
        FuzzOrder::Ranged { dx, dy } => Order::RangedAttack { target: offset(at, dx, dy) },
        FuzzOrder::Build { dx, dy, kind } => Order::Build {
            dest: offset(at, dx, dy),
            kind: PieceKind::ALL[usize::from(kind) % PieceKind::ALL.len()],
        },
        FuzzOrder::Upgrade { upgrade } => Order::Upgrade {
            upgrade: UpgradeKind::ALL[usize::from(upgrade) % UpgradeKind::ALL.len()],
        },
        FuzzOrder::Terraform { dx, dy, raising } => Order::Terraform {
            dest: offset(at, dx, dy),
            raising,
        },
        FuzzOrder::Demolish => Order::Demolish,
        FuzzOrder::Heal => Order::Heal,
        FuzzOrder::Clear => return None,
    })
}

fn play_team(state: &mut GameState, team: TeamId, orders: &mut impl Iterator<Item = (u8, FuzzOrder)>) {
    let pieces: Vec<Coord> = state.registry.team_pieces(team).map(|p| p.position).collect();
    if pieces.is_empty() {
        return;
    }
    for (index, order) in orders.take(6) {
        let at = pieces[usize::from(index) % pieces.len()];
        let _ = match to_order(at, &order) {
            Some(order) => state.set_order(team, at, order),
            None => state.clear_order(team, at),
        };
    }
    let rejected = matches!(
        state.submit_turn(team),
        Ok(SubmitOutcome::Rejected(ref teams)) if teams.contains(&team)
    );
    if rejected {
        for at in pieces {
            let _ = state.clear_order(team, at);
        }
        let _ = state.submit_turn(team);
    }
}

fuzz_target!(|input: MatchInput| {
    let config = MatchConfig {
        map_width: 12,
        map_height: 12,
        teams: 2 + usize::from(input.teams % 3),
        ..MatchConfig::default()
    };
    let Ok(mut state) = setup_match(input.seed, &config, RuleSet::base()) else {
        return;
    };
    let num_turns = (input.num_turns % 12).max(1);
    let mut orders = input.orders.into_iter().cycle().take(512);

    for _ in 0..num_turns {
        if state.run_until_orders().is_err() || state.is_game_over() {
            break;
        }
        let active: Vec<TeamId> = state.active_teams().collect();
        for team in active {
            if state.phase() != Phase::Orders {
                break;
            }
            play_team(&mut state, team, &mut orders);
        }
        // A later submission can reject an earlier team; those go idle too.
        if state.phase() == Phase::Orders {
            for team in state.controller().pending() {
                let pieces: Vec<Coord> = state.registry.team_pieces(team).map(|p| p.position).collect();
                for at in pieces {
                    let _ = state.clear_order(team, at);
                }
                let _ = state.submit_turn(team);
            }
            // Idle turns never conflict.
            assert_ne!(state.phase(), Phase::Orders, "idle turns rejected");
        }

        let violations = check_invariants(&state);
        assert!(violations.is_empty(), "invariants broken: {violations:?}");
        state.drain_notifications();
    }
});
