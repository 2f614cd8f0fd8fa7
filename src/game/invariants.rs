//! Game invariants - sanity checks that detect bugs.
//!
//! None of these can be broken through the public order API. A violation means
//! the simulation itself is wrong, so the match runner asserts them after every
//! phase in debug builds and the `validate` command reports them for save
//! files.

use std::collections::BTreeSet;

use crate::game::{economy::MAX_RESOURCES, GameState};

/// Invariant violation error.
#[derive(Debug, Clone)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub message: String,
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invariant violation: {}", self.message)
    }
}

impl std::error::Error for InvariantViolation {}

fn violation(message: String) -> InvariantViolation {
    InvariantViolation { message }
}

/// Check all game invariants.
///
/// Returns a list of violations found, or empty if all invariants hold.
#[must_use]
pub fn check_invariants(state: &GameState) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();

    for (coord, bucket) in state.registry.buckets() {
        if bucket.is_empty() {
            violations.push(violation(format!("Empty bucket kept at {coord}")));
        }
        if !state.map.in_bounds(coord) {
            violations.push(violation(format!("Pieces stored off the map at {coord}")));
        }

        let mut seen = BTreeSet::new();
        for piece in bucket {
            if piece.position != coord {
                violations.push(violation(format!(
                    "{} {} at {} is stored under {coord}",
                    piece.team, piece.kind, piece.position
                )));
            }
            if !seen.insert(piece.team) {
                violations.push(violation(format!(
                    "Team {} stacks more than one piece at {coord}",
                    piece.team
                )));
            }
            if piece.hp == 0 || piece.hp > piece.max_hp {
                violations.push(violation(format!(
                    "{} {} at {coord} has hp {}/{}",
                    piece.team, piece.kind, piece.hp, piece.max_hp
                )));
            }
            match state.teams.get(&piece.team) {
                None => violations.push(violation(format!(
                    "{} at {coord} belongs to unknown team {}",
                    piece.kind, piece.team
                ))),
                Some(team) if team.eliminated => violations.push(violation(format!(
                    "Eliminated team {} still owns a {} at {coord}",
                    piece.team, piece.kind
                ))),
                Some(_) => {}
            }
        }
    }

    for team in state.teams.values() {
        if team.resources > MAX_RESOURCES {
            violations.push(violation(format!(
                "Team {} has {} resources > max {MAX_RESOURCES}",
                team.id, team.resources
            )));
        }

        let mut owned = BTreeSet::new();
        for upgrade in &team.owned {
            if !owned.insert(*upgrade) {
                violations.push(violation(format!(
                    "Team {} owns upgrade {upgrade} twice",
                    team.id
                )));
            }
        }

        for (kind, attrs) in team.attributes.iter() {
            for upgrade in attrs.upgrades.iter().filter(|u| owned.contains(*u)) {
                violations.push(violation(format!(
                    "Team {} still offers owned upgrade {upgrade} at {kind}",
                    team.id
                )));
            }
        }
    }

    violations
}

/// Assert all game invariants hold, panicking if any are violated.
///
/// Only active in debug builds. No-op in release builds.
///
/// # Panics
///
/// Panics with detailed message if any invariant is violated.
#[cfg(debug_assertions)]
pub fn assert_invariants(state: &GameState) {
    let violations = check_invariants(state);
    if !violations.is_empty() {
        let messages: Vec<_> = violations.iter().map(|v| v.message.as_str()).collect();
        panic!("Game invariant violations:\n  - {}", messages.join("\n  - "));
    }
}

/// No-op in release builds.
#[cfg(not(debug_assertions))]
pub fn assert_invariants(_state: &GameState) {}
