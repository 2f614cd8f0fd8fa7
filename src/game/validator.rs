//! Cross-checks of a team's pending orders before the ORDERS phase ends.
//!
//! Three rules are evaluated independently over every piece of the team:
//!
//! - no two orders claim the same tile,
//! - the summed build and upgrade prices fit within the team's resources,
//! - no upgrade is ordered twice.
//!
//! Each failing rule yields exactly one notification.

use std::collections::BTreeMap;

use crate::game::events::Notification;
use crate::game::{Coord, Order, Piece, PieceRegistry, RuleSet, Team, UpgradeKind};

/// Tiles a piece's order reserves for the end of the turn.
#[must_use]
pub fn claimed_tiles(piece: &Piece) -> Vec<Coord> {
    match piece.order {
        Some(Order::Move { dest }) => vec![dest],
        Some(Order::Build { dest, .. }) => vec![dest, piece.position],
        _ => vec![piece.position],
    }
}

/// Resources a piece's order will spend.
#[must_use]
pub fn order_cost(piece: &Piece, team: &Team, rules: &RuleSet) -> u32 {
    match piece.order {
        Some(Order::Build { kind, .. }) => team.attrs(kind).price,
        Some(Order::Upgrade { upgrade }) => rules.upgrade_price(upgrade).unwrap_or(0),
        _ => 0,
    }
}

/// Validate every pending order of `team`.
///
/// Returns the failure notifications; an empty list means the team may leave
/// the ORDERS phase.
#[must_use]
pub fn validate_team(registry: &PieceRegistry, team: &Team, rules: &RuleSet) -> Vec<Notification> {
    let mut claims: BTreeMap<Coord, u32> = BTreeMap::new();
    let mut upgrades: BTreeMap<UpgradeKind, u32> = BTreeMap::new();
    let mut spent: u32 = 0;

    for piece in registry.team_pieces(team.id) {
        for tile in claimed_tiles(piece) {
            *claims.entry(tile).or_default() += 1;
        }
        if let Some(Order::Upgrade { upgrade }) = piece.order {
            *upgrades.entry(upgrade).or_default() += 1;
        }
        spent = spent.saturating_add(order_cost(piece, team, rules));
    }

    let mut failures = Vec::new();

    let invalid_coordinates: Vec<Coord> = claims
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(coord, _)| coord)
        .collect();
    if !invalid_coordinates.is_empty() {
        failures.push(Notification::InvalidMoveOrders {
            team: team.id,
            invalid_coordinates,
        });
    }

    if spent > team.resources {
        failures.push(Notification::InvalidBuildOrders {
            team: team.id,
            spent_resources: spent,
        });
    }

    let duplicate_upgrades: Vec<UpgradeKind> = upgrades
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(kind, _)| kind)
        .collect();
    if !duplicate_upgrades.is_empty() {
        failures.push(Notification::InvalidUpgradeOrders {
            team: team.id,
            duplicate_upgrades,
        });
    }

    failures
}
