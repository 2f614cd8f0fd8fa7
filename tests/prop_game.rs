//! Property-based tests for game mechanics.
//!
//! These tests verify properties of order validation, combat and the path cache.
//! Run with: cargo test --release prop_game

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use std::collections::BTreeSet;

use proptest::prelude::*;

use phalanx::game::{
    damage_formula, splash_damage, validate_team, Order, Piece, PieceKind, PieceRegistry, Team,
    UpgradeKind,
};
use phalanx::{Coord, Map, MovementType, Notification, PathCache, RuleSet, TeamId, TileKind};

fn tile_strategy() -> impl Strategy<Value = TileKind> {
    prop_oneof![
        6 => Just(TileKind::Grass),
        1 => Just(TileKind::Water),
        1 => Just(TileKind::Mountain),
        1 => Just(TileKind::Resource),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2000))]

    /// A team passes validation iff no tile is claimed twice, the spend fits
    /// within its resources and no upgrade is ordered twice.
    #[test]
    fn prop_validator_iff_all_rules_hold(
        orders in prop::collection::vec((0u16..8, 0u16..8, 0u8..8), 1..12),
        resources in 0u32..30
    ) {
        let rules = RuleSet::base();
        let team = Team::new(TeamId::Red, resources, &rules.attributes);
        let mut registry = PieceRegistry::new();
        let mut positions = BTreeSet::new();

        for (x, y, choice) in orders {
            let at = Coord::new(x, y);
            if !positions.insert(at) {
                continue;
            }
            let mut piece = Piece::new(TeamId::Red, PieceKind::Base, at, team.attrs(PieceKind::Base));
            piece.order = match choice {
                0 => None,
                1 => Some(Order::Move { dest: Coord::new(x + 1, y) }),
                2 => Some(Order::Move { dest: Coord::new(x, y + 1) }),
                3 if x > 0 => Some(Order::Move { dest: Coord::new(x - 1, y) }),
                4 => Some(Order::Build { dest: Coord::new(x, y + 1), kind: PieceKind::Trooper }),
                5 => Some(Order::Upgrade { upgrade: UpgradeKind::Forging }),
                6 => Some(Order::Upgrade { upgrade: UpgradeKind::Masonry }),
                _ => Some(Order::Heal),
            };
            registry.register(piece);
        }

        let mut claimed = BTreeSet::new();
        let mut unique = true;
        let mut spend = 0u32;
        let mut upgrades = Vec::new();
        let mut no_dup_upgrade = true;
        for piece in registry.team_pieces(TeamId::Red) {
            let tiles = match piece.order {
                Some(Order::Move { dest }) => vec![dest],
                Some(Order::Build { dest, kind }) => {
                    spend += team.attrs(kind).price;
                    vec![dest, piece.position]
                }
                Some(Order::Upgrade { upgrade }) => {
                    spend += rules.upgrade_price(upgrade).unwrap();
                    no_dup_upgrade &= !upgrades.contains(&upgrade);
                    upgrades.push(upgrade);
                    vec![piece.position]
                }
                _ => vec![piece.position],
            };
            for tile in tiles {
                unique &= claimed.insert(tile);
            }
        }

        let failures = validate_team(&registry, &team, &rules);
        prop_assert_eq!(failures.is_empty(), unique && spend <= resources && no_dup_upgrade);

        let move_failures = failures
            .iter()
            .filter(|f| matches!(f, Notification::InvalidMoveOrders { .. }))
            .count();
        let build_failures = failures
            .iter()
            .filter(|f| matches!(f, Notification::InvalidBuildOrders { .. }))
            .count();
        let upgrade_failures = failures
            .iter()
            .filter(|f| matches!(f, Notification::InvalidUpgradeOrders { .. }))
            .count();
        prop_assert_eq!(move_failures, usize::from(!unique));
        prop_assert_eq!(build_failures, usize::from(spend > resources));
        prop_assert_eq!(upgrade_failures, usize::from(!no_dup_upgrade));
        prop_assert_eq!(failures.len(), move_failures + build_failures + upgrade_failures);
    }

    /// Damage never exceeds the unmitigated strike and respects the minimum.
    #[test]
    fn prop_damage_bounded(
        attack in 0u32..50,
        multiplier in 0.0f64..3.0,
        hp_ratio in 0.0f64..=1.0,
        defense in 0u32..20,
        divisor in 1u32..6,
        at_least_one in any::<bool>()
    ) {
        let damage = damage_formula(attack, multiplier, hp_ratio, defense, divisor, at_least_one);
        let ceiling = (f64::from(attack) * multiplier).floor() as u32;

        prop_assert!(damage <= ceiling.max(1));
        if attack == 0 {
            prop_assert_eq!(damage, 0);
        } else if at_least_one {
            prop_assert!(damage >= 1);
        }
        if defense >= 10 && !at_least_one {
            prop_assert_eq!(damage, 0);
        }
    }

    /// Splash is zero without a multiplier and within rounding of direct * m otherwise.
    #[test]
    fn prop_splash_rounds(direct in 0u32..1000, multiplier in 0.0f64..2.0) {
        let splash = splash_damage(direct, multiplier);
        if multiplier <= 0.0 {
            prop_assert_eq!(splash, 0);
        } else {
            let exact = f64::from(direct) * multiplier;
            prop_assert!((f64::from(splash) - exact).abs() <= 0.5);
        }
    }

    /// Asking the cache twice returns the same tree and searches once.
    #[test]
    fn prop_cache_idempotent(
        tiles in prop::collection::vec(tile_strategy(), 64),
        gx in 0u16..8,
        gy in 0u16..8,
        movement in prop_oneof![
            Just(MovementType::Ground),
            Just(MovementType::Hover),
            Just(MovementType::Flying),
        ]
    ) {
        let rows: Vec<Vec<TileKind>> = tiles.chunks(8).map(<[TileKind]>::to_vec).collect();
        let map = Map::from_rows(rows).unwrap();
        let goal = Coord::new(gx, gy);
        let mut cache = PathCache::new();

        let first = cache.get_path(&map, movement, goal).clone();
        let second = cache.get_path(&map, movement, goal).clone();

        prop_assert_eq!(first, second);
        prop_assert_eq!(cache.misses(), 1);
    }
}
