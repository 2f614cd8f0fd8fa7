//! Combat resolution.
//!
//! Melee happens wherever pieces of different teams share a tile after the
//! move phase. Every member of such a group strikes every other member at
//! once; damage is computed from pre-combat HP and only then applied, so the
//! order pieces are stored in never matters. Ranged attacks follow the same
//! rule across the whole phase.

use tracing::{debug, trace};

use crate::game::events::{CancelReason, Notification};
use crate::game::{
    economy, Archetype, Coord, DamageType, Order, Piece, PieceAttributes, PieceRegistry, Steal,
    TeamId, Teams,
};

/// Damage dealt by one strike.
///
/// `floor(attack / divisor * multiplier * hp_ratio * max(0, 1 - defense / 10))`,
/// raised to 1 when `at_least_one` is set and the attack is nonzero.
#[must_use]
pub fn damage_formula(
    attack: u32,
    multiplier: f64,
    hp_ratio: f64,
    defense: u32,
    divisor: u32,
    at_least_one: bool,
) -> u32 {
    if attack == 0 || divisor == 0 {
        return 0;
    }
    let mitigation = (1.0 - f64::from(defense) / 10.0).max(0.0);
    let raw = f64::from(attack) / f64::from(divisor) * multiplier * hp_ratio * mitigation;
    let damage = raw.floor().max(0.0) as u32;
    if at_least_one { damage.max(1) } else { damage }
}

/// Defense `target` puts up against `attacker`.
#[must_use]
pub fn defense_against(attacker: &PieceAttributes, target: &Piece, target_attrs: &PieceAttributes) -> u32 {
    if attacker.flags.armor_piercing {
        0
    } else {
        target_attrs.armor.saturating_add(target.modifiers.temp_armor)
    }
}

fn strike(
    attacker: &Piece,
    attacker_attrs: &PieceAttributes,
    target: &Piece,
    target_attrs: &PieceAttributes,
    divisor: u32,
) -> u32 {
    damage_formula(
        attacker_attrs.attack,
        attacker_attrs.multiplier(target_attrs.archetype),
        attacker.hp_ratio(),
        defense_against(attacker_attrs, target, target_attrs),
        divisor,
        attacker_attrs.damage_type != DamageType::None,
    )
}

fn attrs_of<'a>(teams: &'a Teams, piece: &Piece) -> Option<&'a PieceAttributes> {
    teams.get(&piece.team).map(|team| team.attrs(piece.kind))
}

/// Damage queued against one piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Hit {
    coord: Coord,
    team: TeamId,
    amount: u32,
    steal: Option<Steal>,
}

fn plunder(attacker: &Piece, attacker_attrs: &PieceAttributes, target_attrs: &PieceAttributes) -> Option<Steal> {
    (attacker_attrs.flags.plunder > 0 && target_attrs.archetype == Archetype::Structure).then_some(
        Steal {
            thief: attacker.team,
            amount: attacker_attrs.flags.plunder,
        },
    )
}

/// Apply one hit, arming the death burst if it kills.
fn apply_hit(registry: &mut PieceRegistry, teams: &Teams, hit: Hit, events: &mut Vec<Notification>) {
    let Some(piece) = registry.get_mut(hit.coord, hit.team) else {
        return;
    };
    if !piece.is_alive() {
        return;
    }
    let lost = piece.take_damage(hit.amount);
    if let Some(steal) = hit.steal {
        piece.modifiers.steals.push(steal);
    }
    if lost == 0 {
        return;
    }
    if !piece.is_alive() {
        piece.modifiers.pending_burst = attrs_of(teams, piece).map_or(0, |a| a.flags.death_burst);
    }
    events.push(Notification::PieceDamaged {
        gx: hit.coord.x,
        gy: hit.coord.y,
        team: hit.team,
        amount: lost,
        hp: piece.hp,
    });
}

/// Give idle pieces their fortify armor for this combat phase.
pub fn apply_fortify(registry: &mut PieceRegistry, teams: &Teams) {
    for piece in registry.iter_mut().filter(|p| p.is_idle()) {
        let fortify = attrs_of(teams, piece).map_or(0, |a| a.flags.fortify);
        if fortify > 0 {
            piece.modifiers.temp_armor = piece.modifiers.temp_armor.saturating_add(fortify);
        }
    }
}

/// Resolve melee on every contested tile.
pub fn resolve_melee(registry: &mut PieceRegistry, teams: &Teams, events: &mut Vec<Notification>) {
    for coord in registry.contested() {
        let group: Vec<Piece> = registry.at(coord).to_vec();
        let divisor = u32::try_from(group.len() - 1).unwrap_or(u32::MAX);
        let mut incoming = vec![0u32; group.len()];
        let mut dealt = vec![0u32; group.len()];
        let mut steals: Vec<Option<Steal>> = vec![None; group.len()];

        for (i, attacker) in group.iter().enumerate() {
            let Some(attacker_attrs) = attrs_of(teams, attacker) else {
                continue;
            };
            if attacker_attrs.damage_type != DamageType::Melee {
                continue;
            }
            for (j, target) in group.iter().enumerate() {
                if i == j || target.team == attacker.team {
                    continue;
                }
                let Some(target_attrs) = attrs_of(teams, target) else {
                    continue;
                };
                let damage = strike(attacker, attacker_attrs, target, target_attrs, divisor);
                incoming[j] = incoming[j].saturating_add(damage);
                dealt[i] = dealt[i].saturating_add(damage);
                if damage > 0 {
                    if let Some(steal) = plunder(attacker, attacker_attrs, target_attrs) {
                        steals[j] = Some(steal);
                    }
                }
            }
        }

        debug!(%coord, size = group.len(), ?incoming, "melee resolved");

        for (j, target) in group.iter().enumerate() {
            let hit = Hit {
                coord,
                team: target.team,
                amount: incoming[j],
                steal: steals[j],
            };
            apply_hit(registry, teams, hit, events);
        }

        for (i, attacker) in group.iter().enumerate() {
            if dealt[i] == 0 || !attrs_of(teams, attacker).is_some_and(|a| a.flags.lifesteal) {
                continue;
            }
            let Some(piece) = registry.get_mut(coord, attacker.team) else {
                continue;
            };
            if !piece.is_alive() {
                continue;
            }
            let gained = piece.heal(dealt[i]);
            if gained > 0 {
                events.push(Notification::PieceHealed {
                    gx: coord.x,
                    gy: coord.y,
                    team: attacker.team,
                    amount: gained,
                });
            }
        }
    }
}

/// Resolve every pending ranged attack simultaneously.
///
/// Attackers sharing their tile with an enemy lose the order with an
/// `ORDER_CANCELED` notification. Attackers that died earlier in the turn are
/// gone from the registry and their orders vanish with them.
pub fn resolve_ranged(registry: &mut PieceRegistry, teams: &mut Teams, events: &mut Vec<Notification>) {
    let shooters: Vec<(Coord, TeamId, Coord)> = registry
        .iter()
        .filter_map(|p| match p.order {
            Some(Order::RangedAttack { target }) => Some((p.position, p.team, target)),
            _ => None,
        })
        .collect();

    let mut hits = Vec::new();
    for (origin, team, target) in shooters {
        let Some(attacker) = registry.get(origin, team).cloned() else {
            continue;
        };
        if let Some(piece) = registry.get_mut(origin, team) {
            piece.order = None;
        }
        if registry.has_enemy_at(origin, team) {
            debug!(%origin, %team, "ranged attack contested");
            events.push(Notification::OrderCanceled {
                gx: origin.x,
                gy: origin.y,
                team,
                reason: CancelReason::Contested,
            });
            continue;
        }
        let Some(attrs) = attrs_of(teams, &attacker) else {
            continue;
        };
        let distance = origin.distance(target);
        if attrs.damage_type != DamageType::Ranged
            || distance < attrs.min_range
            || distance > attrs.max_range
        {
            events.push(Notification::OrderCanceled {
                gx: origin.x,
                gy: origin.y,
                team,
                reason: CancelReason::InvalidSite,
            });
            continue;
        }

        events.push(Notification::UnitRangedAttack {
            gx: origin.x,
            gy: origin.y,
            team,
            tx: target.x,
            ty: target.y,
        });

        for victim in registry.enemies_at(target, team) {
            let Some(victim_attrs) = attrs_of(teams, victim) else {
                continue;
            };
            let amount = strike(&attacker, attrs, victim, victim_attrs, 1);
            trace!(%target, victim = %victim.team, amount, "direct hit");
            hits.push(Hit {
                coord: target,
                team: victim.team,
                amount,
                steal: plunder(&attacker, attrs, victim_attrs).filter(|_| amount > 0),
            });
        }

        let splash = attrs.flags.splash;
        if splash > 0.0 {
            for victim in registry.adjacent_enemies(target, team) {
                let Some(victim_attrs) = attrs_of(teams, victim) else {
                    continue;
                };
                let direct = strike(&attacker, attrs, victim, victim_attrs, 1);
                let amount = splash_damage(direct, splash);
                hits.push(Hit {
                    coord: victim.position,
                    team: victim.team,
                    amount,
                    steal: None,
                });
            }
        }
    }

    for hit in hits {
        apply_hit(registry, teams, hit, events);
    }
    settle_steals(registry, teams, events);
    reap_dead(registry, teams, events);
}

/// Damage an adjacent piece takes from splash: `round(direct * m)`.
#[must_use]
pub fn splash_damage(direct: u32, multiplier: f64) -> u32 {
    if multiplier <= 0.0 {
        return 0;
    }
    (f64::from(direct) * multiplier).round() as u32
}

/// Pay out recorded plunder: resources move from each victim's team to the thief.
pub fn settle_steals(registry: &mut PieceRegistry, teams: &mut Teams, events: &mut Vec<Notification>) {
    for piece in registry.iter_mut() {
        for steal in std::mem::take(&mut piece.modifiers.steals) {
            let amount = economy::transfer(teams, piece.team, steal.thief, steal.amount);
            if amount > 0 {
                events.push(Notification::ResourcesStolen {
                    thief: steal.thief,
                    victim: piece.team,
                    amount,
                });
            }
        }
    }
}

/// Remove dead pieces, then detonate the death bursts they carried.
///
/// Pieces killed by a burst are removed too but never burst themselves.
pub fn reap_dead(registry: &mut PieceRegistry, teams: &Teams, events: &mut Vec<Notification>) {
    let dead = registry.remove_dead();
    let mut bursts = Vec::new();
    for piece in &dead {
        debug!(team = %piece.team, kind = %piece.kind, at = %piece.position, "piece dead");
        events.push(Notification::PieceDead {
            gx: piece.position.x,
            gy: piece.position.y,
            team: piece.team,
        });
        if piece.modifiers.pending_burst > 0 {
            bursts.push((piece.position, piece.team, piece.modifiers.pending_burst));
        }
    }

    if bursts.is_empty() {
        return;
    }

    let mut hits = Vec::new();
    for (origin, team, amount) in bursts {
        let area = std::iter::once(origin).chain(origin.around());
        for tile in area {
            for victim in registry.enemies_at(tile, team) {
                hits.push(Hit {
                    coord: tile,
                    team: victim.team,
                    amount,
                    steal: None,
                });
            }
        }
    }
    for hit in hits {
        apply_hit(registry, teams, hit, events);
    }

    for piece in registry.remove_dead() {
        events.push(Notification::PieceDead {
            gx: piece.position.x,
            gy: piece.position.y,
            team: piece.team,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{PieceKind, RuleSet, Team};

    fn create_teams(rules: &RuleSet) -> Teams {
        let mut teams = Teams::new();
        for id in [TeamId::Red, TeamId::Blue] {
            teams.insert(id, Team::new(id, 10, &rules.attributes));
        }
        teams
    }

    fn place(registry: &mut PieceRegistry, teams: &Teams, team: TeamId, kind: PieceKind, x: u16, y: u16) {
        registry.register(Piece::new(team, kind, Coord::new(x, y), teams[&team].attrs(kind)));
    }

    #[test]
    fn test_damage_formula_floor() {
        // 2 * 1.5 * 1.0 * 0.9 = 2.7
        assert_eq!(damage_formula(2, 1.5, 1.0, 1, 1, true), 2);
        // Halved by a three-way split: 1 * 0.9 = 0.9, lifted to 1
        assert_eq!(damage_formula(2, 1.0, 1.0, 1, 2, true), 1);
        assert_eq!(damage_formula(2, 1.0, 1.0, 1, 2, false), 0);
    }

    #[test]
    fn test_damage_formula_zero_attack() {
        assert_eq!(damage_formula(0, 2.0, 1.0, 0, 1, true), 0);
    }

    #[test]
    fn test_heavy_armor_floors_at_zero() {
        assert_eq!(damage_formula(5, 1.0, 1.0, 15, 1, false), 0);
        assert_eq!(damage_formula(5, 1.0, 1.0, 15, 1, true), 1);
    }

    #[test]
    fn test_two_troopers_melee() {
        let rules = RuleSet::base();
        let teams = create_teams(&rules);
        let mut registry = PieceRegistry::new();
        place(&mut registry, &teams, TeamId::Red, PieceKind::Trooper, 2, 2);
        place(&mut registry, &teams, TeamId::Blue, PieceKind::Trooper, 2, 2);
        let mut events = Vec::new();

        resolve_melee(&mut registry, &teams, &mut events);

        // floor(2 * 1.0 * 1.0 * 0.9) = 1
        for team in [TeamId::Red, TeamId::Blue] {
            assert_eq!(registry.get(Coord::new(2, 2), team).unwrap().hp, 4);
        }
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_fortify_only_idle() {
        let rules = RuleSet::base();
        let teams = create_teams(&rules);
        let mut registry = PieceRegistry::new();
        place(&mut registry, &teams, TeamId::Red, PieceKind::Trooper, 1, 1);
        place(&mut registry, &teams, TeamId::Blue, PieceKind::Trooper, 3, 3);
        place(&mut registry, &teams, TeamId::Blue, PieceKind::Trooper, 4, 4);
        registry.get_mut(Coord::new(3, 3), TeamId::Blue).unwrap().order = Some(Order::Heal);
        // Moved earlier this turn: the order is gone but the piece is not idle.
        registry.get_mut(Coord::new(4, 4), TeamId::Blue).unwrap().acted = true;

        apply_fortify(&mut registry, &teams);

        assert_eq!(registry.get(Coord::new(1, 1), TeamId::Red).unwrap().modifiers.temp_armor, 2);
        assert_eq!(registry.get(Coord::new(3, 3), TeamId::Blue).unwrap().modifiers.temp_armor, 0);
        assert_eq!(registry.get(Coord::new(4, 4), TeamId::Blue).unwrap().modifiers.temp_armor, 0);
    }

    #[test]
    fn test_lifesteal_heals_attacker() {
        let rules = RuleSet::base();
        let mut teams = create_teams(&rules);
        let red = teams.get_mut(&TeamId::Red).unwrap();
        red.attributes.get_mut(PieceKind::Trooper).flags.lifesteal = true;
        let mut registry = PieceRegistry::new();
        place(&mut registry, &teams, TeamId::Red, PieceKind::Trooper, 2, 2);
        place(&mut registry, &teams, TeamId::Blue, PieceKind::Trooper, 2, 2);
        registry.get_mut(Coord::new(2, 2), TeamId::Red).unwrap().hp = 4;
        registry.get_mut(Coord::new(2, 2), TeamId::Red).unwrap().max_hp = 5;
        let mut events = Vec::new();

        resolve_melee(&mut registry, &teams, &mut events);

        // Red deals floor(2 * 0.8 * 0.9) = 1, takes 1, heals 1.
        let red = registry.get(Coord::new(2, 2), TeamId::Red).unwrap();
        assert_eq!(red.hp, 4);
        assert!(events.iter().any(|e| matches!(e, Notification::PieceHealed { team: TeamId::Red, .. })));
    }

    #[test]
    fn test_ranged_contested_cancels() {
        let rules = RuleSet::base();
        let mut teams = create_teams(&rules);
        let mut registry = PieceRegistry::new();
        place(&mut registry, &teams, TeamId::Red, PieceKind::Archer, 1, 1);
        place(&mut registry, &teams, TeamId::Blue, PieceKind::Trooper, 1, 1);
        place(&mut registry, &teams, TeamId::Blue, PieceKind::Trooper, 1, 3);
        registry.get_mut(Coord::new(1, 1), TeamId::Red).unwrap().order =
            Some(Order::RangedAttack { target: Coord::new(1, 3) });
        let mut events = Vec::new();

        resolve_ranged(&mut registry, &mut teams, &mut events);

        assert!(matches!(
            events.as_slice(),
            [Notification::OrderCanceled { reason: CancelReason::Contested, .. }]
        ));
        assert_eq!(registry.get(Coord::new(1, 3), TeamId::Blue).unwrap().hp, 5);
        assert!(registry.get(Coord::new(1, 1), TeamId::Red).unwrap().is_idle());
    }

    #[test]
    fn test_ranged_hits_every_enemy_on_target() {
        let rules = RuleSet::base();
        let mut teams = create_teams(&rules);
        teams.insert(TeamId::Green, Team::new(TeamId::Green, 0, &rules.attributes));
        let mut registry = PieceRegistry::new();
        place(&mut registry, &teams, TeamId::Red, PieceKind::Archer, 0, 0);
        place(&mut registry, &teams, TeamId::Blue, PieceKind::Archer, 0, 2);
        place(&mut registry, &teams, TeamId::Green, PieceKind::Archer, 0, 2);
        registry.get_mut(Coord::new(0, 0), TeamId::Red).unwrap().order =
            Some(Order::RangedAttack { target: Coord::new(0, 2) });
        let mut events = Vec::new();

        resolve_ranged(&mut registry, &mut teams, &mut events);

        // Archer vs unarmored archer: floor(2 * 1.0 * 1.0 * 1.0) = 2
        assert_eq!(registry.get(Coord::new(0, 2), TeamId::Blue).unwrap().hp, 2);
        assert_eq!(registry.get(Coord::new(0, 2), TeamId::Green).unwrap().hp, 2);
    }

    #[test]
    fn test_three_way_melee_splits_damage() {
        let rules = RuleSet::base();
        let mut teams = create_teams(&rules);
        teams.insert(TeamId::Green, Team::new(TeamId::Green, 0, &rules.attributes));
        for team in teams.values_mut() {
            team.attributes.get_mut(PieceKind::Trooper).attack = 4;
        }
        let mut registry = PieceRegistry::new();
        for team in [TeamId::Red, TeamId::Blue, TeamId::Green] {
            place(&mut registry, &teams, team, PieceKind::Trooper, 2, 2);
        }
        let mut events = Vec::new();

        resolve_melee(&mut registry, &teams, &mut events);

        // Two opponents each: floor(4 / 2 * 0.9) = 1 per strike, 2 in total.
        for team in [TeamId::Red, TeamId::Blue, TeamId::Green] {
            assert_eq!(registry.get(Coord::new(2, 2), team).unwrap().hp, 3, "{team}");
        }
        assert!(events
            .iter()
            .all(|e| matches!(e, Notification::PieceDamaged { amount: 2, .. })));
        assert_eq!(events.len(), 3);
    }

    #[test]
    fn test_catapult_splash_reaches_adjacent_enemy() {
        let rules = RuleSet::base();
        let mut teams = create_teams(&rules);
        let mut registry = PieceRegistry::new();
        place(&mut registry, &teams, TeamId::Red, PieceKind::Catapult, 0, 0);
        place(&mut registry, &teams, TeamId::Blue, PieceKind::Trooper, 0, 3);
        place(&mut registry, &teams, TeamId::Blue, PieceKind::Trooper, 1, 3);
        place(&mut registry, &teams, TeamId::Blue, PieceKind::Trooper, 2, 3);
        place(&mut registry, &teams, TeamId::Red, PieceKind::Trooper, 0, 4);
        registry.get_mut(Coord::new(0, 0), TeamId::Red).unwrap().order =
            Some(Order::RangedAttack { target: Coord::new(0, 3) });
        let mut events = Vec::new();

        resolve_ranged(&mut registry, &mut teams, &mut events);

        // Direct: floor(3 * 0.9) = 2. Splash: round(2 * 0.5) = 1.
        assert_eq!(registry.get(Coord::new(0, 3), TeamId::Blue).unwrap().hp, 3);
        assert_eq!(registry.get(Coord::new(1, 3), TeamId::Blue).unwrap().hp, 4);
        // Two tiles away, and an ally next to the target.
        assert_eq!(registry.get(Coord::new(2, 3), TeamId::Blue).unwrap().hp, 5);
        assert_eq!(registry.get(Coord::new(0, 4), TeamId::Red).unwrap().hp, 5);
    }

    #[test]
    fn test_no_splash_spares_adjacent_enemy() {
        let rules = RuleSet::base();
        let mut teams = create_teams(&rules);
        let mut registry = PieceRegistry::new();
        place(&mut registry, &teams, TeamId::Red, PieceKind::Archer, 0, 0);
        place(&mut registry, &teams, TeamId::Blue, PieceKind::Trooper, 0, 2);
        place(&mut registry, &teams, TeamId::Blue, PieceKind::Trooper, 1, 2);
        registry.get_mut(Coord::new(0, 0), TeamId::Red).unwrap().order =
            Some(Order::RangedAttack { target: Coord::new(0, 2) });
        let mut events = Vec::new();

        resolve_ranged(&mut registry, &mut teams, &mut events);

        // floor(2 * 0.9) = 1 on the target only.
        assert_eq!(registry.get(Coord::new(0, 2), TeamId::Blue).unwrap().hp, 4);
        assert_eq!(registry.get(Coord::new(1, 2), TeamId::Blue).unwrap().hp, 5);
    }

    #[test]
    fn test_armor_piercing_ignores_defense() {
        let rules = RuleSet::base();
        let mut teams = create_teams(&rules);
        teams
            .get_mut(&TeamId::Red)
            .unwrap()
            .attributes
            .get_mut(PieceKind::Archer)
            .flags
            .armor_piercing = true;
        let mut registry = PieceRegistry::new();
        place(&mut registry, &teams, TeamId::Red, PieceKind::Archer, 0, 0);
        place(&mut registry, &teams, TeamId::Blue, PieceKind::Catapult, 0, 2);
        registry.get_mut(Coord::new(0, 2), TeamId::Blue).unwrap().modifiers.temp_armor = 5;
        registry.get_mut(Coord::new(0, 0), TeamId::Red).unwrap().order =
            Some(Order::RangedAttack { target: Coord::new(0, 2) });
        let mut events = Vec::new();

        resolve_ranged(&mut registry, &mut teams, &mut events);

        // Full attack of 2 despite armor 1 plus 5 temporary.
        assert_eq!(registry.get(Coord::new(0, 2), TeamId::Blue).unwrap().hp, 3);
    }

    #[test]
    fn test_splash_rounding() {
        assert_eq!(splash_damage(3, 0.5), 2);
        assert_eq!(splash_damage(5, 0.0), 0);
        assert_eq!(splash_damage(4, 0.25), 1);
    }

    #[test]
    fn test_death_burst_does_not_chain() {
        let rules = RuleSet::base();
        let teams = create_teams(&rules);
        let mut registry = PieceRegistry::new();
        place(&mut registry, &teams, TeamId::Red, PieceKind::Catapult, 2, 2);
        place(&mut registry, &teams, TeamId::Blue, PieceKind::Catapult, 2, 3);
        place(&mut registry, &teams, TeamId::Red, PieceKind::Builder, 2, 4);
        {
            let red = registry.get_mut(Coord::new(2, 2), TeamId::Red).unwrap();
            red.hp = 0;
            red.modifiers.pending_burst = 2;
        }
        registry.get_mut(Coord::new(2, 3), TeamId::Blue).unwrap().hp = 1;
        let mut events = Vec::new();

        reap_dead(&mut registry, &teams, &mut events);

        // The blue catapult dies to the burst but its own burst never fires.
        assert!(registry.get(Coord::new(2, 3), TeamId::Blue).is_none());
        assert_eq!(registry.get(Coord::new(2, 4), TeamId::Red).unwrap().hp, 3);
        let deaths = events
            .iter()
            .filter(|e| matches!(e, Notification::PieceDead { .. }))
            .count();
        assert_eq!(deaths, 2);
    }

    #[test]
    fn test_plunder_moves_resources() {
        let rules = RuleSet::base();
        let mut teams = create_teams(&rules);
        let mut registry = PieceRegistry::new();
        place(&mut registry, &teams, TeamId::Red, PieceKind::Scout, 3, 3);
        place(&mut registry, &teams, TeamId::Blue, PieceKind::Mine, 3, 3);
        let mut events = Vec::new();

        resolve_melee(&mut registry, &teams, &mut events);
        settle_steals(&mut registry, &mut teams, &mut events);

        assert_eq!(teams[&TeamId::Red].resources, 12);
        assert_eq!(teams[&TeamId::Blue].resources, 8);
        assert!(events.iter().any(|e| matches!(
            e,
            Notification::ResourcesStolen { thief: TeamId::Red, victim: TeamId::Blue, amount: 2 }
        )));
    }
}
