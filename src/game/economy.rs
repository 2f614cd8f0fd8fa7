//! Resource ledger and upgrade purchases.
//!
//! Every team's pool stays within `[0, MAX_RESOURCES]`: additions clamp at the
//! cap and deductions never go below zero. Purchasing an upgrade is a single
//! four-step transaction on the team's attribute table; once the build phase
//! accepts an upgrade order the purchase runs to completion.

use tracing::debug;

use crate::game::events::{CancelReason, Notification};
use crate::game::{
    AttributeValue, Effect, PieceKind, PieceRegistry, RuleSet, Stat, Team, TeamId, Teams,
    UpgradeKind,
};

/// Upper bound of any team's resource pool.
pub const MAX_RESOURCES: u32 = 999;

/// Credit `amount` to `team`, clamped at [`MAX_RESOURCES`].
///
/// Returns the amount actually credited.
pub fn add_resources(team: &mut Team, amount: u32) -> u32 {
    let before = team.resources;
    team.resources = team.resources.saturating_add(amount).min(MAX_RESOURCES);
    team.resources - before
}

/// Debit `amount` from `team`, never going below zero.
///
/// Returns the amount actually debited.
pub fn deduct_resources(team: &mut Team, amount: u32) -> u32 {
    let taken = amount.min(team.resources);
    team.resources -= taken;
    taken
}

/// Move up to `amount` from `victim` to `thief`.
///
/// The thief receives no more than the victim actually lost and no more than
/// its own cap allows; anything above the cap is destroyed. Returns the amount
/// taken from the victim.
pub fn transfer(teams: &mut Teams, victim: TeamId, thief: TeamId, amount: u32) -> u32 {
    if victim == thief {
        return 0;
    }
    let taken = teams
        .get_mut(&victim)
        .map_or(0, |team| deduct_resources(team, amount));
    if let Some(team) = teams.get_mut(&thief) {
        add_resources(team, taken);
    }
    taken
}

/// Pay start-of-turn income: every piece adds its kind's income to its team.
pub fn produce_income(registry: &PieceRegistry, teams: &mut Teams, events: &mut Vec<Notification>) {
    for team in teams.values_mut().filter(|team| !team.eliminated) {
        let gross: u32 = registry
            .team_pieces(team.id)
            .map(|piece| team.attrs(piece.kind).income)
            .sum();
        if gross == 0 {
            continue;
        }
        let amount = add_resources(team, gross);
        debug!(team = %team.id, amount, balance = team.resources, "income produced");
        events.push(Notification::ResourcesProduced {
            team: team.id,
            amount,
            balance: team.resources,
        });
    }
}

/// The piece kind whose purchasable list currently holds `upgrade`.
#[must_use]
pub fn seller_of(team: &Team, upgrade: UpgradeKind) -> Option<PieceKind> {
    team.attributes
        .iter()
        .find(|(_, attrs)| attrs.upgrades.contains(&upgrade))
        .map(|(kind, _)| kind)
}

/// Apply the four purchase steps to `team`'s attribute table.
///
/// Does not charge the team or touch existing pieces; [`purchase_upgrade`]
/// does both. Save loading calls this directly to rebuild a team's table from
/// its owned list. Returns the upgrades newly made purchasable.
pub fn apply_upgrade(
    team: &mut Team,
    rules: &RuleSet,
    seller: PieceKind,
    upgrade: UpgradeKind,
) -> Vec<UpgradeKind> {
    team.owned.push(upgrade);

    if let Some(def) = rules.upgrade(upgrade) {
        apply_effect(team, &def.effect);
    }

    let unlocked: Vec<UpgradeKind> = rules
        .upgrades
        .iter()
        .filter(|def| def.requires.contains(&upgrade))
        .filter(|def| !team.owns(def.kind))
        .filter(|def| def.requires.iter().all(|req| team.owns(*req)))
        .map(|def| def.kind)
        .collect();

    let purchasable = &mut team.attributes.get_mut(seller).upgrades;
    for kind in &unlocked {
        if !purchasable.contains(kind) {
            purchasable.push(*kind);
        }
    }
    purchasable.retain(|kind| *kind != upgrade);

    unlocked
}

fn apply_effect(team: &mut Team, effect: &Effect) {
    match *effect {
        Effect::StatBonus { kind, stat, amount } => {
            let attrs = team.attributes.get_mut(kind);
            let field = match stat {
                Stat::MaxHp => &mut attrs.max_hp,
                Stat::Attack => &mut attrs.attack,
                Stat::Armor => &mut attrs.armor,
                Stat::MoveRange => &mut attrs.move_range,
                Stat::MaxRange => &mut attrs.max_range,
            };
            *field = field.saturating_add(amount);
        }
        Effect::SetAttribute { kind, value } => {
            let attrs = team.attributes.get_mut(kind);
            match value {
                AttributeValue::ArmorPiercing(on) => attrs.flags.armor_piercing = on,
                AttributeValue::Lifesteal(on) => attrs.flags.lifesteal = on,
                AttributeValue::Splash(m) => attrs.flags.splash = m,
                AttributeValue::Movement(movement) => attrs.movement = movement,
            }
        }
        Effect::SetMultiplier {
            kind,
            against,
            value,
        } => {
            team.attributes
                .get_mut(kind)
                .multipliers
                .insert(against, value);
        }
        Effect::UnlockBuild { builder, unlocks } => {
            let buildable = &mut team.attributes.get_mut(builder).buildable;
            if !buildable.contains(&unlocks) {
                buildable.push(unlocks);
            }
        }
    }
}

/// Purchase `upgrade` for `team` through a piece of kind `seller`.
///
/// Charges the price, applies the upgrade and heals existing pieces when a
/// max-HP bonus is bought. Returns the newly unlocked upgrades.
///
/// # Errors
///
/// Returns the cancellation reason when the upgrade is already owned, not
/// offered by `seller`, missing from the catalogue, or unaffordable.
pub fn purchase_upgrade(
    team: &mut Team,
    rules: &RuleSet,
    registry: &mut PieceRegistry,
    seller: PieceKind,
    upgrade: UpgradeKind,
) -> Result<Vec<UpgradeKind>, CancelReason> {
    if team.owns(upgrade) {
        return Err(CancelReason::AlreadyOwned);
    }
    if !team.attrs(seller).upgrades.contains(&upgrade) {
        return Err(CancelReason::InvalidSite);
    }
    let def = rules.upgrade(upgrade).ok_or(CancelReason::InvalidSite)?;
    if def.price > team.resources {
        return Err(CancelReason::Unaffordable);
    }
    deduct_resources(team, def.price);

    let unlocked = apply_upgrade(team, rules, seller, upgrade);

    if let Effect::StatBonus {
        kind,
        stat: Stat::MaxHp,
        amount,
    } = def.effect
    {
        for piece in registry
            .iter_mut()
            .filter(|p| p.team == team.id && p.kind == kind)
        {
            piece.max_hp = piece.max_hp.saturating_add(amount);
            piece.heal(amount);
        }
    }

    debug!(team = %team.id, %upgrade, ?unlocked, balance = team.resources, "upgrade purchased");
    Ok(unlocked)
}
