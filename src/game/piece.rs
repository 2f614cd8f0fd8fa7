//! Pieces and the orders attached to them.

use serde::{Deserialize, Serialize};

use crate::game::{Coord, PieceAttributes, PieceKind, TeamId, UpgradeKind};

/// A team's declared intent for one piece this turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Order {
    /// Move to `dest`.
    Move {
        /// Destination tile.
        dest: Coord,
    },
    /// Fire at every enemy on `target`.
    RangedAttack {
        /// Target tile.
        target: Coord,
    },
    /// Build a new piece on an adjacent tile.
    Build {
        /// Tile the new piece appears on.
        dest: Coord,
        /// Kind of the new piece.
        kind: PieceKind,
    },
    /// Purchase an upgrade.
    Upgrade {
        /// Upgrade purchased.
        upgrade: UpgradeKind,
    },
    /// Raise or lower an adjacent tile.
    Terraform {
        /// Tile changed.
        dest: Coord,
        /// Raise (`true`) or lower (`false`).
        raising: bool,
    },
    /// Tear down this building.
    Demolish,
    /// Heal adjacent allies.
    Heal,
}

impl Order {
    /// Short name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Move { .. } => "move",
            Self::RangedAttack { .. } => "ranged_attack",
            Self::Build { .. } => "build",
            Self::Upgrade { .. } => "upgrade",
            Self::Terraform { .. } => "terraform",
            Self::Demolish => "demolish",
            Self::Heal => "heal",
        }
    }
}

/// Resources to be taken from this piece's owner at the end of combat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Steal {
    /// Team receiving the resources.
    pub thief: TeamId,
    /// Amount taken.
    pub amount: u32,
}

/// Transient combat state, wiped by every cleanup notification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Modifiers {
    /// Armor added on top of the innate value.
    pub temp_armor: u32,
    /// Damage dealt around this piece once it is removed as dead.
    pub pending_burst: u32,
    /// Outstanding resource steals against this piece's team.
    pub steals: Vec<Steal>,
}

impl Modifiers {
    /// Reset to the neutral state.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// A unit or building on the map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    /// Owning team.
    pub team: TeamId,
    /// Kind, also the key into the team's attribute table.
    pub kind: PieceKind,
    /// Current tile. Always equals the registry key the piece is stored under.
    pub position: Coord,
    /// Current hit points.
    pub hp: u32,
    /// Maximum hit points.
    pub max_hp: u32,
    /// Pending order, if any.
    pub order: Option<Order>,
    /// Set once an order of this piece was carried out this turn.
    pub acted: bool,
    /// Transient combat state.
    pub modifiers: Modifiers,
}

impl Piece {
    /// Create a piece at full health.
    #[must_use]
    pub fn new(team: TeamId, kind: PieceKind, position: Coord, attrs: &PieceAttributes) -> Self {
        Self {
            team,
            kind,
            position,
            hp: attrs.max_hp,
            max_hp: attrs.max_hp,
            order: None,
            acted: false,
            modifiers: Modifiers::default(),
        }
    }

    /// Fraction of health remaining, in `[0, 1]`.
    #[must_use]
    pub fn hp_ratio(&self) -> f64 {
        if self.max_hp == 0 {
            return 0.0;
        }
        f64::from(self.hp) / f64::from(self.max_hp)
    }

    /// Whether the piece still stands.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.hp > 0
    }

    /// Whether the piece neither holds nor already carried out an order this turn.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        self.order.is_none() && !self.acted
    }

    /// Apply damage, returning the HP actually lost.
    pub fn take_damage(&mut self, amount: u32) -> u32 {
        let lost = amount.min(self.hp);
        self.hp -= lost;
        lost
    }

    /// Restore HP up to the maximum, returning the HP actually gained.
    pub fn heal(&mut self, amount: u32) -> u32 {
        let gained = amount.min(self.max_hp.saturating_sub(self.hp));
        self.hp += gained;
        gained
    }
}
