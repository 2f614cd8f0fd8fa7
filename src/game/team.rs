//! Team identity and per-team state.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::game::{AttributeTable, PieceAttributes, PieceKind, UpgradeKind};

/// Identifier of a team. A match holds up to four.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TeamId {
    /// First team.
    Red,
    /// Second team.
    Blue,
    /// Third team.
    Green,
    /// Fourth team.
    Yellow,
}

impl TeamId {
    /// All teams, in seating order.
    pub const ALL: [TeamId; 4] = [TeamId::Red, TeamId::Blue, TeamId::Green, TeamId::Yellow];

    /// Name used in save files.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Red => "RED",
            Self::Blue => "BLUE",
            Self::Green => "GREEN",
            Self::Yellow => "YELLOW",
        }
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TeamId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|team| team.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown team: {s}"))
    }
}

/// State for a single team.
#[derive(Debug, Clone, PartialEq)]
pub struct Team {
    /// Unique identifier for this team.
    pub id: TeamId,
    /// Resource pool, kept within `[0, MAX_RESOURCES]` by the economy.
    pub resources: u32,
    /// Upgrades purchased so far, in purchase order.
    pub owned: Vec<UpgradeKind>,
    /// This team's copy of the attribute table.
    pub attributes: AttributeTable,
    /// Whether the team has lost all its pieces.
    pub eliminated: bool,
}

impl Team {
    /// Create a team with a private copy of `attributes`.
    #[must_use]
    pub fn new(id: TeamId, resources: u32, attributes: &AttributeTable) -> Self {
        Self {
            id,
            resources,
            owned: Vec::new(),
            attributes: attributes.clone(),
            eliminated: false,
        }
    }

    /// Attributes of `kind` for this team.
    #[must_use]
    pub fn attrs(&self, kind: PieceKind) -> &PieceAttributes {
        self.attributes.get(kind)
    }

    /// Whether the team already owns `upgrade`.
    #[must_use]
    pub fn owns(&self, upgrade: UpgradeKind) -> bool {
        self.owned.contains(&upgrade)
    }

    /// Eliminate this team.
    pub fn eliminate(&mut self) {
        self.eliminated = true;
    }
}

/// All teams of a match, keyed for deterministic iteration.
pub type Teams = BTreeMap<TeamId, Team>;
