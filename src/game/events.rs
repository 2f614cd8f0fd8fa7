//! Notifications produced by the simulation.
//!
//! Every state change the outside world may care about (effects, network,
//! AI caches, logs) is reported as a [`Notification`]. The simulation context
//! queues them in order; consumers drain the queue after each call.

use serde::{Deserialize, Serialize};

use crate::game::{Coord, Order, Phase, PieceKind, TeamId, TileKind, UpgradeKind};

/// One piece's slot in a turn submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderEntry {
    /// Piece column.
    pub gx: u16,
    /// Piece row.
    pub gy: u16,
    /// The piece's order, or `None` when it stays idle.
    pub order: Option<Order>,
}

impl OrderEntry {
    /// Coordinate of the piece.
    #[must_use]
    pub const fn coord(&self) -> Coord {
        Coord::new(self.gx, self.gy)
    }
}

/// Why an order was dropped without executing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CancelReason {
    /// An enemy shares the piece's tile or holds the target tile.
    Contested,
    /// The target tile can no longer host the result.
    InvalidSite,
    /// The upgrade was already owned.
    AlreadyOwned,
    /// The team could not pay.
    Unaffordable,
}

/// What changed a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TerrainCause {
    /// A deposit was built over by a mine.
    Mined,
    /// A builder raised or lowered the tile.
    Terraformed,
}

/// A named event with a fixed field set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Notification {
    /// Transient per-turn state was cleared.
    Cleanup,
    /// A phase finished (sent only when leaving ORDERS).
    PhaseEnded {
        /// Phase left.
        phase: Phase,
    },
    /// The phase enum advanced.
    PhaseChanged {
        /// Previous phase.
        from: Phase,
        /// New phase.
        to: Phase,
    },
    /// A phase began.
    PhaseStarted {
        /// New phase.
        phase: Phase,
        /// Current turn.
        turn_number: u32,
    },
    /// A team submitted its orders.
    TurnSubmitted {
        /// Submitting team.
        team: TeamId,
        /// Order of every piece of the team.
        orders: Vec<OrderEntry>,
    },
    /// A team withdrew its submission.
    TurnRevised {
        /// Revising team.
        team: TeamId,
    },
    /// Every active team has submitted.
    AllTurnsSubmitted,
    /// Two orders of one team claim the same tile.
    InvalidMoveOrders {
        /// Offending team.
        team: TeamId,
        /// Tiles claimed more than once.
        invalid_coordinates: Vec<Coord>,
    },
    /// A team's build and upgrade orders cost more than it has.
    InvalidBuildOrders {
        /// Offending team.
        team: TeamId,
        /// Total requested spend.
        spent_resources: u32,
    },
    /// The same upgrade was ordered twice.
    InvalidUpgradeOrders {
        /// Offending team.
        team: TeamId,
        /// Upgrades requested more than once.
        duplicate_upgrades: Vec<UpgradeKind>,
    },
    /// A new piece was placed.
    PieceBuilt {
        /// Column of the new piece.
        tx: u16,
        /// Row of the new piece.
        ty: u16,
        /// Owner.
        team: TeamId,
        /// Kind built.
        new_piece_kind: PieceKind,
    },
    /// A piece changed tile.
    PieceMoved {
        /// Owner.
        team: TeamId,
        /// Origin.
        from: Coord,
        /// Destination.
        to: Coord,
    },
    /// A piece lost HP.
    PieceDamaged {
        /// Column.
        gx: u16,
        /// Row.
        gy: u16,
        /// Owner.
        team: TeamId,
        /// HP lost.
        amount: u32,
        /// HP remaining.
        hp: u32,
    },
    /// A piece regained HP.
    PieceHealed {
        /// Column.
        gx: u16,
        /// Row.
        gy: u16,
        /// Owner.
        team: TeamId,
        /// HP gained.
        amount: u32,
    },
    /// A piece died.
    PieceDead {
        /// Column.
        gx: u16,
        /// Row.
        gy: u16,
        /// Owner.
        team: TeamId,
    },
    /// A building was torn down by its owner.
    PieceDemolished {
        /// Column.
        gx: u16,
        /// Row.
        gy: u16,
        /// Owner.
        team: TeamId,
    },
    /// A ranged attack was fired.
    UnitRangedAttack {
        /// Attacker column.
        gx: u16,
        /// Attacker row.
        gy: u16,
        /// Attacker's team.
        team: TeamId,
        /// Target column.
        tx: u16,
        /// Target row.
        ty: u16,
    },
    /// An order was dropped instead of executing.
    OrderCanceled {
        /// Column.
        gx: u16,
        /// Row.
        gy: u16,
        /// Owner.
        team: TeamId,
        /// Why.
        reason: CancelReason,
    },
    /// An upgrade was purchased.
    UpgradePurchased {
        /// Purchasing team.
        team: TeamId,
        /// Upgrade bought.
        upgrade: UpgradeKind,
        /// Upgrades that became purchasable.
        unlocked: Vec<UpgradeKind>,
    },
    /// Start-of-turn income was paid.
    ResourcesProduced {
        /// Team paid.
        team: TeamId,
        /// Amount credited after clamping.
        amount: u32,
        /// New balance.
        balance: u32,
    },
    /// Plunder moved resources between teams.
    ResourcesStolen {
        /// Receiving team.
        thief: TeamId,
        /// Robbed team.
        victim: TeamId,
        /// Amount moved.
        amount: u32,
    },
    /// A tile changed kind.
    TileChanged {
        /// Column.
        x: u16,
        /// Row.
        y: u16,
        /// Old kind.
        from: TileKind,
        /// New kind.
        to: TileKind,
        /// What changed it.
        cause: TerrainCause,
    },
    /// A team lost its last piece.
    TeamEliminated {
        /// Eliminated team.
        team: TeamId,
    },
    /// At most one team remains.
    GameOver {
        /// Surviving team, if any.
        winner: Option<TeamId>,
    },
}

impl Notification {
    /// Whether this notification changes terrain passability.
    #[must_use]
    pub const fn is_terrain_mutation(&self) -> bool {
        matches!(self, Self::TileChanged { .. })
    }
}
