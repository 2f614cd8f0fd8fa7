//! Errors raised when a caller hands the simulation an order it cannot accept.
//!
//! These are immediate rejections at the `set_order` entry point. Conflicts
//! that only show up across a whole team (collisions, overspending) are not
//! errors; they are reported through notifications when the ORDERS phase tries
//! to end.

use std::fmt;

use crate::game::{Coord, Phase, PieceKind, TeamId, UpgradeKind};

/// Why an order was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderError {
    /// Orders are only accepted during ORDERS.
    WrongPhase(Phase),
    /// The team is not playing or has been eliminated.
    InactiveTeam(TeamId),
    /// The team already submitted; it must revise first.
    AlreadySubmitted(TeamId),
    /// No piece of the team stands on the tile.
    NoPiece {
        /// Tile looked up.
        coord: Coord,
        /// Team looked up.
        team: TeamId,
    },
    /// The piece kind cannot carry this kind of order.
    NotCapable {
        /// Piece kind.
        kind: PieceKind,
        /// Order name.
        order: &'static str,
    },
    /// The destination is outside the piece's movement preview.
    Unreachable(Coord),
    /// The target is outside the piece's attack range.
    OutOfRange(Coord),
    /// The destination must be adjacent to the piece.
    NotAdjacent(Coord),
    /// The destination cannot hold the result (terrain, occupancy or bounds).
    InvalidSite(Coord),
    /// The piece kind cannot build this kind.
    NotBuildable(PieceKind),
    /// The piece kind does not currently offer this upgrade.
    NotPurchasable(UpgradeKind),
}

impl fmt::Display for OrderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongPhase(phase) => write!(f, "orders are not accepted during {phase}"),
            Self::InactiveTeam(team) => write!(f, "team {team} is not active"),
            Self::AlreadySubmitted(team) => write!(f, "team {team} already submitted its turn"),
            Self::NoPiece { coord, team } => write!(f, "no {team} piece at {coord}"),
            Self::NotCapable { kind, order } => write!(f, "{kind} cannot {order}"),
            Self::Unreachable(coord) => write!(f, "{coord} is not reachable this turn"),
            Self::OutOfRange(coord) => write!(f, "{coord} is out of range"),
            Self::NotAdjacent(coord) => write!(f, "{coord} is not adjacent"),
            Self::InvalidSite(coord) => write!(f, "{coord} cannot be used"),
            Self::NotBuildable(kind) => write!(f, "{kind} cannot be built here"),
            Self::NotPurchasable(upgrade) => write!(f, "{upgrade} is not offered"),
        }
    }
}

impl std::error::Error for OrderError {}
