//! Game layer for Phalanx.
//!
//! Implements the simultaneous-turn rules:
//! - Map with terrain and movement-type passability
//! - Pieces, per-team attribute tables and the upgrade catalogue
//! - Spatial registry of pieces
//! - Order validation, combat and the resource ledger
//! - The phase state machine and the simulation context

mod combat;
mod economy;
pub mod events;
mod invariants;
mod map;
mod phase;
mod piece;
mod registry;
mod rules;
mod state;
mod team;
mod validator;

pub use combat::{
    apply_fortify, damage_formula, defense_against, reap_dead, resolve_melee, resolve_ranged,
    settle_steals, splash_damage,
};
pub use economy::{
    add_resources, apply_upgrade, deduct_resources, produce_income, purchase_upgrade, seller_of,
    transfer, MAX_RESOURCES,
};
pub use events::{CancelReason, Notification, OrderEntry, TerrainCause};
pub use invariants::{assert_invariants, check_invariants, InvariantViolation};
pub use map::{Coord, Map, MovementType, TileKind};
pub use phase::{AdvanceBlocked, Phase, Transition, TurnController};
pub use piece::{Modifiers, Order, Piece, Steal};
pub use registry::{PieceFilter, PieceRegistry};
pub use rules::{
    Archetype, AttributeTable, AttributeValue, DamageType, Effect, PieceAttributes, PieceKind,
    RuleSet, RulesError, Specialties, Stat, UpgradeDef, UpgradeKind,
};
pub use state::{build_site_ok, GameState, SubmitOutcome};
pub use team::{Team, TeamId, Teams};
pub use validator::{claimed_tiles, order_cost, validate_team};
