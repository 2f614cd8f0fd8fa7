// Allow unwrap in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]
//! Phalanx: a deterministic simultaneous-turn battle simulation engine.
//!
//! Every team issues one order per piece, submits, and all orders resolve
//! together through a fixed phase cycle:
//!
//! ```text
//! START_TURN -> ORDERS -> BUILD -> MOVE -> MELEE -> RANGED -> SPECIAL -> START_TURN
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │   Match Runner / CLI / Net / Save   │
//! ├─────────────────────────────────────┤
//! │   AI Planner        Path Cache      │
//! ├─────────────────────────────────────┤
//! │   Game State (phases, combat, ...)  │
//! └─────────────────────────────────────┘
//! ```

pub mod ai;
pub mod error;
pub mod game;
pub mod net;
pub mod path;
pub mod save;
pub mod tournament;

pub use error::OrderError;

// Re-export key game types at crate root for convenience
pub use ai::AiPlanner;
pub use game::{
    Coord, GameState, Map, MovementType, Notification, Order, Phase, PieceKind, RuleSet, SubmitOutcome, TeamId,
    TileKind,
};
pub use path::PathCache;
