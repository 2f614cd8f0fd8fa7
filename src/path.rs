//! Grid search for piece movement and AI planning.
//!
//! - [`find_path`]: weighted best-first search for one piece
//! - [`bfs_from_goal`]: every tile's distance to one goal, per movement type
//! - [`PathCache`]: memoized goal trees, invalidated on terrain changes
//!
//! "No path" is always `None`, never an error.

mod cache;
mod search;

pub use cache::PathCache;
pub use search::{
    bfs_from_goal, find_path, movement_preview, reconstruct, step_along, PathTree,
    ALLY_BUILDING_PENALTY, BLOCKED_PENALTY, FAVORABLE_REWARD, STEP_COST, THREAT_PENALTY,
    UNREACHABLE,
};
