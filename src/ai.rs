//! Computer opponents.
//!
//! The planner works in three steps: generate tasks from the current state,
//! give each task its closest capable piece and confirm the cheapest pairs
//! greedily, then translate confirmed tasks into orders. Buildings train
//! units and buy upgrades with whatever budget is left.

mod planner;
mod tasks;

pub use planner::{AiPlanner, PlannedOrder};
pub use tasks::{best_assignments, confirm, generate_tasks, is_eligible, score, Assignment, Task, TaskKind};
