//! Turns confirmed tasks into orders.

use std::collections::BTreeSet;

use tracing::{debug, trace};

use crate::ai::tasks::{best_assignments, confirm, generate_tasks, Task, TaskKind};
use crate::error::OrderError;
use crate::game::{
    build_site_ok, Coord, DamageType, GameState, Notification, Order, Piece, PieceAttributes,
    PieceKind, SubmitOutcome, TeamId,
};
use crate::path::{find_path, movement_preview, step_along, PathCache};

/// Builders a team keeps before training fighters.
const WANTED_BUILDERS: usize = 2;
/// Resources kept back when buying upgrades.
const UPGRADE_RESERVE: u32 = 5;

/// An order the planner wants to place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedOrder {
    /// Tile of the ordered piece.
    pub at: Coord,
    /// The order.
    pub order: Order,
}

/// Computer opponent for one team.
///
/// Each turn it reads the state, generates tasks, assigns the best piece to
/// each, and translates the result into orders. The path cache survives
/// between turns and is invalidated through [`AiPlanner::observe`].
#[derive(Debug, Clone)]
pub struct AiPlanner {
    team: TeamId,
    cache: PathCache,
}

/// Bookkeeping while one plan is assembled.
struct Draft {
    orders: Vec<PlannedOrder>,
    /// Tiles the team will hold after moves and builds.
    claims: BTreeSet<Coord>,
    /// Pieces already given an order.
    busy: BTreeSet<Coord>,
    budget: u32,
}

impl Draft {
    fn push(&mut self, at: Coord, order: Order) {
        self.busy.insert(at);
        self.orders.push(PlannedOrder { at, order });
    }
}

impl AiPlanner {
    /// A planner for `team` with an empty cache.
    #[must_use]
    pub fn new(team: TeamId) -> Self {
        Self {
            team,
            cache: PathCache::new(),
        }
    }

    /// Team this planner plays.
    #[must_use]
    pub const fn team(&self) -> TeamId {
        self.team
    }

    /// Path trees computed so far.
    #[must_use]
    pub const fn cache(&self) -> &PathCache {
        &self.cache
    }

    /// Feed match notifications so terrain changes drop stale paths.
    pub fn observe(&mut self, notifications: &[Notification]) {
        for notification in notifications {
            self.cache.on_notification(notification);
        }
    }

    /// Compute this turn's orders without touching the state.
    pub fn plan(&mut self, state: &GameState) -> Vec<PlannedOrder> {
        let Some(owner) = state.teams.get(&self.team) else {
            return Vec::new();
        };
        let mut draft = Draft {
            orders: Vec::new(),
            claims: state.registry.team_pieces(self.team).map(|p| p.position).collect(),
            busy: BTreeSet::new(),
            budget: owner.resources,
        };

        let tasks = generate_tasks(state, self.team);
        let assignments = best_assignments(state, &mut self.cache, self.team, &tasks);
        let confirmed = confirm(&assignments);
        debug!(team = %self.team, tasks = tasks.len(), confirmed = confirmed.len(), "tasks assigned");

        for assignment in &confirmed {
            let Some(piece) = state.registry.get(assignment.piece, self.team) else {
                continue;
            };
            self.translate(state, piece, &tasks[assignment.task], &mut draft);
        }

        self.opportunistic(state, &mut draft);
        draft.orders
    }

    /// Plan, place the orders and submit.
    ///
    /// Orders the state refuses are skipped. If the submission is rejected
    /// every order is withdrawn and the team submits an idle turn.
    ///
    /// # Errors
    ///
    /// Returns an error if the team cannot submit at all right now.
    pub fn take_turn(&mut self, state: &mut GameState) -> Result<SubmitOutcome, OrderError> {
        let planned = self.plan(state);
        for PlannedOrder { at, order } in planned {
            if let Err(e) = state.set_order(self.team, at, order) {
                debug!(team = %self.team, %at, error = %e, "planned order refused");
            }
        }

        let outcome = state.submit_turn(self.team)?;
        let rejected = matches!(&outcome, SubmitOutcome::Rejected(teams) if teams.contains(&self.team));
        if !rejected {
            return Ok(outcome);
        }

        debug!(team = %self.team, "orders rejected, submitting idle turn");
        let positions: Vec<Coord> = state.registry.team_pieces(self.team).map(|p| p.position).collect();
        for at in positions {
            state.clear_order(self.team, at)?;
        }
        state.submit_turn(self.team)
    }

    fn translate(&self, state: &GameState, piece: &Piece, task: &Task, draft: &mut Draft) {
        let Some(attrs) = state.attrs_of(piece) else {
            return;
        };
        let Some(target) = task.target else {
            return;
        };

        match task.kind {
            TaskKind::Harvest | TaskKind::Construct(_) => {
                let kind = match task.kind {
                    TaskKind::Construct(kind) => kind,
                    _ => PieceKind::Mine,
                };
                let price = state.teams.get(&self.team).map_or(u32::MAX, |t| t.attrs(kind).price);
                if piece.position.is_adjacent(target) {
                    if price <= draft.budget && !draft.claims.contains(&target) {
                        draft.budget -= price;
                        draft.claims.insert(target);
                        draft.push(piece.position, Order::Build { dest: target, kind });
                    }
                    return;
                }
                let goal = state
                    .map
                    .neighbors(target)
                    .filter(|tile| state.map.is_passable(*tile, attrs.movement))
                    .min_by_key(|tile| (piece.position.distance(*tile), *tile));
                if let Some(goal) = goal {
                    self.move_toward(state, piece, attrs, goal, draft);
                }
            }
            TaskKind::Attack => {
                if self.try_fire(state, piece, attrs, target, draft) {
                    return;
                }
                self.move_toward(state, piece, attrs, target, draft);
            }
        }
    }

    fn try_fire(&self, state: &GameState, piece: &Piece, attrs: &PieceAttributes, target: Coord, draft: &mut Draft) -> bool {
        if attrs.damage_type != DamageType::Ranged || state.registry.has_enemy_at(piece.position, self.team) {
            return false;
        }
        let distance = piece.position.distance(target);
        if distance < attrs.min_range || distance > attrs.max_range {
            return false;
        }
        draft.push(piece.position, Order::RangedAttack { target });
        true
    }

    fn move_toward(&self, state: &GameState, piece: &Piece, attrs: &PieceAttributes, goal: Coord, draft: &mut Draft) {
        let mut blocked = draft.claims.clone();
        blocked.remove(&piece.position);
        let Some(path) = find_path(&state.map, &state.registry, &state.teams, piece, goal, &blocked) else {
            trace!(team = %self.team, from = %piece.position, %goal, "no path");
            return;
        };
        let Some(dest) = step_along(&state.map, &state.registry, &path, attrs, self.team) else {
            return;
        };
        if draft.claims.contains(&dest) || !movement_preview(&state.map, &state.registry, piece, attrs).contains(&dest) {
            return;
        }
        draft.claims.remove(&piece.position);
        draft.claims.insert(dest);
        draft.push(piece.position, Order::Move { dest });
    }

    /// Production, upgrades, idle ranged fire and healing.
    fn opportunistic(&self, state: &GameState, draft: &mut Draft) {
        let Some(owner) = state.teams.get(&self.team) else {
            return;
        };
        let builders = state
            .registry
            .team_pieces(self.team)
            .filter(|p| p.kind == PieceKind::Builder)
            .count();
        let mut upgraded = false;

        for piece in state.registry.team_pieces(self.team) {
            if draft.busy.contains(&piece.position) {
                continue;
            }
            let attrs = owner.attrs(piece.kind);

            if attrs.damage_type == DamageType::Ranged {
                if let Some(target) = nearest_enemy_in_range(state, piece, attrs) {
                    if self.try_fire(state, piece, attrs, target, draft) {
                        continue;
                    }
                }
            }

            if attrs.flags.heal > 0 {
                let injured = piece
                    .position
                    .around()
                    .filter_map(|tile| state.registry.get(tile, self.team))
                    .any(|ally| ally.hp < ally.max_hp);
                if injured {
                    draft.push(piece.position, Order::Heal);
                    continue;
                }
            }

            if !attrs.is_structure() {
                continue;
            }

            if let Some(kind) = self.pick_recruit(state, attrs, builders, draft.budget) {
                let site = state.map.neighbors(piece.position).find(|tile| {
                    !draft.claims.contains(tile)
                        && !state.registry.is_occupied(*tile)
                        && build_site_ok(&state.map, kind, owner.attrs(kind), *tile)
                });
                if let Some(dest) = site {
                    draft.budget -= owner.attrs(kind).price;
                    draft.claims.insert(dest);
                    draft.push(piece.position, Order::Build { dest, kind });
                    continue;
                }
            }

            if upgraded {
                continue;
            }
            let affordable = attrs.upgrades.iter().copied().find(|upgrade| {
                state
                    .rules
                    .upgrade_price(*upgrade)
                    .is_some_and(|price| price + UPGRADE_RESERVE <= draft.budget)
            });
            if let Some(upgrade) = affordable {
                draft.budget -= state.rules.upgrade_price(upgrade).unwrap_or(0);
                upgraded = true;
                draft.push(piece.position, Order::Upgrade { upgrade });
            }
        }
    }

    /// Unit a building should train this turn, if any.
    fn pick_recruit(&self, state: &GameState, attrs: &PieceAttributes, builders: usize, budget: u32) -> Option<PieceKind> {
        let owner = state.teams.get(&self.team)?;
        let affordable: Vec<PieceKind> = attrs
            .buildable
            .iter()
            .copied()
            .filter(|kind| {
                let unit = owner.attrs(*kind);
                !unit.is_structure() && unit.price <= budget
            })
            .collect();

        if builders < WANTED_BUILDERS && affordable.contains(&PieceKind::Builder) {
            return Some(PieceKind::Builder);
        }
        let fighters: Vec<PieceKind> = affordable
            .into_iter()
            .filter(|kind| *kind != PieceKind::Builder)
            .collect();
        if fighters.is_empty() {
            return None;
        }
        let turn = usize::try_from(state.turn()).unwrap_or(0);
        Some(fighters[turn % fighters.len()])
    }
}

/// Closest enemy tile `piece` can fire at from where it stands.
fn nearest_enemy_in_range(state: &GameState, piece: &Piece, attrs: &PieceAttributes) -> Option<Coord> {
    state
        .registry
        .iter()
        .filter(|other| other.team != piece.team)
        .map(|other| other.position)
        .filter(|tile| (attrs.min_range..=attrs.max_range).contains(&piece.position.distance(*tile)))
        .min_by_key(|tile| (piece.position.distance(*tile), *tile))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{check_invariants, Map, Phase, RuleSet, TileKind};

    fn create_test_game() -> GameState {
        let mut map = Map::new(10, 10).unwrap();
        map.set(Coord::new(4, 1), TileKind::Resource);
        let mut state = GameState::new(map, RuleSet::base(), &[TeamId::Red, TeamId::Blue], 10);
        state.spawn(TeamId::Red, PieceKind::Base, Coord::new(1, 1));
        state.spawn(TeamId::Red, PieceKind::Builder, Coord::new(2, 1));
        state.spawn(TeamId::Red, PieceKind::Trooper, Coord::new(1, 2));
        state.spawn(TeamId::Blue, PieceKind::Base, Coord::new(8, 8));
        state.spawn(TeamId::Blue, PieceKind::Builder, Coord::new(7, 8));
        state.spawn(TeamId::Blue, PieceKind::Trooper, Coord::new(8, 7));
        state.advance().unwrap();
        state
    }

    #[test]
    fn test_plan_moves_builder_toward_deposit() {
        let state = create_test_game();
        let mut planner = AiPlanner::new(TeamId::Red);
        let orders = planner.plan(&state);

        let builder = orders.iter().find(|o| o.at == Coord::new(2, 1)).unwrap();
        assert_eq!(builder.order, Order::Move { dest: Coord::new(3, 1) });
    }

    #[test]
    fn test_plan_builds_mine_when_adjacent() {
        let mut state = create_test_game();
        let builder = state.registry.remove(Coord::new(2, 1), TeamId::Red).unwrap();
        state.registry.register(Piece {
            position: Coord::new(3, 1),
            ..builder
        });
        let mut planner = AiPlanner::new(TeamId::Red);
        let orders = planner.plan(&state);

        assert!(orders.contains(&PlannedOrder {
            at: Coord::new(3, 1),
            order: Order::Build {
                dest: Coord::new(4, 1),
                kind: PieceKind::Mine,
            },
        }));
    }

    #[test]
    fn test_plan_never_double_claims() {
        let state = create_test_game();
        let mut planner = AiPlanner::new(TeamId::Red);
        let orders = planner.plan(&state);

        let mut dests = BTreeSet::new();
        for planned in &orders {
            if let Order::Move { dest } | Order::Build { dest, .. } = planned.order {
                assert!(dests.insert(dest), "{dest} claimed twice");
            }
        }
        let mut pieces = BTreeSet::new();
        assert!(orders.iter().all(|o| pieces.insert(o.at)));
    }

    #[test]
    fn test_take_turn_submits() {
        let mut state = create_test_game();
        let mut red = AiPlanner::new(TeamId::Red);
        let mut blue = AiPlanner::new(TeamId::Blue);

        assert_eq!(red.take_turn(&mut state).unwrap(), SubmitOutcome::Waiting);
        assert_eq!(blue.take_turn(&mut state).unwrap(), SubmitOutcome::Accepted);
        assert_ne!(state.phase(), Phase::Orders);
        assert!(check_invariants(&state).is_empty());
    }

    #[test]
    fn test_ai_match_progresses() {
        let mut state = create_test_game();
        let mut planners = [AiPlanner::new(TeamId::Red), AiPlanner::new(TeamId::Blue)];

        for _ in 0..30 {
            if state.is_game_over() {
                break;
            }
            for planner in &mut planners {
                if state.controller().active_teams().any(|t| t == planner.team()) {
                    planner.take_turn(&mut state).unwrap();
                }
            }
            state.run_until_orders().unwrap();
            let events = state.drain_notifications();
            for planner in &mut planners {
                planner.observe(&events);
            }
            assert!(check_invariants(&state).is_empty());
        }
        assert!(state.turn() > 1);
    }
}
