//! Task generation and scoring for the AI planner.

use std::collections::BTreeSet;

use crate::game::{
    build_site_ok, Coord, DamageType, GameState, Piece, PieceAttributes, PieceKind, TeamId,
    TileKind,
};
use crate::path::{PathCache, UNREACHABLE};

/// What a task asks a piece to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TaskKind {
    /// Put a mine on the target deposit.
    Harvest,
    /// Engage the enemy on the target tile.
    Attack,
    /// Put a building of this kind on the target tile.
    Construct(PieceKind),
}

/// One unit of work for a team.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Task {
    /// Team the task belongs to.
    pub team: TeamId,
    /// What to do.
    pub kind: TaskKind,
    /// Where to do it.
    pub target: Option<Coord>,
}

/// A candidate piece for a task. Lower scores are better.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assignment {
    /// Tile of the assigned piece.
    pub piece: Coord,
    /// Index into the task list.
    pub task: usize,
    /// Path length to an acceptable destination.
    pub score: u32,
}

/// Build the task list for `team`.
#[must_use]
pub fn generate_tasks(state: &GameState, team: TeamId) -> Vec<Task> {
    let mut tasks = Vec::new();

    for (coord, tile) in state.map.iter() {
        if tile == TileKind::Resource && !state.registry.is_occupied(coord) {
            tasks.push(Task {
                team,
                kind: TaskKind::Harvest,
                target: Some(coord),
            });
        }
    }

    let enemy_tiles: BTreeSet<Coord> = state
        .registry
        .iter()
        .filter(|p| p.team != team)
        .map(|p| p.position)
        .collect();
    tasks.extend(enemy_tiles.into_iter().map(|coord| Task {
        team,
        kind: TaskKind::Attack,
        target: Some(coord),
    }));

    if let Some(site) = barracks_site(state, team) {
        tasks.push(Task {
            team,
            kind: TaskKind::Construct(PieceKind::Barracks),
            target: Some(site),
        });
    }

    tasks
}

/// A free grass tile next to the team's base, if the team has no barracks yet.
fn barracks_site(state: &GameState, team: TeamId) -> Option<Coord> {
    let owner = state.teams.get(&team)?;
    let has_barracks = state
        .registry
        .team_pieces(team)
        .any(|p| p.kind == PieceKind::Barracks);
    if has_barracks {
        return None;
    }
    let base = state
        .registry
        .team_pieces(team)
        .find(|p| p.kind == PieceKind::Base)?;
    let attrs = owner.attrs(PieceKind::Barracks);
    state
        .map
        .neighbors(base.position)
        .find(|site| !state.registry.is_occupied(*site) && build_site_ok(&state.map, PieceKind::Barracks, attrs, *site))
}

/// Whether `piece` can work on `task` at all.
#[must_use]
pub fn is_eligible(task: &Task, attrs: &PieceAttributes) -> bool {
    match task.kind {
        TaskKind::Harvest => attrs.is_mobile() && attrs.buildable.contains(&PieceKind::Mine),
        TaskKind::Construct(kind) => attrs.is_mobile() && attrs.buildable.contains(&kind),
        TaskKind::Attack => attrs.is_mobile() && attrs.attack > 0 && attrs.damage_type != DamageType::None,
    }
}

/// Path length from `piece` to a tile from which it can do `task`.
///
/// Unreachable tasks score [`UNREACHABLE`].
pub fn score(state: &GameState, cache: &mut PathCache, piece: &Piece, attrs: &PieceAttributes, task: &Task) -> u32 {
    let Some(target) = task.target else {
        return UNREACHABLE;
    };
    let start = piece.position;
    let movement = attrs.movement;

    match task.kind {
        TaskKind::Harvest | TaskKind::Construct(_) => {
            if start.is_adjacent(target) {
                return 0;
            }
            state
                .map
                .neighbors(target)
                .filter(|tile| state.map.is_passable(*tile, movement))
                .filter_map(|tile| cache.distance(&state.map, movement, start, tile))
                .min()
                .unwrap_or(UNREACHABLE)
        }
        TaskKind::Attack => {
            let distance = start.distance(target);
            if attrs.damage_type == DamageType::Ranged
                && (attrs.min_range..=attrs.max_range).contains(&distance)
            {
                return 0;
            }
            cache
                .distance(&state.map, movement, start, target)
                .unwrap_or(UNREACHABLE)
        }
    }
}

/// Best piece for every task, sorted best first.
///
/// Ties are broken by piece coordinate so planning is deterministic.
pub fn best_assignments(state: &GameState, cache: &mut PathCache, team: TeamId, tasks: &[Task]) -> Vec<Assignment> {
    let Some(owner) = state.teams.get(&team) else {
        return Vec::new();
    };
    let pieces: Vec<&Piece> = state.registry.team_pieces(team).collect();

    let mut best = Vec::new();
    for (index, task) in tasks.iter().enumerate() {
        let candidate = pieces
            .iter()
            .filter(|piece| is_eligible(task, owner.attrs(piece.kind)))
            .map(|piece| Assignment {
                piece: piece.position,
                task: index,
                score: score(state, cache, piece, owner.attrs(piece.kind), task),
            })
            .filter(|a| a.score < UNREACHABLE)
            .min_by_key(|a| (a.score, a.piece));
        best.extend(candidate);
    }

    best.sort_by_key(|a| (a.score, a.task));
    best
}

/// Greedily confirm assignments, skipping claimed pieces and tasks.
#[must_use]
pub fn confirm(assignments: &[Assignment]) -> Vec<Assignment> {
    let mut pieces = BTreeSet::new();
    let mut tasks = BTreeSet::new();
    assignments
        .iter()
        .filter(|a| {
            if pieces.contains(&a.piece) || tasks.contains(&a.task) {
                return false;
            }
            pieces.insert(a.piece);
            tasks.insert(a.task);
            true
        })
        .copied()
        .collect()
}
