//! Search routines over the map.

use std::collections::{BTreeSet, HashMap};

use pathfinding::prelude::{astar, dijkstra_all, dijkstra_reach};

use crate::game::{Coord, Map, MovementType, Piece, PieceAttributes, PieceRegistry, TeamId, Teams};

/// Base cost of one step.
pub const STEP_COST: u32 = 10;
/// Extra cost for stepping onto an allied immobile building.
pub const ALLY_BUILDING_PENALTY: u32 = 15;
/// Extra cost for stepping onto a tile reserved by another pending order.
pub const BLOCKED_PENALTY: u32 = 25;
/// Extra cost per adjacent enemy that out-multiplies the mover.
pub const THREAT_PENALTY: u32 = 8;
/// Cost reduction per adjacent enemy the mover out-multiplies.
pub const FAVORABLE_REWARD: u32 = 4;
/// Distance reported for tiles that cannot reach the goal.
pub const UNREACHABLE: u32 = u32::MAX / 2;

/// Floor of any single step, keeping the heuristic admissible.
const MIN_STEP_COST: u32 = 5;

/// Shortest distances from every tile to one goal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTree {
    goal: Coord,
    /// Next tile toward the goal.
    predecessors: HashMap<Coord, Coord>,
    /// Steps to the goal.
    distances: HashMap<Coord, u32>,
}

impl PathTree {
    /// The goal every path leads to.
    #[must_use]
    pub const fn goal(&self) -> Coord {
        self.goal
    }

    /// Steps from `start` to the goal, if reachable.
    #[must_use]
    pub fn distance(&self, start: Coord) -> Option<u32> {
        self.distances.get(&start).copied()
    }

    /// Full path from `start` to the goal, both ends included.
    #[must_use]
    pub fn path_from(&self, start: Coord) -> Option<Vec<Coord>> {
        reconstruct(&self.predecessors, start, self.goal)
    }

    /// Number of tiles that reach the goal.
    #[must_use]
    pub fn len(&self) -> usize {
        self.distances.len()
    }

    /// Whether only the goal itself is known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }
}

/// Follow predecessor links from `from` until `to`.
///
/// Returns the visited tiles in walk order, or `None` when the chain breaks.
#[must_use]
pub fn reconstruct(predecessors: &HashMap<Coord, Coord>, from: Coord, to: Coord) -> Option<Vec<Coord>> {
    let mut path = vec![from];
    let mut current = from;
    while current != to {
        if path.len() > predecessors.len() + 1 {
            return None;
        }
        current = *predecessors.get(&current)?;
        path.push(current);
    }
    Some(path)
}

/// Unweighted search from `goal` outward over tiles `movement` can traverse.
#[must_use]
pub fn bfs_from_goal(map: &Map, movement: MovementType, goal: Coord) -> PathTree {
    let mut predecessors = HashMap::new();
    let mut distances = HashMap::new();
    if !map.in_bounds(goal) {
        return PathTree {
            goal,
            predecessors,
            distances,
        };
    }

    let reached = dijkstra_all(&goal, |tile: &Coord| {
        map.neighbors(*tile)
            .filter(|next| map.is_traversable(*next, movement))
            .map(|next| (next, 1u32))
            .collect::<Vec<_>>()
    });
    distances.insert(goal, 0);
    for (tile, (parent, cost)) in reached {
        predecessors.insert(tile, parent);
        distances.insert(tile, cost);
    }

    PathTree {
        goal,
        predecessors,
        distances,
    }
}

fn blocks(registry: &PieceRegistry, tile: Coord, team: TeamId, ignores_blocking: bool) -> bool {
    !ignores_blocking && registry.has_enemy_at(tile, team)
}

/// Cost of stepping onto `tile`.
fn step_cost(
    registry: &PieceRegistry,
    teams: &Teams,
    mover: &Piece,
    attrs: &PieceAttributes,
    tile: Coord,
    blocked: &BTreeSet<Coord>,
) -> u32 {
    let mut cost = STEP_COST;

    let ally_building = registry.get(tile, mover.team).is_some_and(|ally| {
        teams
            .get(&ally.team)
            .is_some_and(|team| !team.attrs(ally.kind).is_mobile())
    });
    if ally_building {
        cost += ALLY_BUILDING_PENALTY;
    }
    if blocked.contains(&tile) {
        cost += BLOCKED_PENALTY;
    }

    let mut reward = 0;
    for enemy in registry.adjacent_enemies(tile, mover.team) {
        let Some(enemy_attrs) = teams.get(&enemy.team).map(|t| t.attrs(enemy.kind)) else {
            continue;
        };
        let theirs = enemy_attrs.multiplier(attrs.archetype);
        let ours = attrs.multiplier(enemy_attrs.archetype);
        if theirs > ours {
            cost += THREAT_PENALTY;
        } else if ours > theirs {
            reward += FAVORABLE_REWARD;
        }
    }

    cost.saturating_sub(reward).max(MIN_STEP_COST)
}

/// Best path for `mover` from its tile to `goal`.
///
/// Tiles held by enemies the piece cannot ignore end expansion; they can
/// still be the final step. `blocked` holds tiles reserved by other orders.
#[must_use]
pub fn find_path(
    map: &Map,
    registry: &PieceRegistry,
    teams: &Teams,
    mover: &Piece,
    goal: Coord,
    blocked: &BTreeSet<Coord>,
) -> Option<Vec<Coord>> {
    let attrs = teams.get(&mover.team)?.attrs(mover.kind);
    let movement = attrs.movement;
    if !map.is_passable(goal, movement) {
        return None;
    }
    let start = mover.position;
    let ignores = attrs.flags.ignores_blocking;

    let (path, _cost) = astar(
        &start,
        |tile: &Coord| {
            let tile = *tile;
            if tile != start && blocks(registry, tile, mover.team, ignores) {
                return Vec::new();
            }
            map.neighbors(tile)
                .filter(|next| *next == goal || map.is_traversable(*next, movement))
                .map(|next| (next, step_cost(registry, teams, mover, attrs, next, blocked)))
                .collect()
        },
        |tile: &Coord| tile.distance(goal) * MIN_STEP_COST,
        |tile: &Coord| *tile == goal,
    )?;
    Some(path)
}

/// Trim `path` to the movement budget and return the tile to move to.
///
/// A blocking enemy on the first step may be engaged; one further along stops
/// the piece on the last free tile before it. The result never lies on a
/// tile the piece cannot stop on.
#[must_use]
pub fn step_along(
    map: &Map,
    registry: &PieceRegistry,
    path: &[Coord],
    attrs: &PieceAttributes,
    team: TeamId,
) -> Option<Coord> {
    let start = *path.first()?;
    let budget = usize::try_from(attrs.move_range).unwrap_or(usize::MAX);
    let mut end = 0;

    for (i, tile) in path.iter().enumerate().skip(1).take(budget) {
        if blocks(registry, *tile, team, attrs.flags.ignores_blocking) {
            end = if i == 1 { 1 } else { i - 1 };
            break;
        }
        end = i;
    }

    while end > 0 && !map.is_passable(path[end], attrs.movement) {
        end -= 1;
    }
    (path[end] != start).then_some(path[end])
}

/// Every tile `mover` can end a move on this turn.
#[must_use]
pub fn movement_preview(
    map: &Map,
    registry: &PieceRegistry,
    mover: &Piece,
    attrs: &PieceAttributes,
) -> BTreeSet<Coord> {
    if !attrs.is_mobile() {
        return BTreeSet::new();
    }
    let start = mover.position;
    let ignores = attrs.flags.ignores_blocking;

    dijkstra_reach(&start, |tile: &Coord| {
        let tile = *tile;
        let expand = tile == start || !blocks(registry, tile, mover.team, ignores);
        map.neighbors(tile)
            .filter(|next| expand && map.is_traversable(*next, attrs.movement))
            .map(|next| (next, 1u32))
            .collect::<Vec<_>>()
    })
    .take_while(|item| item.total_cost <= attrs.move_range)
    .map(|item| item.node)
    .filter(|tile| *tile != start && map.is_passable(*tile, attrs.movement))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{PieceKind, RuleSet, Team, TileKind};

    fn create_teams() -> Teams {
        let rules = RuleSet::base();
        let mut teams = Teams::new();
        for id in [TeamId::Red, TeamId::Blue] {
            teams.insert(id, Team::new(id, 0, &rules.attributes));
        }
        teams
    }

    fn piece(teams: &Teams, team: TeamId, kind: PieceKind, x: u16, y: u16) -> Piece {
        Piece::new(team, kind, Coord::new(x, y), teams[&team].attrs(kind))
    }

    #[test]
    fn test_bfs_distances_3x3() {
        let map = Map::new(3, 3).unwrap();
        let tree = bfs_from_goal(&map, MovementType::Ground, Coord::new(1, 1));

        assert_eq!(tree.distance(Coord::new(1, 1)), Some(0));
        assert_eq!(tree.distance(Coord::new(0, 1)), Some(1));
        assert_eq!(tree.distance(Coord::new(1, 2)), Some(1));
        for corner in [(0, 0), (2, 0), (0, 2), (2, 2)] {
            assert_eq!(tree.distance(Coord::new(corner.0, corner.1)), Some(2));
        }
        assert_eq!(tree.len(), 9);
    }

    #[test]
    fn test_bfs_path_reconstruction() {
        let map = Map::new(3, 3).unwrap();
        let tree = bfs_from_goal(&map, MovementType::Ground, Coord::new(1, 1));
        let path = tree.path_from(Coord::new(0, 0)).unwrap();
        assert_eq!(path.len(), 3);
        assert_eq!(path.first(), Some(&Coord::new(0, 0)));
        assert_eq!(path.last(), Some(&Coord::new(1, 1)));
    }

    #[test]
    fn test_bfs_respects_water() {
        let mut map = Map::new(3, 1).unwrap();
        map.set(Coord::new(1, 0), TileKind::Water);

        let ground = bfs_from_goal(&map, MovementType::Ground, Coord::new(0, 0));
        assert_eq!(ground.distance(Coord::new(2, 0)), None);
        assert_eq!(ground.path_from(Coord::new(2, 0)), None);

        let hover = bfs_from_goal(&map, MovementType::Hover, Coord::new(0, 0));
        assert_eq!(hover.distance(Coord::new(2, 0)), Some(2));
    }

    #[test]
    fn test_find_path_straight_line() {
        let map = Map::new(5, 5).unwrap();
        let teams = create_teams();
        let registry = PieceRegistry::new();
        let mover = piece(&teams, TeamId::Red, PieceKind::Trooper, 0, 0);

        let path = find_path(&map, &registry, &teams, &mover, Coord::new(3, 0), &BTreeSet::new()).unwrap();
        assert_eq!(path.len(), 4);
        assert_eq!(path[3], Coord::new(3, 0));
    }

    #[test]
    fn test_find_path_avoids_blocked_set() {
        let map = Map::new(3, 3).unwrap();
        let teams = create_teams();
        let registry = PieceRegistry::new();
        let mover = piece(&teams, TeamId::Red, PieceKind::Trooper, 0, 1);
        let blocked = BTreeSet::from([Coord::new(1, 1)]);

        let path = find_path(&map, &registry, &teams, &mover, Coord::new(2, 1), &blocked).unwrap();
        assert!(!path.contains(&Coord::new(1, 1)), "{path:?}");
    }

    #[test]
    fn test_enemy_tile_ends_expansion() {
        let map = Map::from_rows(vec![
            vec![TileKind::Grass, TileKind::Grass, TileKind::Grass],
            vec![TileKind::Water, TileKind::Water, TileKind::Water],
        ])
        .unwrap();
        let teams = create_teams();
        let mut registry = PieceRegistry::new();
        registry.register(piece(&teams, TeamId::Blue, PieceKind::Trooper, 1, 0));
        let mover = piece(&teams, TeamId::Red, PieceKind::Trooper, 0, 0);

        assert!(find_path(&map, &registry, &teams, &mover, Coord::new(2, 0), &BTreeSet::new()).is_none());
        assert!(find_path(&map, &registry, &teams, &mover, Coord::new(1, 0), &BTreeSet::new()).is_some());

        let scout = piece(&teams, TeamId::Red, PieceKind::Scout, 0, 0);
        assert!(find_path(&map, &registry, &teams, &scout, Coord::new(2, 0), &BTreeSet::new()).is_some());
    }

    #[test]
    fn test_step_along_budget_and_enemy() {
        let map = Map::new(6, 1).unwrap();
        let teams = create_teams();
        let mut registry = PieceRegistry::new();
        let attrs = teams[&TeamId::Red].attrs(PieceKind::Trooper);
        let path: Vec<Coord> = (0..6).map(|x| Coord::new(x, 0)).collect();

        assert_eq!(step_along(&map, &registry, &path, attrs, TeamId::Red), Some(Coord::new(2, 0)));

        registry.register(piece(&teams, TeamId::Blue, PieceKind::Trooper, 1, 0));
        assert_eq!(step_along(&map, &registry, &path, attrs, TeamId::Red), Some(Coord::new(1, 0)));

        let mut registry = PieceRegistry::new();
        registry.register(piece(&teams, TeamId::Blue, PieceKind::Trooper, 2, 0));
        assert_eq!(step_along(&map, &registry, &path, attrs, TeamId::Red), Some(Coord::new(1, 0)));
    }

    #[test]
    fn test_flyer_never_stops_on_mountain() {
        let mut map = Map::new(5, 1).unwrap();
        map.set(Coord::new(4, 0), TileKind::Mountain);
        let teams = create_teams();
        let registry = PieceRegistry::new();
        let attrs = teams[&TeamId::Red].attrs(PieceKind::Scout);
        let path: Vec<Coord> = (0..5).map(|x| Coord::new(x, 0)).collect();

        assert_eq!(step_along(&map, &registry, &path, attrs, TeamId::Red), Some(Coord::new(3, 0)));
    }

    #[test]
    fn test_movement_preview_range() {
        let map = Map::new(5, 5).unwrap();
        let teams = create_teams();
        let registry = PieceRegistry::new();
        let mover = piece(&teams, TeamId::Red, PieceKind::Trooper, 2, 2);

        let reach = movement_preview(&map, &registry, &mover, teams[&TeamId::Red].attrs(PieceKind::Trooper));
        // Diamond of radius 2 minus the centre.
        assert_eq!(reach.len(), 12);
        assert!(!reach.contains(&Coord::new(2, 2)));
        assert!(reach.contains(&Coord::new(4, 2)));
        assert!(!reach.contains(&Coord::new(4, 3)));
    }

    #[test]
    fn test_movement_preview_stops_at_enemy() {
        let map = Map::new(5, 5).unwrap();
        let teams = create_teams();
        let mut registry = PieceRegistry::new();
        registry.register(piece(&teams, TeamId::Blue, PieceKind::Trooper, 3, 2));
        let mover = piece(&teams, TeamId::Red, PieceKind::Trooper, 2, 2);

        let reach = movement_preview(&map, &registry, &mover, teams[&TeamId::Red].attrs(PieceKind::Trooper));
        assert!(reach.contains(&Coord::new(3, 2)));
        assert!(!reach.contains(&Coord::new(4, 2)));
        assert_eq!(reach.len(), 11);
    }

    #[test]
    fn test_movement_preview_immobile() {
        let map = Map::new(5, 5).unwrap();
        let teams = create_teams();
        let registry = PieceRegistry::new();
        let tower = piece(&teams, TeamId::Red, PieceKind::Tower, 2, 2);
        assert!(movement_preview(&map, &registry, &tower, teams[&TeamId::Red].attrs(PieceKind::Tower)).is_empty());
    }
}
