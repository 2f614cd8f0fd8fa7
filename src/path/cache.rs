//! Memoized goal trees keyed by movement type.

use std::collections::HashMap;

use tracing::trace;

use crate::game::events::Notification;
use crate::game::{Coord, Map, MovementType};
use crate::path::search::{bfs_from_goal, PathTree};

/// Lazily computed [`PathTree`]s, one per (movement type, goal).
///
/// Trees are only built on request. A terrain change drops the trees of every
/// movement type whose passability depends on terrain; flying trees survive.
#[derive(Debug, Clone, Default)]
pub struct PathCache {
    trees: HashMap<MovementType, HashMap<Coord, PathTree>>,
    misses: u64,
}

impl PathCache {
    /// An empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The tree leading to `goal` for `movement`, computing it on first use.
    pub fn get_path(&mut self, map: &Map, movement: MovementType, goal: Coord) -> &PathTree {
        let per_type = self.trees.entry(movement).or_default();
        if !per_type.contains_key(&goal) {
            self.misses += 1;
            trace!(?movement, %goal, "path cache miss");
        }
        per_type
            .entry(goal)
            .or_insert_with(|| bfs_from_goal(map, movement, goal))
    }

    /// Steps from `start` to `goal`, if reachable.
    pub fn distance(&mut self, map: &Map, movement: MovementType, start: Coord, goal: Coord) -> Option<u32> {
        self.get_path(map, movement, goal).distance(start)
    }

    /// Whether a tree for `goal` is cached.
    #[must_use]
    pub fn contains(&self, movement: MovementType, goal: Coord) -> bool {
        self.trees
            .get(&movement)
            .is_some_and(|per_type| per_type.contains_key(&goal))
    }

    /// Number of trees computed so far.
    #[must_use]
    pub const fn misses(&self) -> u64 {
        self.misses
    }

    /// Drop the trees of terrain-bound movement types.
    pub fn invalidate_terrain(&mut self) {
        self.trees.retain(|movement, _| !movement.depends_on_terrain());
    }

    /// React to a simulation notification.
    pub fn on_notification(&mut self, notification: &Notification) {
        if notification.is_terrain_mutation() {
            self.invalidate_terrain();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::events::TerrainCause;
    use crate::game::TileKind;

    #[test]
    fn test_get_path_idempotent() {
        let map = Map::new(6, 6).unwrap();
        let mut cache = PathCache::new();
        let first = cache.get_path(&map, MovementType::Ground, Coord::new(3, 3)).clone();
        let second = cache.get_path(&map, MovementType::Ground, Coord::new(3, 3)).clone();
        assert_eq!(first, second);
        assert_eq!(cache.misses(), 1);
    }

    #[test]
    fn test_mined_tile_clears_ground_keeps_flying() {
        let map = Map::new(4, 4).unwrap();
        let goal = Coord::new(1, 1);
        let mut cache = PathCache::new();
        cache.get_path(&map, MovementType::Ground, goal);
        cache.get_path(&map, MovementType::Hover, goal);
        cache.get_path(&map, MovementType::Flying, goal);

        cache.on_notification(&Notification::TileChanged {
            x: 2,
            y: 2,
            from: TileKind::Resource,
            to: TileKind::Grass,
            cause: TerrainCause::Mined,
        });

        assert!(!cache.contains(MovementType::Ground, goal));
        assert!(!cache.contains(MovementType::Hover, goal));
        assert!(cache.contains(MovementType::Flying, goal));
    }

    #[test]
    fn test_other_notifications_keep_entries() {
        let map = Map::new(4, 4).unwrap();
        let mut cache = PathCache::new();
        cache.get_path(&map, MovementType::Ground, Coord::new(0, 0));
        cache.on_notification(&Notification::Cleanup);
        assert!(cache.contains(MovementType::Ground, Coord::new(0, 0)));
    }
}
