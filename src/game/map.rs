//! Grid coordinates, terrain and movement-type passability.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A coordinate on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    /// X coordinate (column).
    pub x: u16,
    /// Y coordinate (row).
    pub y: u16,
}

impl Coord {
    /// Create a new coordinate.
    #[must_use]
    pub const fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }

    /// Get adjacent coordinates (up, down, left, right) inside a `width` x `height` grid.
    ///
    /// Returns a fixed-size array and count to avoid heap allocation.
    /// The array contains valid coordinates in indices 0..count.
    #[must_use]
    #[inline]
    pub fn adjacent(&self, width: u16, height: u16) -> ([Coord; 4], u8) {
        let mut result = [Coord::new(0, 0); 4];
        let mut count = 0u8;

        if self.y > 0 {
            result[count as usize] = Coord::new(self.x, self.y - 1); // up
            count += 1;
        }
        if self.y + 1 < height {
            result[count as usize] = Coord::new(self.x, self.y + 1); // down
            count += 1;
        }
        if self.x > 0 {
            result[count as usize] = Coord::new(self.x - 1, self.y); // left
            count += 1;
        }
        if self.x + 1 < width {
            result[count as usize] = Coord::new(self.x + 1, self.y); // right
            count += 1;
        }

        (result, count)
    }

    /// Adjacent coordinates without an upper bound.
    ///
    /// Used where the caller only looks coordinates up in a sparse index, so
    /// out-of-map neighbours simply never match.
    pub fn around(self) -> impl Iterator<Item = Coord> {
        let (adj, count) = self.adjacent(u16::MAX, u16::MAX);
        adj.into_iter().take(count as usize)
    }

    /// Manhattan distance to another coordinate.
    #[must_use]
    pub fn distance(self, other: Coord) -> u32 {
        u32::from(self.x.abs_diff(other.x)) + u32::from(self.y.abs_diff(other.y))
    }

    /// Whether `other` shares an edge with this coordinate.
    #[must_use]
    pub fn is_adjacent(self, other: Coord) -> bool {
        self.distance(other) == 1
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Terrain kind of a tile, stored as an integer in map files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum TileKind {
    /// Open ground.
    Grass = 0,
    /// Deep water - hover and flying pieces only.
    Water = 1,
    /// Mountain - flying pieces may cross but never stop.
    Mountain = 2,
    /// Mineable deposit, walkable like grass.
    Resource = 3,
}

impl TileKind {
    /// Decode a map-file tile integer.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Grass),
            1 => Some(Self::Water),
            2 => Some(Self::Mountain),
            3 => Some(Self::Resource),
            _ => None,
        }
    }

    /// The integer written to map files.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Result of terraforming this tile, if the change is possible.
    #[must_use]
    pub const fn terraformed(self, raising: bool) -> Option<Self> {
        match (self, raising) {
            (Self::Water, true) | (Self::Mountain, false) => Some(Self::Grass),
            (Self::Grass, true) => Some(Self::Mountain),
            (Self::Grass, false) => Some(Self::Water),
            _ => None,
        }
    }
}

/// How a piece moves across terrain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementType {
    /// Walks on grass and deposits.
    Ground,
    /// Like ground, but also crosses and stops on water.
    Hover,
    /// Crosses every tile, stops anywhere but mountains.
    Flying,
    /// Never moves (buildings).
    Immobile,
}

impl MovementType {
    /// Whether a piece of this type may pass through `tile`.
    #[must_use]
    pub const fn can_traverse(self, tile: TileKind) -> bool {
        match self {
            Self::Ground => matches!(tile, TileKind::Grass | TileKind::Resource),
            Self::Hover => !matches!(tile, TileKind::Mountain),
            Self::Flying => true,
            Self::Immobile => false,
        }
    }

    /// Whether a piece of this type may end its move on `tile`.
    #[must_use]
    pub const fn can_enter(self, tile: TileKind) -> bool {
        match self {
            Self::Flying => !matches!(tile, TileKind::Mountain),
            other => other.can_traverse(tile),
        }
    }

    /// Whether traversal for this type changes when terrain is mined or terraformed.
    #[must_use]
    pub const fn depends_on_terrain(self) -> bool {
        matches!(self, Self::Ground | Self::Hover)
    }
}

/// The game map: a grid of tile kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Map {
    /// Width of the map in tiles.
    width: u16,
    /// Height of the map in tiles.
    height: u16,
    /// Tiles stored in row-major order.
    tiles: Vec<TileKind>,
}

impl Map {
    /// Create a new map filled with grass.
    ///
    /// Returns `None` if width or height is zero.
    #[must_use]
    pub fn new(width: u16, height: u16) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }

        let size = usize::from(width) * usize::from(height);
        Some(Self {
            width,
            height,
            tiles: vec![TileKind::Grass; size],
        })
    }

    /// Build a map from rows of tiles.
    ///
    /// Returns `None` if there are no rows, a row is empty, or rows differ in length.
    #[must_use]
    pub fn from_rows(rows: Vec<Vec<TileKind>>) -> Option<Self> {
        let width = rows.first()?.len();
        if width == 0 || rows.iter().any(|row| row.len() != width) {
            return None;
        }
        let width = u16::try_from(width).ok()?;
        let height = u16::try_from(rows.len()).ok()?;

        Some(Self {
            width,
            height,
            tiles: rows.into_iter().flatten().collect(),
        })
    }

    /// Get the width of the map.
    #[must_use]
    pub const fn width(&self) -> u16 {
        self.width
    }

    /// Get the height of the map.
    #[must_use]
    pub const fn height(&self) -> u16 {
        self.height
    }

    /// Check if a coordinate is within the map bounds.
    #[must_use]
    pub const fn in_bounds(&self, coord: Coord) -> bool {
        coord.x < self.width && coord.y < self.height
    }

    /// Convert a coordinate to an index into the tiles array.
    fn coord_to_index(&self, coord: Coord) -> Option<usize> {
        if self.in_bounds(coord) {
            Some(usize::from(coord.y) * usize::from(self.width) + usize::from(coord.x))
        } else {
            None
        }
    }

    /// Get the tile kind at the given coordinate.
    #[must_use]
    pub fn get(&self, coord: Coord) -> Option<TileKind> {
        self.coord_to_index(coord).map(|idx| self.tiles[idx])
    }

    /// Set the tile at the given coordinate.
    ///
    /// Returns `false` if the coordinate is out of bounds.
    pub fn set(&mut self, coord: Coord, tile: TileKind) -> bool {
        if let Some(idx) = self.coord_to_index(coord) {
            self.tiles[idx] = tile;
            true
        } else {
            false
        }
    }

    /// Whether a piece moving as `movement` may pass through `coord`.
    #[must_use]
    pub fn is_traversable(&self, coord: Coord, movement: MovementType) -> bool {
        self.get(coord).is_some_and(|tile| movement.can_traverse(tile))
    }

    /// Whether a piece moving as `movement` may stop on `coord`.
    #[must_use]
    pub fn is_passable(&self, coord: Coord, movement: MovementType) -> bool {
        self.get(coord).is_some_and(|tile| movement.can_enter(tile))
    }

    /// In-bounds neighbours of `coord`.
    pub fn neighbors(&self, coord: Coord) -> impl Iterator<Item = Coord> {
        let (adj, count) = coord.adjacent(self.width, self.height);
        adj.into_iter().take(count as usize)
    }

    /// Iterate over all coordinates and tiles.
    pub fn iter(&self) -> impl Iterator<Item = (Coord, TileKind)> + '_ {
        self.tiles.iter().enumerate().map(|(idx, tile)| {
            let x = (idx % usize::from(self.width)) as u16;
            let y = (idx / usize::from(self.width)) as u16;
            (Coord::new(x, y), *tile)
        })
    }

    /// Iterate rows of tiles, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[TileKind]> {
        self.tiles.chunks(usize::from(self.width))
    }
}
