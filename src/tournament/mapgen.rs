//! Deterministic map generation for matches.

// Map generation uses intentional casts for coordinate/RNG operations
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]

use crate::game::{Coord, Map, TeamId, TileKind};

/// Distance of each base from its corner.
const CORNER_INSET: u16 = 2;
/// Half-width of the grass square cleared around each base.
const CLEARING: u16 = 2;
/// Smallest side a generated map may have.
pub const MIN_SIDE: u16 = 2 * (CORNER_INSET + CLEARING) + 1;

/// Deterministic PRNG using xorshift64.
#[derive(Debug, Clone, Copy)]
struct Rng {
    state: u64,
}

impl Rng {
    /// Create a new RNG with the given seed.
    const fn new(seed: u64) -> Self {
        // Ensure non-zero state
        let state = if seed == 0 { 0x5555_5555_5555_5555 } else { seed };
        Self { state }
    }

    /// Generate next random u64.
    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Generate random u32 in [0, max).
    fn next_u32(&mut self, max: u32) -> u32 {
        if max == 0 {
            return 0;
        }
        (self.next_u64() % u64::from(max)) as u32
    }

    /// Generate random f64 in [0, 1).
    fn next_f64(&mut self) -> f64 {
        (self.next_u64() as f64) / (u64::MAX as f64)
    }
}

/// Error type for map generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapGenError {
    /// Description of the error.
    pub reason: String,
}

impl std::fmt::Display for MapGenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Map generation error: {}", self.reason)
    }
}

impl std::error::Error for MapGenError {}

/// Where a team starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartingArea {
    /// The team.
    pub team: TeamId,
    /// Tile of the team's base.
    pub base: Coord,
    /// Tile of the starting builder.
    pub builder: Coord,
    /// Tile of the starting trooper.
    pub trooper: Coord,
}

/// Generate a map and a starting area per team.
///
/// Teams are seated in opposite corners first (`RED` and `BLUE` face each
/// other diagonally). Every base sits in a grass clearing with two deposits
/// next to its builder, and a ground corridor links every base to the first.
///
/// # Errors
///
/// Returns an error if the map is smaller than [`MIN_SIDE`] on either side or
/// the team count is outside 2..=4.
pub fn generate_map(
    seed: u64,
    width: u16,
    height: u16,
    num_teams: usize,
) -> Result<(Map, Vec<StartingArea>), MapGenError> {
    if !(2..=TeamId::ALL.len()).contains(&num_teams) {
        return Err(MapGenError {
            reason: format!("Need 2 to {} teams, got {num_teams}", TeamId::ALL.len()),
        });
    }
    if width < MIN_SIDE || height < MIN_SIDE {
        return Err(MapGenError {
            reason: format!("Map must be at least {MIN_SIDE}x{MIN_SIDE}, got {width}x{height}"),
        });
    }

    let mut rng = Rng::new(seed);
    let mut map = Map::new(width, height).ok_or_else(|| MapGenError {
        reason: "Invalid map dimensions (must be > 0)".to_string(),
    })?;

    generate_terrain(&mut map, &mut rng);
    scatter_deposits(&mut map, &mut rng);

    let corners = [
        Coord::new(CORNER_INSET, CORNER_INSET),
        Coord::new(width - 1 - CORNER_INSET, height - 1 - CORNER_INSET),
        Coord::new(width - 1 - CORNER_INSET, CORNER_INSET),
        Coord::new(CORNER_INSET, height - 1 - CORNER_INSET),
    ];

    let mut starts = Vec::with_capacity(num_teams);
    for (team, base) in TeamId::ALL.into_iter().zip(corners).take(num_teams) {
        starts.push(settle(&mut map, team, base));
    }

    let hub = starts[0].base;
    for start in &starts[1..] {
        carve_corridor(&mut map, hub, start.base);
    }

    Ok((map, starts))
}

/// Water and mountain patches over about a fifth of the map.
fn generate_terrain(map: &mut Map, rng: &mut Rng) {
    let width = map.width();
    let height = map.height();
    let patches = u32::from(width) * u32::from(height) / 40;

    for _ in 0..patches {
        let kind = if rng.next_f64() < 0.5 {
            TileKind::Water
        } else {
            TileKind::Mountain
        };
        let cx = rng.next_u32(u32::from(width)) as u16;
        let cy = rng.next_u32(u32::from(height)) as u16;
        let radius = 1 + rng.next_u32(2) as u16;

        for y in cy.saturating_sub(radius)..=cy.saturating_add(radius).min(height - 1) {
            for x in cx.saturating_sub(radius)..=cx.saturating_add(radius).min(width - 1) {
                let coord = Coord::new(x, y);
                if coord.distance(Coord::new(cx, cy)) <= u32::from(radius) {
                    map.set(coord, kind);
                }
            }
        }
    }
}

/// Deposits on roughly 3% of the remaining grass.
fn scatter_deposits(map: &mut Map, rng: &mut Rng) {
    let grass: Vec<Coord> = map
        .iter()
        .filter(|(_, tile)| *tile == TileKind::Grass)
        .map(|(coord, _)| coord)
        .collect();
    for coord in grass {
        if rng.next_f64() < 0.03 {
            map.set(coord, TileKind::Resource);
        }
    }
}

/// Clear the area around `base` and lay out the starting pieces.
fn settle(map: &mut Map, team: TeamId, base: Coord) -> StartingArea {
    for y in base.y - CLEARING..=base.y + CLEARING {
        for x in base.x - CLEARING..=base.x + CLEARING {
            map.set(Coord::new(x, y), TileKind::Grass);
        }
    }

    // Face the map centre so the starting pieces never leave the clearing.
    let toward = |from: u16, size: u16| -> i32 { if from < size / 2 { 1 } else { -1 } };
    let dx = toward(base.x, map.width());
    let dy = toward(base.y, map.height());
    let offset = |c: Coord, ox: i32, oy: i32| {
        Coord::new((i32::from(c.x) + ox) as u16, (i32::from(c.y) + oy) as u16)
    };

    let builder = offset(base, dx, 0);
    let trooper = offset(base, 0, dy);
    map.set(offset(base, 2 * dx, 0), TileKind::Resource);
    map.set(offset(base, 0, 2 * dy), TileKind::Resource);

    StartingArea {
        team,
        base,
        builder,
        trooper,
    }
}

/// Turn water and mountains along an L-shaped route into grass.
fn carve_corridor(map: &mut Map, from: Coord, to: Coord) {
    let mut clear = |coord: Coord| {
        if matches!(map.get(coord), Some(TileKind::Water | TileKind::Mountain)) {
            map.set(coord, TileKind::Grass);
        }
    };
    for x in from.x.min(to.x)..=from.x.max(to.x) {
        clear(Coord::new(x, from.y));
    }
    for y in from.y.min(to.y)..=from.y.max(to.y) {
        clear(Coord::new(to.x, y));
    }
}
