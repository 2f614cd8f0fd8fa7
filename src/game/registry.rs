//! Spatial index of pieces.
//!
//! The registry is the single source of truth for what occupies a tile. A
//! tile normally holds at most one piece per team; pieces of different teams
//! share a tile between the move and combat phases. Moving is always
//! remove-then-register so that shared state is representable.

use std::collections::BTreeMap;

use crate::game::{Coord, Piece, PieceKind, TeamId};

/// Optional constraints on a piece lookup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PieceFilter {
    /// Only this team's pieces.
    pub team: Option<TeamId>,
    /// Exclude this team's pieces.
    pub not_team: Option<TeamId>,
    /// Only this kind.
    pub kind: Option<PieceKind>,
}

impl PieceFilter {
    /// Filter matching every piece.
    #[must_use]
    pub const fn any() -> Self {
        Self {
            team: None,
            not_team: None,
            kind: None,
        }
    }

    /// Restrict to `team`.
    #[must_use]
    pub const fn team(mut self, team: TeamId) -> Self {
        self.team = Some(team);
        self
    }

    /// Restrict to teams other than `team`.
    #[must_use]
    pub const fn enemies_of(mut self, team: TeamId) -> Self {
        self.not_team = Some(team);
        self
    }

    /// Restrict to `kind`.
    #[must_use]
    pub const fn kind(mut self, kind: PieceKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Whether `piece` passes the filter.
    #[must_use]
    pub fn matches(&self, piece: &Piece) -> bool {
        self.team.is_none_or(|team| piece.team == team)
            && self.not_team.is_none_or(|team| piece.team != team)
            && self.kind.is_none_or(|kind| piece.kind == kind)
    }
}

/// Multimap from coordinate to the pieces standing there.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PieceRegistry {
    /// Ordered for deterministic iteration; empty buckets are never kept.
    tiles: BTreeMap<Coord, Vec<Piece>>,
}

impl PieceRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Index a piece under its current position.
    pub fn register(&mut self, piece: Piece) {
        self.tiles.entry(piece.position).or_default().push(piece);
    }

    /// Remove `team`'s piece at `coord`.
    pub fn remove(&mut self, coord: Coord, team: TeamId) -> Option<Piece> {
        let bucket = self.tiles.get_mut(&coord)?;
        let idx = bucket.iter().position(|p| p.team == team)?;
        let piece = bucket.remove(idx);
        if bucket.is_empty() {
            self.tiles.remove(&coord);
        }
        Some(piece)
    }

    /// Move `team`'s piece from `from` to `to`.
    ///
    /// Returns `false` if no such piece exists.
    pub fn relocate(&mut self, from: Coord, team: TeamId, to: Coord) -> bool {
        let Some(mut piece) = self.remove(from, team) else {
            return false;
        };
        piece.position = to;
        self.register(piece);
        true
    }

    /// All pieces at `coord`.
    #[must_use]
    pub fn at(&self, coord: Coord) -> &[Piece] {
        self.tiles.get(&coord).map_or(&[], Vec::as_slice)
    }

    /// Pieces at `coord` passing `filter`.
    pub fn at_filtered(&self, coord: Coord, filter: PieceFilter) -> impl Iterator<Item = &Piece> {
        self.at(coord).iter().filter(move |p| filter.matches(p))
    }

    /// `team`'s piece at `coord`.
    #[must_use]
    pub fn get(&self, coord: Coord, team: TeamId) -> Option<&Piece> {
        self.at(coord).iter().find(|p| p.team == team)
    }

    /// Mutable access to `team`'s piece at `coord`.
    #[must_use]
    pub fn get_mut(&mut self, coord: Coord, team: TeamId) -> Option<&mut Piece> {
        self.tiles.get_mut(&coord)?.iter_mut().find(|p| p.team == team)
    }

    /// Whether any piece stands on `coord`.
    #[must_use]
    pub fn is_occupied(&self, coord: Coord) -> bool {
        self.tiles.contains_key(&coord)
    }

    /// Enemies of `team` at `coord`.
    pub fn enemies_at(&self, coord: Coord, team: TeamId) -> impl Iterator<Item = &Piece> {
        self.at_filtered(coord, PieceFilter::any().enemies_of(team))
    }

    /// Whether an enemy of `team` stands on `coord`.
    #[must_use]
    pub fn has_enemy_at(&self, coord: Coord, team: TeamId) -> bool {
        self.enemies_at(coord, team).next().is_some()
    }

    /// Pieces on the four tiles around `coord` passing `filter`.
    pub fn adjacent(&self, coord: Coord, filter: PieceFilter) -> impl Iterator<Item = &Piece> {
        coord
            .around()
            .flat_map(move |adj| self.at_filtered(adj, filter))
    }

    /// Enemies of `team` on the four tiles around `coord`.
    pub fn adjacent_enemies(&self, coord: Coord, team: TeamId) -> impl Iterator<Item = &Piece> {
        self.adjacent(coord, PieceFilter::any().enemies_of(team))
    }

    /// Every piece, ordered by coordinate then insertion.
    pub fn iter(&self) -> impl Iterator<Item = &Piece> {
        self.tiles.values().flatten()
    }

    /// Every piece, mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Piece> {
        self.tiles.values_mut().flatten()
    }

    /// Every piece passing `filter`.
    pub fn filtered(&self, filter: PieceFilter) -> impl Iterator<Item = &Piece> {
        self.iter().filter(move |p| filter.matches(p))
    }

    /// All of `team`'s pieces.
    pub fn team_pieces(&self, team: TeamId) -> impl Iterator<Item = &Piece> {
        self.filtered(PieceFilter::any().team(team))
    }

    /// Number of pieces `team` owns.
    #[must_use]
    pub fn team_count(&self, team: TeamId) -> usize {
        self.team_pieces(team).count()
    }

    /// Coordinates where pieces of more than one team stand.
    #[must_use]
    pub fn contested(&self) -> Vec<Coord> {
        self.tiles
            .iter()
            .filter(|(_, bucket)| bucket.iter().any(|p| p.team != bucket[0].team))
            .map(|(coord, _)| *coord)
            .collect()
    }

    /// Occupied coordinates with their buckets.
    pub fn buckets(&self) -> impl Iterator<Item = (Coord, &[Piece])> {
        self.tiles.iter().map(|(coord, bucket)| (*coord, bucket.as_slice()))
    }

    /// Remove every piece with zero HP, returning them in coordinate order.
    pub fn remove_dead(&mut self) -> Vec<Piece> {
        let mut dead = Vec::new();
        self.tiles.retain(|_, bucket| {
            let (alive, fallen): (Vec<_>, Vec<_>) = bucket.drain(..).partition(Piece::is_alive);
            dead.extend(fallen);
            *bucket = alive;
            !bucket.is_empty()
        });
        dead
    }

    /// Total number of pieces.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tiles.values().map(Vec::len).sum()
    }

    /// Whether the registry holds no pieces.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}
