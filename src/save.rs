//! Save and map files.
//!
//! A save file is plain text. Tile rows come first, one row per line, each
//! tile written as its integer kind. Optional sections follow:
//!
//! ```text
//! 0 0 3 0
//! 0 1 0 0
//! # Pieces
//! 0 0 RED BASE 20
//! 3 1 BLUE TROOPER 4
//! # Teams
//! RED 12
//! BLUE 7
//! # Upgrades
//! RED|FORGING PLATING
//! # Meta
//! turn 4
//! phase ORDERS
//! ```
//!
//! Owned upgrades are listed in purchase order and replayed on load, so a
//! team's attribute table is rebuilt rather than stored. A file with only
//! tile rows is a bare map.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use tracing::debug;

use crate::game::{
    apply_upgrade, seller_of, Coord, GameState, Map, Phase, Piece, PieceKind, PieceRegistry,
    RuleSet, Team, TeamId, Teams, TileKind, UpgradeKind, MAX_RESOURCES,
};

/// Error raised while reading or writing a save file.
#[derive(Debug)]
pub enum SaveError {
    /// File could not be read or written.
    Io(io::Error),
    /// A line could not be understood.
    Syntax {
        /// 1-based line number.
        line: usize,
        /// What is wrong.
        message: String,
    },
    /// No tile rows, or rows of different lengths.
    BadMap,
    /// An owned upgrade cannot be bought given the upgrades listed before it.
    Upgrade {
        /// Team owning the upgrade.
        team: TeamId,
        /// The upgrade.
        upgrade: UpgradeKind,
    },
}

impl std::fmt::Display for SaveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Syntax { line, message } => write!(f, "line {line}: {message}"),
            Self::BadMap => write!(f, "map rows are missing or ragged"),
            Self::Upgrade { team, upgrade } => {
                write!(f, "{team} cannot own {upgrade} with the upgrades listed before it")
            }
        }
    }
}

impl std::error::Error for SaveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for SaveError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Tiles,
    Pieces,
    Teams,
    Upgrades,
    Meta,
}

struct PieceLine {
    line: usize,
    team: TeamId,
    kind: PieceKind,
    at: Coord,
    hp: Option<u32>,
}

fn syntax(line: usize, message: impl Into<String>) -> SaveError {
    SaveError::Syntax {
        line,
        message: message.into(),
    }
}

fn field<T: std::str::FromStr>(line: usize, raw: Option<&str>, what: &str) -> Result<T, SaveError> {
    let raw = raw.ok_or_else(|| syntax(line, format!("missing {what}")))?;
    raw.parse()
        .map_err(|_| syntax(line, format!("invalid {what}: {raw}")))
}

/// Parse a save file into a match using `rules` as the base rules.
///
/// # Errors
///
/// Returns an error for malformed lines, ragged maps, pieces off the map or
/// stacked on a tile, and upgrades that cannot be replayed in order.
pub fn parse_state(text: &str, rules: RuleSet) -> Result<GameState, SaveError> {
    let mut section = Section::Tiles;
    let mut rows = Vec::new();
    let mut pieces = Vec::new();
    let mut resources: BTreeMap<TeamId, u32> = BTreeMap::new();
    let mut upgrades: BTreeMap<TeamId, Vec<UpgradeKind>> = BTreeMap::new();
    let mut turn = 1;
    let mut phase = Phase::StartTurn;

    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(header) = trimmed.strip_prefix('#') {
            section = match header.trim().to_ascii_lowercase().as_str() {
                "pieces" => Section::Pieces,
                "teams" => Section::Teams,
                "upgrades" => Section::Upgrades,
                "meta" => Section::Meta,
                other => return Err(syntax(line, format!("unknown section: {other}"))),
            };
            continue;
        }

        match section {
            Section::Tiles => {
                let row = trimmed
                    .split_whitespace()
                    .map(|raw| {
                        raw.parse::<u8>()
                            .ok()
                            .and_then(TileKind::from_u8)
                            .ok_or_else(|| syntax(line, format!("invalid tile: {raw}")))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                rows.push(row);
            }
            Section::Pieces => {
                let mut parts = trimmed.split_whitespace();
                let x = field(line, parts.next(), "x")?;
                let y = field(line, parts.next(), "y")?;
                let team = field(line, parts.next(), "team")?;
                let kind = field(line, parts.next(), "piece kind")?;
                let hp = parts.next().map(|raw| field(line, Some(raw), "hp")).transpose()?;
                if parts.next().is_some() {
                    return Err(syntax(line, "trailing fields"));
                }
                pieces.push(PieceLine {
                    line,
                    team,
                    kind,
                    at: Coord::new(x, y),
                    hp,
                });
            }
            Section::Teams => {
                let mut parts = trimmed.split_whitespace();
                let team = field(line, parts.next(), "team")?;
                let amount = field(line, parts.next(), "resources")?;
                if amount > MAX_RESOURCES {
                    return Err(syntax(line, format!("resources {amount} above {MAX_RESOURCES}")));
                }
                resources.insert(team, amount);
            }
            Section::Upgrades => {
                let (team, list) = trimmed
                    .split_once('|')
                    .ok_or_else(|| syntax(line, "expected TEAM|UPGRADES"))?;
                let team = field(line, Some(team.trim()), "team")?;
                let owned = list
                    .split_whitespace()
                    .map(|raw| field(line, Some(raw), "upgrade"))
                    .collect::<Result<Vec<UpgradeKind>, _>>()?;
                upgrades.entry(team).or_default().extend(owned);
            }
            Section::Meta => {
                let mut parts = trimmed.split_whitespace();
                match parts.next() {
                    Some("turn") => turn = field(line, parts.next(), "turn")?,
                    Some("phase") => phase = field(line, parts.next(), "phase")?,
                    Some(other) => return Err(syntax(line, format!("unknown meta key: {other}"))),
                    None => {}
                }
            }
        }
    }

    let map = Map::from_rows(rows).ok_or(SaveError::BadMap)?;
    if turn == 0 {
        return Err(syntax(0, "turn numbers start at 1"));
    }

    let mut teams = Teams::new();
    let named = resources
        .keys()
        .chain(upgrades.keys())
        .copied()
        .chain(pieces.iter().map(|p| p.team));
    for id in named {
        teams
            .entry(id)
            .or_insert_with(|| Team::new(id, 0, &rules.attributes));
    }
    for (id, amount) in &resources {
        if let Some(team) = teams.get_mut(id) {
            team.resources = *amount;
        }
    }
    for (id, owned) in &upgrades {
        let Some(team) = teams.get_mut(id) else {
            continue;
        };
        for upgrade in owned {
            let seller = seller_of(team, *upgrade).ok_or(SaveError::Upgrade {
                team: *id,
                upgrade: *upgrade,
            })?;
            apply_upgrade(team, &rules, seller, *upgrade);
        }
    }

    let mut registry = PieceRegistry::new();
    for entry in pieces {
        if !map.in_bounds(entry.at) {
            return Err(syntax(entry.line, format!("{} is off the map", entry.at)));
        }
        if registry.get(entry.at, entry.team).is_some() {
            return Err(syntax(entry.line, format!("{} already has a piece at {}", entry.team, entry.at)));
        }
        let Some(team) = teams.get(&entry.team) else {
            continue;
        };
        let mut piece = Piece::new(entry.team, entry.kind, entry.at, team.attrs(entry.kind));
        if let Some(hp) = entry.hp {
            if hp == 0 || hp > piece.max_hp {
                return Err(syntax(entry.line, format!("hp {hp} outside 1..={}", piece.max_hp)));
            }
            piece.hp = hp;
        }
        registry.register(piece);
    }

    for team in teams.values_mut() {
        if registry.team_count(team.id) == 0 {
            team.eliminate();
        }
    }

    debug!(pieces = registry.len(), teams = teams.len(), turn, %phase, "save parsed");
    let mut state = GameState::from_parts(map, rules, teams, registry);
    state.restore_phase(phase, turn);
    Ok(state)
}

/// Render `state` in the save format.
#[must_use]
pub fn write_state(state: &GameState) -> String {
    let mut out = String::new();

    for row in state.map.rows() {
        let line: Vec<String> = row.iter().map(|tile| tile.as_u8().to_string()).collect();
        out.push_str(&line.join(" "));
        out.push('\n');
    }

    out.push_str("# Pieces\n");
    for piece in state.registry.iter() {
        out.push_str(&format!(
            "{} {} {} {} {}\n",
            piece.position.x, piece.position.y, piece.team, piece.kind, piece.hp
        ));
    }

    out.push_str("# Teams\n");
    for team in state.teams.values() {
        out.push_str(&format!("{} {}\n", team.id, team.resources));
    }

    let owning: Vec<&Team> = state.teams.values().filter(|t| !t.owned.is_empty()).collect();
    if !owning.is_empty() {
        out.push_str("# Upgrades\n");
        for team in owning {
            let names: Vec<&str> = team.owned.iter().map(|u| u.name()).collect();
            out.push_str(&format!("{}|{}\n", team.id, names.join(" ")));
        }
    }

    out.push_str("# Meta\n");
    out.push_str(&format!("turn {}\n", state.turn()));
    out.push_str(&format!("phase {}\n", state.phase()));
    out
}

/// Read a save file from disk.
///
/// # Errors
///
/// Returns an error if the file cannot be read or does not parse.
pub fn load(path: &Path, rules: RuleSet) -> Result<GameState, SaveError> {
    let text = fs::read_to_string(path)?;
    parse_state(&text, rules)
}

/// Write `state` to disk.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn save(state: &GameState, path: &Path) -> Result<(), SaveError> {
    fs::write(path, write_state(state))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::check_invariants;

    const SAMPLE: &str = "\
0 0 3 0
0 1 0 0
0 0 0 2
# Pieces
0 0 RED BASE
3 0 RED TROOPER 4
3 2 BLUE BASE 15
# Teams
RED 12
BLUE 7
# Upgrades
RED|FORGING PLATING
# Meta
turn 4
phase ORDERS
";

    #[test]
    fn test_parse_sample() {
        let state = parse_state(SAMPLE, RuleSet::base()).unwrap();

        assert_eq!((state.map.width(), state.map.height()), (4, 3));
        assert_eq!(state.map.get(Coord::new(2, 0)), Some(TileKind::Resource));
        assert_eq!(state.registry.len(), 3);
        assert_eq!(state.teams[&TeamId::Red].resources, 12);
        assert_eq!(state.turn(), 4);
        assert_eq!(state.phase(), Phase::Orders);

        let base = state.registry.get(Coord::new(0, 0), TeamId::Red).unwrap();
        assert_eq!(base.hp, base.max_hp);
        assert_eq!(state.registry.get(Coord::new(3, 2), TeamId::Blue).unwrap().hp, 15);
        assert!(check_invariants(&state).is_empty());
    }

    #[test]
    fn test_upgrades_are_replayed() {
        let state = parse_state(SAMPLE, RuleSet::base()).unwrap();
        let red = &state.teams[&TeamId::Red];
        let base = RuleSet::base();
        let trooper = red.attrs(PieceKind::Trooper);

        assert_eq!(trooper.attack, base.attributes.get(PieceKind::Trooper).attack + 1);
        assert_eq!(trooper.armor, base.attributes.get(PieceKind::Trooper).armor + 2);
        assert_eq!(red.owned, vec![UpgradeKind::Forging, UpgradeKind::Plating]);
        assert!(!red.attrs(PieceKind::Base).upgrades.contains(&UpgradeKind::Forging));
    }

    #[test]
    fn test_upgrade_out_of_order_rejected() {
        let text = "0 0\n# Pieces\n0 0 RED BASE\n# Upgrades\nRED|PLATING FORGING\n";
        assert!(matches!(
            parse_state(text, RuleSet::base()),
            Err(SaveError::Upgrade {
                team: TeamId::Red,
                upgrade: UpgradeKind::Plating,
            })
        ));
    }

    #[test]
    fn test_write_then_parse_is_stable() {
        let state = parse_state(SAMPLE, RuleSet::base()).unwrap();
        let written = write_state(&state);
        let reparsed = parse_state(&written, RuleSet::base()).unwrap();

        assert_eq!(write_state(&reparsed), written);
        assert_eq!(reparsed.registry, state.registry);
        assert_eq!(reparsed.teams, state.teams);
    }

    #[test]
    fn test_write_layout() {
        let state = parse_state(SAMPLE, RuleSet::base()).unwrap();
        let expected = SAMPLE.replace("0 0 RED BASE\n", "0 0 RED BASE 20\n");
        assert_eq!(write_state(&state), expected);
    }

    #[test]
    fn test_bare_map_has_no_teams() {
        let state = parse_state("0 1\n2 3\n", RuleSet::base()).unwrap();
        assert!(state.teams.is_empty());
        assert_eq!(state.phase(), Phase::StartTurn);
        assert_eq!(state.turn(), 1);
    }

    #[test]
    fn test_syntax_errors_carry_line() {
        let err = parse_state("0 0\n# Pieces\n0 0 RED DRAGON\n", RuleSet::base()).unwrap_err();
        assert!(err.to_string().starts_with("line 3:"), "{err}");

        let err = parse_state("0 0\n0\n", RuleSet::base()).unwrap_err();
        assert!(matches!(err, SaveError::BadMap));

        let err = parse_state("0 9\n", RuleSet::base()).unwrap_err();
        assert!(err.to_string().contains("invalid tile"));
    }

    #[test]
    fn test_stacking_and_bad_hp_rejected() {
        let stacked = "0 0\n# Pieces\n0 0 RED TROOPER\n0 0 RED BUILDER\n";
        assert!(parse_state(stacked, RuleSet::base()).is_err());

        let overhealed = "0 0\n# Pieces\n0 0 RED TROOPER 99\n";
        assert!(parse_state(overhealed, RuleSet::base()).is_err());

        let off_map = "0 0\n# Pieces\n5 0 RED TROOPER\n";
        assert!(parse_state(off_map, RuleSet::base()).is_err());

        let hoarded = format!("0 0\n# Teams\nRED {}\n", MAX_RESOURCES + 1);
        assert!(parse_state(&hoarded, RuleSet::base()).is_err());
    }

    #[test]
    fn test_team_without_pieces_is_eliminated() {
        let text = "0 0\n# Pieces\n0 0 RED TROOPER\n# Teams\nRED 1\nBLUE 4\n";
        let state = parse_state(text, RuleSet::base()).unwrap();
        assert!(state.teams[&TeamId::Blue].eliminated);
        assert_eq!(state.active_teams().collect::<Vec<_>>(), vec![TeamId::Red]);
    }
}
