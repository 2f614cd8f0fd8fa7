//! Match runner for AI-vs-AI games.
//!
//! Provides a pure function interface: `(seed, config) -> MatchResult`
//!
//! The runner handles:
//! - Deterministic map generation and starting pieces
//! - One AI planner per team
//! - Driving the phase machine, with invariant checks after every phase
//! - Elimination tracking and final scoring

mod mapgen;

pub use mapgen::{generate_map, MapGenError, StartingArea, MIN_SIDE};

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::ai::AiPlanner;
use crate::error::OrderError;
use crate::game::{
    assert_invariants, AdvanceBlocked, GameState, Notification, Phase, PieceKind, RuleSet, TeamId,
};

/// Rounds in a row a runner tolerates ORDERS without progress.
const STALL_LIMIT: u32 = 3;

/// Configuration for a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchConfig {
    /// Turns played before the match is scored as it stands.
    pub max_turns: u32,
    /// Map width.
    pub map_width: u16,
    /// Map height.
    pub map_height: u16,
    /// Number of teams (2-4).
    pub teams: usize,
    /// Resources every team starts with.
    pub starting_resources: u32,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            max_turns: 200,
            map_width: 24,
            map_height: 24,
            teams: 2,
            starting_resources: 10,
        }
    }
}

/// Statistics for a single team at the end of a match.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamStats {
    /// The team.
    pub team: TeamId,
    /// Pieces still standing.
    pub pieces: usize,
    /// Buildings still standing.
    pub structures: usize,
    /// Resources in the pool.
    pub resources: u32,
    /// Upgrades owned.
    pub upgrades: usize,
    /// Turn the team was eliminated (None if it survived).
    pub eliminated_turn: Option<u32>,
    /// Final score.
    pub score: u32,
}

/// Final result of a match.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    /// The seed used for this match.
    pub seed: u64,
    /// The winning team (None on a draw).
    pub winner: Option<TeamId>,
    /// Turns played.
    pub turns_played: u32,
    /// Per-team statistics, in seating order.
    pub team_stats: Vec<TeamStats>,
    /// Elimination order (first eliminated is index 0).
    pub elimination_order: Vec<TeamId>,
}

/// Error type for match setup and play.
#[derive(Debug)]
pub enum MatchError {
    /// Team count outside 2..=4.
    TeamCount(usize),
    /// Map generation failed.
    MapGeneration(MapGenError),
    /// A planner's submission was refused.
    Order(OrderError),
    /// ORDERS kept blocking the match.
    Stalled {
        /// Turn the match stalled on.
        turn: u32,
    },
}

impl std::fmt::Display for MatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TeamCount(n) => write!(f, "Need 2 to {} teams, got {n}", TeamId::ALL.len()),
            Self::MapGeneration(e) => write!(f, "Map generation failed: {e}"),
            Self::Order(e) => write!(f, "Submission refused: {e}"),
            Self::Stalled { turn } => write!(f, "Match stalled in ORDERS on turn {turn}"),
        }
    }
}

impl std::error::Error for MatchError {}

impl From<OrderError> for MatchError {
    fn from(e: OrderError) -> Self {
        Self::Order(e)
    }
}

/// Generate the map and starting pieces for `seed`.
///
/// # Errors
///
/// Returns an error for a bad team count or map size.
pub fn setup_match(seed: u64, config: &MatchConfig, rules: RuleSet) -> Result<GameState, MatchError> {
    if !(2..=TeamId::ALL.len()).contains(&config.teams) {
        return Err(MatchError::TeamCount(config.teams));
    }
    let (map, starts) = generate_map(seed, config.map_width, config.map_height, config.teams)
        .map_err(MatchError::MapGeneration)?;

    let team_ids: Vec<TeamId> = starts.iter().map(|s| s.team).collect();
    let mut state = GameState::new(map, rules, &team_ids, config.starting_resources);
    for start in &starts {
        state.spawn(start.team, PieceKind::Base, start.base);
        state.spawn(start.team, PieceKind::Builder, start.builder);
        state.spawn(start.team, PieceKind::Trooper, start.trooper);
    }
    Ok(state)
}

/// Run a complete match with the built-in rules.
///
/// Given the same seed and config, this function always produces the same
/// `MatchResult`.
///
/// # Errors
///
/// Returns an error if setup fails or the match stalls.
pub fn run_match(seed: u64, config: &MatchConfig) -> Result<MatchResult, MatchError> {
    run_match_with_rules(seed, config, RuleSet::base())
}

/// Run a complete match with custom rules.
///
/// # Errors
///
/// Returns an error if setup fails or the match stalls.
pub fn run_match_with_rules(seed: u64, config: &MatchConfig, rules: RuleSet) -> Result<MatchResult, MatchError> {
    let state = setup_match(seed, config, rules)?;
    MatchRunner::new(state, seed, config.max_turns).run()
}

/// Let AI planners play an existing state to the end.
///
/// Used for matches resumed from a save file. Returns the final state too.
///
/// # Errors
///
/// Returns an error if the match stalls.
pub fn play_out(state: GameState, seed: u64, max_turns: u32) -> Result<(MatchResult, GameState), MatchError> {
    let mut runner = MatchRunner::new(state, seed, max_turns);
    runner.play()?;
    let result = runner.build_result();
    Ok((result, runner.state))
}

/// Drives one match.
struct MatchRunner {
    state: GameState,
    planners: Vec<AiPlanner>,
    seed: u64,
    max_turns: u32,
    elimination_order: Vec<TeamId>,
    eliminated_turn: BTreeMap<TeamId, u32>,
}

impl MatchRunner {
    fn new(state: GameState, seed: u64, max_turns: u32) -> Self {
        let planners = state.teams.keys().map(|team| AiPlanner::new(*team)).collect();
        Self {
            state,
            planners,
            seed,
            max_turns,
            elimination_order: Vec::new(),
            eliminated_turn: BTreeMap::new(),
        }
    }

    fn run(mut self) -> Result<MatchResult, MatchError> {
        self.play()?;
        Ok(self.build_result())
    }

    fn play(&mut self) -> Result<(), MatchError> {
        let mut stalled = 0;
        while !self.state.is_game_over() {
            if self.state.phase() == Phase::Orders {
                if self.state.turn() > self.max_turns {
                    info!(seed = self.seed, turns = self.max_turns, "turn limit reached");
                    break;
                }
                let before = self.state.phase();
                self.take_orders()?;
                if self.state.phase() == before {
                    stalled += 1;
                    if stalled >= STALL_LIMIT {
                        return Err(MatchError::Stalled {
                            turn: self.state.turn(),
                        });
                    }
                } else {
                    stalled = 0;
                }
            } else {
                match self.state.advance() {
                    Ok(_) | Err(AdvanceBlocked::GameOver) => {}
                    Err(blocked) => {
                        warn!(seed = self.seed, %blocked, "advance blocked outside ORDERS");
                        return Err(MatchError::Stalled {
                            turn: self.state.turn(),
                        });
                    }
                }
            }
            assert_invariants(&self.state);
            self.dispatch();
        }
        Ok(())
    }

    /// Every active team that has not submitted plans and submits.
    fn take_orders(&mut self) -> Result<(), MatchError> {
        for planner in &mut self.planners {
            let team = planner.team();
            let active = self.state.active_teams().any(|t| t == team);
            if !active || self.state.controller().is_submitted(team) {
                continue;
            }
            if self.state.phase() != Phase::Orders {
                break;
            }
            planner.take_turn(&mut self.state)?;
        }
        Ok(())
    }

    /// Hand the latest notifications to the planners and record eliminations.
    fn dispatch(&mut self) {
        let events = self.state.drain_notifications();
        for event in &events {
            if let Notification::TeamEliminated { team } = event {
                debug!(seed = self.seed, %team, turn = self.state.turn(), "eliminated");
                self.elimination_order.push(*team);
                self.eliminated_turn.insert(*team, self.state.turn());
            }
        }
        for planner in &mut self.planners {
            planner.observe(&events);
        }
    }

    fn build_result(&self) -> MatchResult {
        let team_stats: Vec<TeamStats> = self
            .state
            .teams
            .values()
            .map(|team| {
                let pieces = self.state.registry.team_count(team.id);
                let structures = self
                    .state
                    .registry
                    .team_pieces(team.id)
                    .filter(|p| team.attrs(p.kind).is_structure())
                    .count();
                TeamStats {
                    team: team.id,
                    pieces,
                    structures,
                    resources: team.resources,
                    upgrades: team.owned.len(),
                    eliminated_turn: self.eliminated_turn.get(&team.id).copied(),
                    score: score(&self.state, team.id),
                }
            })
            .collect();

        let winner = self.state.winner().or_else(|| {
            if self.state.is_game_over() {
                return None;
            }
            let best = team_stats
                .iter()
                .filter(|s| s.eliminated_turn.is_none())
                .map(|s| s.score)
                .max()?;
            let mut leaders = team_stats
                .iter()
                .filter(|s| s.eliminated_turn.is_none() && s.score == best);
            match (leaders.next(), leaders.next()) {
                (Some(leader), None) => Some(leader.team),
                _ => None,
            }
        });

        MatchResult {
            seed: self.seed,
            winner,
            turns_played: self.state.turn().min(self.max_turns),
            team_stats,
            elimination_order: self.elimination_order.clone(),
        }
    }
}

/// Material score: resources, the price of every standing piece and the
/// price of every owned upgrade.
#[must_use]
pub fn score(state: &GameState, team: TeamId) -> u32 {
    let Some(owner) = state.teams.get(&team) else {
        return 0;
    };
    let pieces: u32 = state
        .registry
        .team_pieces(team)
        .map(|p| owner.attrs(p.kind).price)
        .sum();
    let upgrades: u32 = owner
        .owned
        .iter()
        .filter_map(|u| state.rules.upgrade_price(*u))
        .sum();
    owner.resources + pieces + upgrades
}

#[cfg(test)]
mod tests {
    use super::*;

    fn short_config() -> MatchConfig {
        MatchConfig {
            max_turns: 15,
            map_width: 16,
            map_height: 16,
            ..MatchConfig::default()
        }
    }

    #[test]
    fn test_match_error_display() {
        let err = MatchError::TeamCount(1);
        assert!(format!("{err}").contains("got 1"));

        let err = MatchError::Stalled { turn: 7 };
        assert!(format!("{err}").contains("turn 7"));
    }

    #[test]
    fn test_match_config_default() {
        let config = MatchConfig::default();
        assert_eq!(config.max_turns, 200);
        assert_eq!(config.map_width, 24);
        assert_eq!(config.map_height, 24);
        assert_eq!(config.teams, 2);
        assert_eq!(config.starting_resources, 10);
    }

    #[test]
    fn test_team_count_rejected() {
        let config = MatchConfig {
            teams: 5,
            ..short_config()
        };
        assert!(matches!(run_match(42, &config), Err(MatchError::TeamCount(5))));
    }

    #[test]
    fn test_setup_places_starting_pieces() {
        let state = setup_match(7, &short_config(), RuleSet::base()).unwrap();
        assert_eq!(state.registry.len(), 6);
        for team in [TeamId::Red, TeamId::Blue] {
            assert_eq!(state.registry.team_count(team), 3);
        }
    }

    #[test]
    fn test_run_match_deterministic() {
        let config = short_config();
        let a = run_match(42, &config).unwrap();
        let b = run_match(42, &config).unwrap();
        assert_eq!(a, b);
        assert!(a.turns_played <= config.max_turns);
        assert_eq!(a.team_stats.len(), 2);
    }

    #[test]
    fn test_score_counts_material() {
        let state = setup_match(7, &short_config(), RuleSet::base()).unwrap();
        // Base 20 + builder 3 + trooper 3 + 10 starting resources.
        assert_eq!(score(&state, TeamId::Red), 36);
        assert_eq!(score(&state, TeamId::Green), 0);
    }
}
