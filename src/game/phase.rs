//! Turn phase state machine.
//!
//! The controller owns the phase enum, the turn counter and the submission
//! barrier. It knows nothing about pieces: leaving ORDERS is gated on a
//! caller-supplied validation callback, every other transition is
//! unconditional.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::game::TeamId;

/// Stages of a turn, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    /// Income is produced.
    StartTurn,
    /// Teams attach orders and submit.
    Orders,
    /// Builds, upgrades and demolitions execute.
    ExecuteBuild,
    /// Moves execute.
    ExecuteMove,
    /// Melee resolves on contested tiles.
    ExecuteCombat,
    /// Ranged attacks resolve.
    ExecuteRanged,
    /// Heals and terraforming execute.
    ExecuteSpecial,
}

impl Phase {
    /// All phases in order.
    pub const ALL: [Phase; 7] = [
        Phase::StartTurn,
        Phase::Orders,
        Phase::ExecuteBuild,
        Phase::ExecuteMove,
        Phase::ExecuteCombat,
        Phase::ExecuteRanged,
        Phase::ExecuteSpecial,
    ];

    /// The phase after this one, wrapping to [`Phase::StartTurn`].
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::StartTurn => Self::Orders,
            Self::Orders => Self::ExecuteBuild,
            Self::ExecuteBuild => Self::ExecuteMove,
            Self::ExecuteMove => Self::ExecuteCombat,
            Self::ExecuteCombat => Self::ExecuteRanged,
            Self::ExecuteRanged => Self::ExecuteSpecial,
            Self::ExecuteSpecial => Self::StartTurn,
        }
    }

    /// Whether orders execute in this phase.
    #[must_use]
    pub const fn is_execute(self) -> bool {
        !matches!(self, Self::StartTurn | Self::Orders)
    }

    /// Name used in save files and logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::StartTurn => "START_TURN",
            Self::Orders => "ORDERS",
            Self::ExecuteBuild => "EXECUTE_BUILD",
            Self::ExecuteMove => "EXECUTE_MOVE",
            Self::ExecuteCombat => "EXECUTE_COMBAT",
            Self::ExecuteRanged => "EXECUTE_RANGED",
            Self::ExecuteSpecial => "EXECUTE_SPECIAL",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|phase| phase.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown phase: {s}"))
    }
}

/// A completed phase change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// Phase left.
    pub from: Phase,
    /// Phase entered.
    pub to: Phase,
    /// Turn number after the change.
    pub turn: u32,
}

/// Why the controller refused to leave the current phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvanceBlocked {
    /// Some active teams have not submitted yet.
    AwaitingSubmissions(Vec<TeamId>),
    /// These teams failed validation and were un-submitted.
    Rejected(Vec<TeamId>),
    /// The match has ended.
    GameOver,
}

impl fmt::Display for AdvanceBlocked {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AwaitingSubmissions(teams) => write!(f, "waiting for {teams:?} to submit"),
            Self::Rejected(teams) => write!(f, "orders rejected for {teams:?}"),
            Self::GameOver => write!(f, "the match is over"),
        }
    }
}

impl std::error::Error for AdvanceBlocked {}

/// The phase state machine and submission barrier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnController {
    phase: Phase,
    turn: u32,
    active: BTreeSet<TeamId>,
    submitted: BTreeSet<TeamId>,
}

impl TurnController {
    /// A controller for `teams`, at START_TURN of turn 1.
    pub fn new(teams: impl IntoIterator<Item = TeamId>) -> Self {
        Self {
            phase: Phase::StartTurn,
            turn: 1,
            active: teams.into_iter().collect(),
            submitted: BTreeSet::new(),
        }
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Current turn number.
    #[must_use]
    pub const fn turn(&self) -> u32 {
        self.turn
    }

    /// Teams still taking part in the barrier.
    pub fn active_teams(&self) -> impl Iterator<Item = TeamId> + '_ {
        self.active.iter().copied()
    }

    /// Whether `team` has submitted this turn.
    #[must_use]
    pub fn is_submitted(&self, team: TeamId) -> bool {
        self.submitted.contains(&team)
    }

    /// Active teams that have not submitted.
    #[must_use]
    pub fn pending(&self) -> Vec<TeamId> {
        self.active.difference(&self.submitted).copied().collect()
    }

    /// Whether every active team has submitted.
    #[must_use]
    pub fn all_submitted(&self) -> bool {
        self.active.is_subset(&self.submitted)
    }

    /// Mark `team` submitted. Returns `false` outside ORDERS or for an unknown team.
    pub fn submit(&mut self, team: TeamId) -> bool {
        if self.phase != Phase::Orders || !self.active.contains(&team) {
            return false;
        }
        self.submitted.insert(team);
        true
    }

    /// Withdraw `team`'s submission. Returns `false` if it had not submitted.
    pub fn revise(&mut self, team: TeamId) -> bool {
        self.phase == Phase::Orders && self.submitted.remove(&team)
    }

    /// Drop an eliminated team from the barrier.
    pub fn remove_team(&mut self, team: TeamId) {
        self.active.remove(&team);
        self.submitted.remove(&team);
    }

    /// Jump to a saved phase and turn. Submissions are cleared.
    pub fn restore(&mut self, phase: Phase, turn: u32) {
        self.phase = phase;
        self.turn = turn;
        self.submitted.clear();
    }

    /// Step to the next phase.
    ///
    /// Leaving ORDERS requires every active team to have submitted and
    /// `validate` to accept every active team; all teams are validated even
    /// after a failure, and each failing team is un-submitted.
    ///
    /// # Errors
    ///
    /// Returns why the controller stayed in ORDERS.
    pub fn advance<F>(&mut self, mut validate: F) -> Result<Transition, AdvanceBlocked>
    where
        F: FnMut(TeamId) -> bool,
    {
        if self.phase == Phase::Orders {
            if !self.all_submitted() {
                return Err(AdvanceBlocked::AwaitingSubmissions(self.pending()));
            }
            let rejected: Vec<TeamId> = self
                .active
                .iter()
                .copied()
                .filter(|team| !validate(*team))
                .collect();
            if !rejected.is_empty() {
                for team in &rejected {
                    self.submitted.remove(team);
                }
                debug!(?rejected, turn = self.turn, "orders rejected");
                return Err(AdvanceBlocked::Rejected(rejected));
            }
            self.submitted.clear();
        }

        let from = self.phase;
        self.phase = from.next();
        if self.phase == Phase::StartTurn {
            self.turn += 1;
            info!(turn = self.turn, "turn started");
        }
        debug!(%from, to = %self.phase, turn = self.turn, "phase changed");
        Ok(Transition {
            from,
            to: self.phase,
            turn: self.turn,
        })
    }
}
