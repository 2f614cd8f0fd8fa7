//! CLI command implementations for Phalanx.

pub(crate) mod run;
pub(crate) mod tournament;
pub(crate) mod validate;

mod output;

use clap::ValueEnum;
use phalanx::game::{RuleSet, RulesError};
use std::error::Error;
use std::fmt;
use std::fs;
use std::path::Path;

/// Output format for the `run` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Output format for the `tournament` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum TournamentFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON output.
    Json,
    /// CSV format.
    Csv,
}

/// CLI error type.
#[derive(Debug)]
pub(crate) struct CliError {
    message: String,
}

impl CliError {
    /// Create a new CLI error.
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for CliError {}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        Self::new(e.to_string())
    }
}

impl From<phalanx::tournament::MatchError> for CliError {
    fn from(e: phalanx::tournament::MatchError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<phalanx::save::SaveError> for CliError {
    fn from(e: phalanx::save::SaveError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<RulesError> for CliError {
    fn from(e: RulesError) -> Self {
        Self::new(format!("Invalid rules: {e}"))
    }
}

/// Load a JSON rules file, or the built-in rules when none is given.
pub(crate) fn load_rules(path: Option<&Path>) -> Result<RuleSet, CliError> {
    let Some(path) = path else {
        return Ok(RuleSet::base());
    };
    let json = fs::read_to_string(path)
        .map_err(|e| CliError::new(format!("Failed to read {}: {e}", path.display())))?;
    Ok(RuleSet::from_json(&json)?)
}

/// Seed from the clock when none is given.
pub(crate) fn seed_or_now(seed: Option<u64>) -> u64 {
    seed.unwrap_or_else(|| {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(42)
    })
}
