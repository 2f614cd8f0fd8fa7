//! Tournament command implementation.

use super::output::{format_tournament_csv, format_tournament_text, JsonTournamentResult, TournamentStats};
use super::{load_rules, seed_or_now, CliError, TournamentFormat};
use indicatif::{ProgressBar, ProgressStyle};
use phalanx::tournament::{run_match_with_rules, MatchConfig};
use phalanx::TeamId;
use rayon::prelude::*;
use std::path::Path;
use std::time::Instant;
use tracing::warn;

/// Execute the tournament command.
///
/// # Errors
///
/// Returns an error if the rules cannot be loaded or the output fails.
#[allow(clippy::too_many_arguments)]
pub(crate) fn execute(
    games: u64,
    seed: Option<u64>,
    threads: Option<usize>,
    max_turns: Option<u32>,
    teams: usize,
    rules: Option<&Path>,
    format: TournamentFormat,
    progress: bool,
) -> Result<(), CliError> {
    if !(2..=TeamId::ALL.len()).contains(&teams) {
        return Err(CliError::new(format!("Need 2 to {} teams, got {teams}", TeamId::ALL.len())));
    }
    let rules = load_rules(rules)?;
    let seated = &TeamId::ALL[..teams];

    // Set thread pool size if specified
    if let Some(num_threads) = threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
            .ok(); // Ignore error if already initialized
    }

    let base_seed = seed_or_now(seed);

    let mut config = MatchConfig {
        teams,
        ..MatchConfig::default()
    };
    if let Some(t) = max_turns {
        config.max_turns = t;
    }

    // Progress bar
    let pb = if progress {
        let pb = ProgressBar::new(games);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} matches ({per_sec})")
            .map_err(|e| CliError::new(format!("Invalid progress template: {e}")))?
            .progress_chars("=>-");
        pb.set_style(style);
        Some(pb)
    } else {
        None
    };

    let start = Instant::now();

    // Each thread accumulates into its own TournamentStats, merged at the end
    let stats = (0..games)
        .into_par_iter()
        .fold(
            || TournamentStats::new(teams),
            |mut local_stats, i| {
                let match_seed = base_seed.wrapping_add(i);
                match run_match_with_rules(match_seed, &config, rules.clone()) {
                    Ok(result) => local_stats.add_result(&result),
                    Err(e) => {
                        warn!(seed = match_seed, error = %e, "match failed");
                        local_stats.add_failure();
                    }
                }
                if let Some(pb) = &pb {
                    pb.inc(1);
                }
                local_stats
            },
        )
        .reduce(
            || TournamentStats::new(teams),
            |mut a, b| {
                a.merge(&b);
                a
            },
        );

    if let Some(pb) = pb {
        pb.finish_with_message("done");
    }

    let duration = start.elapsed();
    let games_per_sec = if duration.as_secs_f64() > 0.0 {
        stats.games_played as f64 / duration.as_secs_f64()
    } else {
        0.0
    };

    match format {
        TournamentFormat::Text => {
            println!();
            print!("{}", format_tournament_text(&stats, seated));
            println!();
            println!("Duration: {:.2}s ({:.0} matches/sec)", duration.as_secs_f64(), games_per_sec);
        }
        TournamentFormat::Json => {
            let json_result = JsonTournamentResult::from_stats(&stats, seated);
            let json = serde_json::to_string_pretty(&json_result)
                .map_err(|e| CliError::new(format!("JSON serialization failed: {e}")))?;
            println!("{json}");
        }
        TournamentFormat::Csv => {
            print!("{}", format_tournament_csv(&stats, seated));
        }
    }

    Ok(())
}
