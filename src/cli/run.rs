//! Run command implementation.

use super::output::format_text;
use super::{load_rules, seed_or_now, CliError, OutputFormat};
use phalanx::save;
use phalanx::tournament::{play_out, setup_match, MatchConfig};
use std::path::PathBuf;

/// Options of the run command.
#[derive(Debug)]
pub(crate) struct RunOptions {
    pub(crate) seed: Option<u64>,
    pub(crate) load: Option<PathBuf>,
    pub(crate) rules: Option<PathBuf>,
    pub(crate) turns: u32,
    pub(crate) teams: usize,
    pub(crate) width: u16,
    pub(crate) height: u16,
    pub(crate) format: OutputFormat,
    pub(crate) save: Option<PathBuf>,
    pub(crate) quiet: bool,
}

/// Execute the run command.
///
/// # Errors
///
/// Returns an error if the match cannot be set up or fails to run.
pub(crate) fn execute(options: &RunOptions) -> Result<(), CliError> {
    let rules = load_rules(options.rules.as_deref())?;
    let seed = seed_or_now(options.seed);

    let state = if let Some(path) = &options.load {
        if !options.quiet {
            println!("Resuming {} with seed {seed}...", path.display());
        }
        save::load(path, rules)?
    } else {
        let config = MatchConfig {
            max_turns: options.turns,
            map_width: options.width,
            map_height: options.height,
            teams: options.teams,
            ..MatchConfig::default()
        };
        if !options.quiet {
            println!(
                "Running {}-team match on {}x{} with seed {seed}...",
                config.teams, config.map_width, config.map_height
            );
        }
        setup_match(seed, &config, rules)?
    };
    if !options.quiet {
        println!();
    }

    let (result, final_state) = play_out(state, seed, options.turns)?;

    if let Some(path) = &options.save {
        save::save(&final_state, path)?;
        if !options.quiet {
            println!("Final state saved to: {}", path.display());
            println!();
        }
    }

    match options.format {
        OutputFormat::Text => {
            print!("{}", format_text(&result));
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&result)
                .map_err(|e| CliError::new(format!("JSON serialization failed: {e}")))?;
            println!("{json}");
        }
    }

    Ok(())
}
