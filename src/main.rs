//! Phalanx CLI - Command-line interface for running Phalanx matches.

// Allow print in the CLI binary
#![allow(clippy::print_stdout, clippy::print_stderr)]

mod cli;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Phalanx - A deterministic simultaneous-turn battle engine
#[derive(Parser, Debug)]
#[command(name = "phalanx")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a single AI-vs-AI match
    Run {
        /// Random seed (default: random)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Resume from a save file instead of generating a map
        #[arg(long)]
        load: Option<PathBuf>,

        /// JSON rules file (default: built-in rules)
        #[arg(long)]
        rules: Option<PathBuf>,

        /// Maximum turns (default: 200)
        #[arg(short, long, default_value = "200")]
        turns: u32,

        /// Number of teams (2-4)
        #[arg(long, default_value = "2")]
        teams: usize,

        /// Map width
        #[arg(long, default_value = "24")]
        width: u16,

        /// Map height
        #[arg(long, default_value = "24")]
        height: u16,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,

        /// Save the final state to file
        #[arg(long)]
        save: Option<PathBuf>,

        /// Suppress the header
        #[arg(short, long)]
        quiet: bool,
    },

    /// Run many matches in parallel and aggregate statistics
    Tournament {
        /// Number of matches to run (default: 100)
        #[arg(short, long, default_value = "100")]
        games: u64,

        /// Starting seed (increments for each match)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Parallel threads (default: CPU count)
        #[arg(short = 'j', long)]
        threads: Option<usize>,

        /// Maximum turns per match (default: 200)
        #[arg(short = 't', long)]
        max_turns: Option<u32>,

        /// Number of teams (2-4)
        #[arg(long, default_value = "2")]
        teams: usize,

        /// JSON rules file (default: built-in rules)
        #[arg(long)]
        rules: Option<PathBuf>,

        /// Output format: text, json, or csv
        #[arg(short, long, default_value = "text")]
        format: cli::TournamentFormat,

        /// Show progress bar
        #[arg(short, long)]
        progress: bool,
    },

    /// Load a save file and check it for invariant violations
    Validate {
        /// Save file to validate
        #[arg(required = true)]
        save_file: PathBuf,

        /// JSON rules file (default: built-in rules)
        #[arg(long)]
        rules: Option<PathBuf>,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    let result = match args.command {
        Commands::Run {
            seed,
            load,
            rules,
            turns,
            teams,
            width,
            height,
            format,
            save,
            quiet,
        } => cli::run::execute(&cli::run::RunOptions {
            seed,
            load,
            rules,
            turns,
            teams,
            width,
            height,
            format,
            save,
            quiet,
        }),

        Commands::Tournament {
            games,
            seed,
            threads,
            max_turns,
            teams,
            rules,
            format,
            progress,
        } => cli::tournament::execute(games, seed, threads, max_turns, teams, rules.as_deref(), format, progress),

        Commands::Validate { save_file, rules } => cli::validate::execute(&save_file, rules.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
