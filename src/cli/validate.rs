//! Save file validation command implementation.

use super::{load_rules, CliError};
use phalanx::game::check_invariants;
use phalanx::save;
use std::path::Path;

/// Execute the validate command.
///
/// # Errors
///
/// Returns an error if the file cannot be loaded or breaks an invariant.
pub(crate) fn execute(save_file: &Path, rules: Option<&Path>) -> Result<(), CliError> {
    let rules = load_rules(rules)?;

    println!("Validating: {}", save_file.display());
    println!();

    let state = save::load(save_file, rules)?;
    print_check("Save file parses", true);

    println!();
    println!("Summary:");
    println!("  Map:      {}x{}", state.map.width(), state.map.height());
    println!("  Turn:     {} ({})", state.turn(), state.phase());
    println!("  Pieces:   {}", state.registry.len());
    for team in state.teams.values() {
        let status = if team.eliminated { " [eliminated]" } else { "" };
        println!(
            "  {:<8}  {} pieces, {} resources, {} upgrades{status}",
            team.id.name(),
            state.registry.team_count(team.id),
            team.resources,
            team.owned.len()
        );
    }
    println!();

    let violations = check_invariants(&state);
    print_check("Invariants hold", violations.is_empty());
    for violation in &violations {
        println!("    {violation}");
    }
    if !violations.is_empty() {
        return Err(CliError::new(format!("{} invariant violation(s)", violations.len())));
    }

    println!();
    println!("Validation successful!");

    Ok(())
}

fn print_check(name: &str, ok: bool) {
    let mark = if ok { "OK" } else { "FAILED" };
    println!("  {name:<20} {mark}");
}
