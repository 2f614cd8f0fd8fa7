//! Output formatting utilities for CLI.

use phalanx::tournament::MatchResult;
use phalanx::TeamId;
use serde::Serialize;

/// Format a match result as human-readable text.
pub(super) fn format_text(result: &MatchResult) -> String {
    let mut output = String::new();

    output.push_str(&format!("Match Result (seed: {})\n", result.seed));
    if let Some(winner) = result.winner {
        output.push_str(&format!("  Winner: {winner}\n"));
    } else {
        output.push_str("  Winner: Draw\n");
    }
    output.push_str(&format!("  Turns: {}\n\n", result.turns_played));

    for stats in &result.team_stats {
        output.push_str(&format!(
            "  {:<7} {:>4} points  ({} pieces, {} buildings, {} resources, {} upgrades)",
            stats.team.name(),
            stats.score,
            stats.pieces,
            stats.structures,
            stats.resources,
            stats.upgrades
        ));
        if let Some(turn) = stats.eliminated_turn {
            output.push_str(&format!(" [eliminated turn {turn}]"));
        }
        output.push('\n');
    }

    output
}

/// Tournament statistics for aggregated results.
#[derive(Debug, Default)]
pub(super) struct TournamentStats {
    /// Total matches played.
    pub(super) games_played: u64,
    /// Matches that failed to run.
    pub(super) failed: u64,
    /// Win count per seat.
    pub(super) wins: Vec<u64>,
    /// Draw count.
    pub(super) draws: u64,
    /// Total score per seat.
    total_scores: Vec<f64>,
    /// Score sum of squares for std dev calculation.
    score_sq_sums: Vec<f64>,
    /// Total turns across all matches.
    total_turns: u64,
}

impl TournamentStats {
    /// Create new stats for n teams.
    pub(super) fn new(num_teams: usize) -> Self {
        Self {
            wins: vec![0; num_teams],
            total_scores: vec![0.0; num_teams],
            score_sq_sums: vec![0.0; num_teams],
            ..Self::default()
        }
    }

    /// Add a match result to the stats.
    pub(super) fn add_result(&mut self, result: &MatchResult) {
        self.games_played += 1;
        self.total_turns += u64::from(result.turns_played);

        let seat = result
            .winner
            .and_then(|winner| result.team_stats.iter().position(|s| s.team == winner));
        match seat {
            Some(idx) if idx < self.wins.len() => self.wins[idx] += 1,
            _ => self.draws += 1,
        }

        for (i, stats) in result.team_stats.iter().enumerate() {
            if i < self.total_scores.len() {
                let score = f64::from(stats.score);
                self.total_scores[i] += score;
                self.score_sq_sums[i] += score * score;
            }
        }
    }

    /// Record a match that did not finish.
    pub(super) fn add_failure(&mut self) {
        self.failed += 1;
    }

    /// Fold another partial aggregate into this one.
    pub(super) fn merge(&mut self, other: &Self) {
        self.games_played += other.games_played;
        self.failed += other.failed;
        self.draws += other.draws;
        self.total_turns += other.total_turns;
        for (mine, theirs) in self.wins.iter_mut().zip(&other.wins) {
            *mine += theirs;
        }
        for (mine, theirs) in self.total_scores.iter_mut().zip(&other.total_scores) {
            *mine += theirs;
        }
        for (mine, theirs) in self.score_sq_sums.iter_mut().zip(&other.score_sq_sums) {
            *mine += theirs;
        }
    }

    /// Get win rate for a seat (0.0-1.0).
    pub(super) fn win_rate(&self, seat: usize) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        self.wins.get(seat).copied().unwrap_or(0) as f64 / self.games_played as f64
    }

    /// Get draw rate (0.0-1.0).
    pub(super) fn draw_rate(&self) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        self.draws as f64 / self.games_played as f64
    }

    /// Get average score for a seat.
    pub(super) fn avg_score(&self, seat: usize) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        self.total_scores.get(seat).copied().unwrap_or(0.0) / self.games_played as f64
    }

    /// Get score standard deviation for a seat.
    pub(super) fn score_std_dev(&self, seat: usize) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        let n = self.games_played as f64;
        let mean = self.avg_score(seat);
        let sq_sum = self.score_sq_sums.get(seat).copied().unwrap_or(0.0);
        let variance = (sq_sum / n) - (mean * mean);
        if variance < 0.0 {
            0.0
        } else {
            variance.sqrt()
        }
    }

    /// Get average match length.
    pub(super) fn avg_turns(&self) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        self.total_turns as f64 / self.games_played as f64
    }
}

/// JSON-serializable tournament result.
#[derive(Debug, Serialize)]
pub(super) struct JsonTournamentResult {
    /// Total matches played.
    games_played: u64,
    /// Matches that failed to run.
    failed: u64,
    /// Per-team statistics.
    teams: Vec<JsonTournamentTeam>,
    /// Number of draws.
    draws: u64,
    /// Average match length in turns.
    avg_turns: f64,
}

/// JSON-serializable per-team tournament stats.
#[derive(Debug, Serialize)]
pub(super) struct JsonTournamentTeam {
    /// Team.
    team: TeamId,
    /// Number of wins.
    wins: u64,
    /// Win rate (0.0-1.0).
    win_rate: f64,
    /// Average score.
    avg_score: f64,
    /// Score standard deviation.
    score_std_dev: f64,
}

impl JsonTournamentResult {
    /// Create from stats and the seated teams.
    pub(super) fn from_stats(stats: &TournamentStats, teams: &[TeamId]) -> Self {
        let teams = teams
            .iter()
            .enumerate()
            .map(|(i, team)| JsonTournamentTeam {
                team: *team,
                wins: stats.wins.get(i).copied().unwrap_or(0),
                win_rate: stats.win_rate(i),
                avg_score: stats.avg_score(i),
                score_std_dev: stats.score_std_dev(i),
            })
            .collect();

        Self {
            games_played: stats.games_played,
            failed: stats.failed,
            teams,
            draws: stats.draws,
            avg_turns: stats.avg_turns(),
        }
    }
}

/// Format tournament stats as human-readable text.
pub(super) fn format_tournament_text(stats: &TournamentStats, teams: &[TeamId]) -> String {
    let mut output = String::new();

    output.push_str(&format!("Tournament Results ({} matches)\n", stats.games_played));
    output.push_str("========================================\n\n");

    output.push_str("Win Rates:\n");
    for (i, team) in teams.iter().enumerate() {
        let wins = stats.wins.get(i).copied().unwrap_or(0);
        let rate = stats.win_rate(i) * 100.0;
        output.push_str(&format!("  {:<7} {rate:.1}% ({wins} wins)\n", team.name()));
    }
    output.push_str(&format!("  Draws:  {} ({:.1}%)\n\n", stats.draws, stats.draw_rate() * 100.0));

    output.push_str("Average Scores:\n");
    for (i, team) in teams.iter().enumerate() {
        let avg = stats.avg_score(i);
        let std = stats.score_std_dev(i);
        output.push_str(&format!("  {:<7} {avg:.1} (+/- {std:.1})\n", team.name()));
    }

    output.push_str(&format!("\nAverage Match Length: {:.0} turns\n", stats.avg_turns()));
    if stats.failed > 0 {
        output.push_str(&format!("Failed Matches: {}\n", stats.failed));
    }

    output
}

/// Format tournament stats as CSV.
pub(super) fn format_tournament_csv(stats: &TournamentStats, teams: &[TeamId]) -> String {
    let mut output = String::new();

    // Header
    output.push_str("team,wins,win_rate,avg_score,score_std_dev\n");

    // Data rows
    for (i, team) in teams.iter().enumerate() {
        output.push_str(&format!(
            "{},{},{:.4},{:.2},{:.2}\n",
            team.name(),
            stats.wins.get(i).copied().unwrap_or(0),
            stats.win_rate(i),
            stats.avg_score(i),
            stats.score_std_dev(i)
        ));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use phalanx::tournament::TeamStats;

    fn result(winner: Option<TeamId>, scores: [u32; 2]) -> MatchResult {
        MatchResult {
            seed: 1,
            winner,
            turns_played: 10,
            team_stats: [TeamId::Red, TeamId::Blue]
                .into_iter()
                .zip(scores)
                .map(|(team, score)| TeamStats {
                    team,
                    pieces: 3,
                    structures: 1,
                    resources: 10,
                    upgrades: 0,
                    eliminated_turn: None,
                    score,
                })
                .collect(),
            elimination_order: Vec::new(),
        }
    }

    #[test]
    fn test_stats_add_and_merge() {
        let mut a = TournamentStats::new(2);
        a.add_result(&result(Some(TeamId::Blue), [10, 30]));
        let mut b = TournamentStats::new(2);
        b.add_result(&result(None, [20, 20]));
        b.add_failure();
        a.merge(&b);

        assert_eq!(a.games_played, 2);
        assert_eq!(a.failed, 1);
        assert_eq!(a.wins, vec![0, 1]);
        assert_eq!(a.draws, 1);
        assert!((a.avg_score(0) - 15.0).abs() < 1e-9);
        assert!((a.score_std_dev(0) - 5.0).abs() < 1e-9);
        assert!((a.win_rate(1) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_csv_has_row_per_team() {
        let mut stats = TournamentStats::new(2);
        stats.add_result(&result(Some(TeamId::Red), [30, 10]));
        let csv = format_tournament_csv(&stats, &[TeamId::Red, TeamId::Blue]);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("RED,1,1.0000"));
    }

    #[test]
    fn test_format_text_marks_draw() {
        let text = format_text(&result(None, [5, 5]));
        assert!(text.contains("Winner: Draw"));
        assert!(text.contains("BLUE"));
    }
}
