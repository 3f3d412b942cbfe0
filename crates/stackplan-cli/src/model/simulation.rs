use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stackplan_engine::{BitBoard, GameStats, PieceSeed};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimulationReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub agent: AgentSettings,
    pub max_steps: usize,
    pub games: Vec<GameRecord>,
    pub summary: SimulationSummary,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AgentSettings {
    pub policy: String,
    pub workers: usize,
    pub weights: BTreeMap<String, f32>,
}

/// Outcome of one simulated game.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GameRecord {
    pub game: usize,
    pub seed: PieceSeed,
    /// Primitive moves applied.
    pub steps: usize,
    /// `false` when the game stopped at the step limit.
    pub game_over: bool,
    pub stats: GameStats,
    pub final_board: BitBoard,
    pub elapsed_secs: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct SimulationSummary {
    pub games: usize,
    pub games_over: usize,
    pub mean_score: f64,
    pub mean_pieces: f64,
    pub mean_cleared_lines: f64,
    pub best_score: usize,
}

impl SimulationSummary {
    #[expect(clippy::cast_precision_loss)]
    pub fn from_records(records: &[GameRecord]) -> Self {
        if records.is_empty() {
            return Self::default();
        }
        let n = records.len() as f64;
        let mean = |f: fn(&GameStats) -> usize| {
            records.iter().map(|r| f(&r.stats) as f64).sum::<f64>() / n
        };
        Self {
            games: records.len(),
            games_over: records.iter().filter(|r| r.game_over).count(),
            mean_score: mean(GameStats::score),
            mean_pieces: mean(GameStats::completed_pieces),
            mean_cleared_lines: mean(GameStats::total_cleared_lines),
            best_score: records.iter().map(|r| r.stats.score()).max().unwrap_or(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(game: usize, drops: &[usize], game_over: bool) -> GameRecord {
        let mut stats = GameStats::new();
        for &lines in drops {
            stats.complete_piece_drop(lines);
        }
        GameRecord {
            game,
            seed: PieceSeed::from(game as u64),
            steps: drops.len() * 3,
            game_over,
            stats,
            final_board: BitBoard::INITIAL,
            elapsed_secs: 0.0,
        }
    }

    #[test]
    fn test_summary_of_nothing() {
        assert_eq!(
            SimulationSummary::from_records(&[]),
            SimulationSummary::default()
        );
    }

    #[test]
    fn test_summary_means() {
        let records = [
            record(0, &[0, 0, 1], true),
            record(1, &[0, 4, 0, 0, 2], false),
        ];
        let summary = SimulationSummary::from_records(&records);
        assert_eq!(summary.games, 2);
        assert_eq!(summary.games_over, 1);
        assert_eq!(summary.best_score, 1100);
        assert!((summary.mean_score - 600.0).abs() < 1e-9);
        assert!((summary.mean_pieces - 4.0).abs() < 1e-9);
        assert!((summary.mean_cleared_lines - 3.5).abs() < 1e-9);
    }
}
