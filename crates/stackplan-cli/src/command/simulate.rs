use std::{iter, path::PathBuf, thread, time::Instant};

use anyhow::Context;
use chrono::Utc;
use stackplan_engine::{GameWorld, PieceSeed};
use stackplan_evaluator::board_feature::BoardFeature as _;
use tracing::info;

use crate::{
    command::agent_arg::{AgentArg, AgentFactory},
    model::simulation::{AgentSettings, GameRecord, SimulationReport, SimulationSummary},
    util,
};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct SimulateArg {
    /// Number of games to play
    #[arg(long, default_value_t = 1)]
    games: usize,
    /// Seed of the first game; game `i` uses `seed + i` [default: random]
    #[arg(long)]
    seed: Option<u64>,
    /// Primitive moves after which a game is stopped
    #[arg(long, default_value_t = 50_000)]
    max_steps: usize,
    /// Play the games on separate threads
    #[arg(long, default_value_t = false)]
    parallel_games: bool,
    /// Output file path for the JSON report
    #[arg(long)]
    output: Option<PathBuf>,
    #[clap(flatten)]
    agent: AgentArg,
}

pub(crate) fn run(arg: &SimulateArg) -> anyhow::Result<()> {
    let SimulateArg {
        games,
        seed,
        max_steps,
        parallel_games,
        output,
        agent,
    } = arg;

    let factory = AgentFactory::from_arg(agent)?;
    let base_seed = seed.unwrap_or_else(rand::random);
    info!(
        games,
        base_seed,
        policy = ?factory.policy,
        workers = agent.workers(),
        "starting simulation"
    );

    let started_at = Utc::now();
    let records = play_games(&factory, *games, base_seed, *max_steps, *parallel_games)?;
    let finished_at = Utc::now();

    let summary = SimulationSummary::from_records(&records);
    info!(
        games = summary.games,
        games_over = summary.games_over,
        mean_score = summary.mean_score,
        mean_pieces = summary.mean_pieces,
        mean_cleared_lines = summary.mean_cleared_lines,
        best_score = summary.best_score,
        "simulation finished"
    );

    let report = SimulationReport {
        started_at,
        finished_at,
        agent: AgentSettings {
            policy: format!("{:?}", factory.policy),
            workers: agent.workers(),
            weights: iter::zip(factory.model.features(), factory.model.weights())
                .map(|(feature, weight)| (feature.id().to_owned(), *weight))
                .collect(),
        },
        max_steps: *max_steps,
        games: records,
        summary,
    };
    util::write_json(&report, output.as_deref())
}

fn play_games(
    factory: &AgentFactory,
    games: usize,
    base_seed: u64,
    max_steps: usize,
    parallel: bool,
) -> anyhow::Result<Vec<GameRecord>> {
    let seed_of = |game: usize| base_seed.wrapping_add(game as u64);
    if !parallel {
        return (0..games)
            .map(|game| play_game(factory, game, seed_of(game), max_steps))
            .collect();
    }

    let mut results: Vec<Option<anyhow::Result<GameRecord>>> = iter::repeat_with(|| None)
        .take(games)
        .collect();
    thread::scope(|s| {
        for (game, slot) in results.iter_mut().enumerate() {
            let seed = seed_of(game);
            s.spawn(move || {
                *slot = Some(play_game(factory, game, seed, max_steps));
            });
        }
    });
    results
        .into_iter()
        .enumerate()
        .map(|(game, result)| result.with_context(|| format!("Game {game} did not finish"))?)
        .collect()
}

fn play_game(
    factory: &AgentFactory,
    game: usize,
    seed: u64,
    max_steps: usize,
) -> anyhow::Result<GameRecord> {
    let start = Instant::now();
    let seed = PieceSeed::from(seed);
    let mut world = GameWorld::with_seed(seed);
    let mut agent = factory.build();

    let mut steps = 0;
    while steps < max_steps && !world.is_terminal() {
        let action = agent
            .choose_action(&world)
            .with_context(|| format!("Planning failed in game {game} at step {steps}"))?;
        action.apply(&mut world);
        steps += 1;
    }

    let game_over = world.is_terminal();
    let stats = world.stats().clone();
    info!(
        game,
        steps,
        pieces = stats.completed_pieces(),
        lines = stats.total_cleared_lines(),
        score = stats.score(),
        game_over,
        "game finished"
    );
    Ok(GameRecord {
        game,
        seed,
        steps,
        game_over,
        stats,
        final_board: world.board().clone(),
        elapsed_secs: start.elapsed().as_secs_f64(),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use stackplan_evaluator::utility::default_utility_model;
    use stackplan_planner::agent::{Evaluation, PlanningPolicy};

    use super::*;

    fn reflexive_factory() -> AgentFactory {
        AgentFactory {
            model: Arc::new(default_utility_model()),
            policy: PlanningPolicy::reflexive(),
            evaluation: Evaluation::Sequential,
        }
    }

    fn outcome(record: &GameRecord) -> impl PartialEq + std::fmt::Debug {
        (
            record.game,
            record.seed,
            record.steps,
            record.game_over,
            record.stats.clone(),
            record.final_board.clone(),
        )
    }

    #[test]
    fn test_step_limit_stops_game() {
        let record = play_game(&reflexive_factory(), 0, 7, 40).unwrap();
        assert_eq!(record.steps, 40);
        assert!(!record.game_over);
        assert!(record.stats.completed_pieces() > 0);
    }

    #[test]
    fn test_games_are_reproducible() {
        let factory = reflexive_factory();
        let a = play_game(&factory, 0, 11, 300).unwrap();
        let b = play_game(&factory, 0, 11, 300).unwrap();
        assert_eq!(outcome(&a), outcome(&b));
    }

    #[test]
    fn test_parallel_games_match_sequential() {
        let factory = reflexive_factory();
        let sequential = play_games(&factory, 3, 100, 150, false).unwrap();
        let parallel = play_games(&factory, 3, 100, 150, true).unwrap();
        assert_eq!(sequential.len(), 3);
        for (s, p) in iter::zip(&sequential, &parallel) {
            assert_eq!(outcome(s), outcome(p));
        }
        assert_eq!(parallel[2].seed, PieceSeed::from(102));
    }
}
