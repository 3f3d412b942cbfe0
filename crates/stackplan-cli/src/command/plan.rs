use std::{iter, path::PathBuf};

use anyhow::{Context, ensure};
use serde::Serialize;
use stackplan_engine::{BitBoard, GameWorld, PieceKind, PieceSeed};
use stackplan_evaluator::{board_feature::BoardFeature as _, utility::UtilityBreakdown};
use stackplan_planner::action::PrimitiveAction;

use crate::{
    command::agent_arg::{AgentArg, AgentFactory},
    util,
};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct PlanArg {
    /// Board picture, `#` for filled and `.` for empty cells, bottom rows last [default: stdin]
    #[arg(long)]
    board: Option<PathBuf>,
    /// Kind of the falling piece (I, O, S, Z, J, L, T)
    #[arg(long)]
    piece: PieceKind,
    /// Seed of the pieces that follow, seen by deeper lookahead
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Print the result as JSON
    #[arg(long, default_value_t = false)]
    json: bool,
    #[clap(flatten)]
    agent: AgentArg,
}

#[derive(Debug, Clone, Serialize)]
struct PlanReport {
    piece: PieceKind,
    orientation: String,
    column: usize,
    score: f32,
    actions: Vec<PrimitiveAction>,
    features: Vec<FeatureContribution>,
    aggregate: f32,
    board_after: String,
}

#[derive(Debug, Clone, Serialize)]
struct FeatureContribution {
    id: String,
    name: String,
    raw: f32,
    weighted: f32,
}

pub(crate) fn run(arg: &PlanArg) -> anyhow::Result<()> {
    let PlanArg {
        board,
        piece,
        seed,
        json,
        agent,
    } = arg;

    let art = util::read_text_input("board", board.as_deref())?;
    let board = BitBoard::parse_ascii(&art).context("Failed to parse board")?;
    let mut world = GameWorld::with_board(board, PieceSeed::from(*seed));
    world.replace_falling_piece(*piece);
    ensure!(
        !world.is_terminal(),
        "The {piece:?} piece does not fit at the spawn position"
    );

    let factory = AgentFactory::from_arg(agent)?;
    let decision = factory.build().decide(&world)?;
    let after = decision.placement.apply_to_copy(&world);
    let UtilityBreakdown {
        aggregate,
        raw,
        weighted,
    } = factory.model.evaluate(&after);

    let report = PlanReport {
        piece: *piece,
        orientation: decision.placement.orientation.to_string(),
        column: decision.placement.column,
        score: decision.score,
        actions: decision.actions,
        features: iter::zip(factory.model.features(), iter::zip(raw, weighted))
            .map(|(feature, (raw, weighted))| FeatureContribution {
                id: feature.id().to_owned(),
                name: feature.name().to_owned(),
                raw,
                weighted,
            })
            .collect(),
        aggregate,
        board_after: after.board().to_ascii(),
    };

    if *json {
        util::write_json(&report, None)
    } else {
        print_report(&report);
        Ok(())
    }
}

fn print_report(report: &PlanReport) {
    println!(
        "Placement: {} at column {} (score {:.3})",
        report.orientation, report.column, report.score
    );
    let actions: Vec<String> = report.actions.iter().map(ToString::to_string).collect();
    println!("Actions: {}", actions.join(", "));
    println!();
    println!("{:<20} {:>10} {:>10}", "Feature", "Raw", "Weighted");
    for feature in &report.features {
        println!(
            "{:<20} {:>10.3} {:>10.3}",
            feature.name, feature.raw, feature.weighted
        );
    }
    println!("{:<20} {:>10} {:>10.3}", "Total", "", report.aggregate);
    println!();
    println!("Board after placement:");
    print!("{}", report.board_after);
}
