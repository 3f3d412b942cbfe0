use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, ensure};
use stackplan_evaluator::{
    board_feature,
    utility::{self, UtilityModel},
};
use stackplan_planner::{
    agent::{Agent, Evaluation, PlanningPolicy},
    pool::WorkerPool,
};

use crate::{model::utility_model::UtilityModelFile, util};

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum AgentKind {
    /// Best placement of the current piece
    Reflexive,
    /// Best sequence of placements over the known pieces
    Lookahead,
    /// Leaves scored by the expected best move of the next piece
    Probabilistic,
    /// Probabilistic scoring of the best leaves only
    #[default]
    LimitedProbabilistic,
}

// agent options shared by the commands that plan
#[derive(Debug, Clone, clap::Args)]
pub(crate) struct AgentArg {
    /// Planning policy
    #[arg(long, value_enum, default_value_t = AgentKind::default())]
    agent: AgentKind,
    /// Placements to look ahead; ignored by the reflexive agent [default: 2]
    #[arg(long)]
    depth: Option<usize>,
    /// Leaves re-scored by the limited probabilistic agent
    #[arg(long, default_value_t = PlanningPolicy::DEFAULT_BEAM_WIDTH)]
    beam_width: usize,
    /// Worker threads scoring the leaves; 0 scores them in the calling thread
    #[arg(long, default_value_t = 0)]
    workers: usize,
    /// Weights of fringe_smoothness, hole_count, empty_rows, average_height
    #[arg(
        long,
        value_delimiter = ',',
        allow_hyphen_values = true,
        conflicts_with = "model"
    )]
    weights: Option<Vec<f32>>,
    /// Utility model file (JSON) with weights keyed by feature id
    #[arg(long)]
    model: Option<PathBuf>,
}

impl AgentArg {
    const DEFAULT_DEPTH: usize = 2;

    pub(crate) fn policy(&self) -> anyhow::Result<PlanningPolicy> {
        let depth = self.depth.unwrap_or(Self::DEFAULT_DEPTH);
        ensure!(depth > 0, "--depth must be at least 1");
        ensure!(self.beam_width > 0, "--beam-width must be at least 1");
        Ok(match self.agent {
            AgentKind::Reflexive => PlanningPolicy::reflexive(),
            AgentKind::Lookahead => PlanningPolicy::lookahead(depth),
            AgentKind::Probabilistic => PlanningPolicy::Probabilistic { depth },
            AgentKind::LimitedProbabilistic => PlanningPolicy::LimitedProbabilistic {
                depth,
                beam_width: self.beam_width,
            },
        })
    }

    pub(crate) fn workers(&self) -> usize {
        self.workers
    }

    pub(crate) fn utility_model(&self) -> anyhow::Result<UtilityModel> {
        if let Some(path) = &self.model {
            let file: UtilityModelFile = util::read_json_file("utility model", path)?;
            return file
                .to_utility_model()
                .with_context(|| format!("Invalid utility model: {}", path.display()));
        }
        match &self.weights {
            Some(weights) => UtilityModel::new(board_feature::all_board_features(), weights.clone())
                .context("Invalid --weights"),
            None => Ok(utility::default_utility_model()),
        }
    }

    pub(crate) fn evaluation(&self) -> anyhow::Result<Evaluation> {
        if self.workers == 0 {
            return Ok(Evaluation::Sequential);
        }
        let pool = WorkerPool::new(self.workers).context("Failed to spawn worker threads")?;
        Ok(Evaluation::Pool(Arc::new(pool)))
    }
}

/// Everything needed to build agents for one run.
#[derive(Debug, Clone)]
pub(crate) struct AgentFactory {
    pub(crate) model: Arc<UtilityModel>,
    pub(crate) policy: PlanningPolicy,
    pub(crate) evaluation: Evaluation,
}

impl AgentFactory {
    pub(crate) fn from_arg(arg: &AgentArg) -> anyhow::Result<Self> {
        Ok(Self {
            model: Arc::new(arg.utility_model()?),
            policy: arg.policy()?,
            evaluation: arg.evaluation()?,
        })
    }

    pub(crate) fn build(&self) -> Agent {
        Agent::new(Arc::clone(&self.model), self.policy).with_evaluation(self.evaluation.clone())
    }
}
