//! The planning agent: picks a placement by tree search and hands out its primitive
//! moves one at a time.
//!
//! ```text
//! Idle ──(plan empty)──▶ Planning ──▶ Dispatching ──(plan drained)──▶ Idle
//! ```
//!
//! While the plan holds moves, [`Agent::choose_action`] only dequeues; the search runs
//! again once the queue is empty.

use std::{collections::VecDeque, sync::Arc};

use stackplan_engine::GameWorld;
use stackplan_evaluator::utility::UtilityModel;
use tracing::debug;

use crate::{
    action::{Placement, PrimitiveAction},
    error::PlanError,
    pool::WorkerPool,
    strategy::{EvaluationStrategy as _, PoolStrategy, SequentialStrategy, StateUtility},
    tree::{PlacementExpander, Scored, SearchNode, StateTree, select_best},
    utility::{BoardUtility, ProbabilisticUtility},
};

/// How leaves are found and scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanningPolicy {
    /// Leaves `depth` placements ahead scored by the board utility.
    Deterministic { depth: usize },
    /// Leaves `depth` placements ahead scored by the expected best next move over
    /// all possible next pieces.
    Probabilistic { depth: usize },
    /// All leaves are scored by the board utility, then only the `beam_width` best
    /// are re-scored probabilistically.
    LimitedProbabilistic { depth: usize, beam_width: usize },
}

impl PlanningPolicy {
    pub const DEFAULT_BEAM_WIDTH: usize = 10;

    /// Greedy one-placement search.
    #[must_use]
    pub const fn reflexive() -> Self {
        Self::Deterministic { depth: 1 }
    }

    #[must_use]
    pub const fn lookahead(depth: usize) -> Self {
        Self::Deterministic { depth }
    }

    #[must_use]
    pub const fn probabilistic() -> Self {
        Self::Probabilistic { depth: 2 }
    }

    #[must_use]
    pub const fn limited_probabilistic() -> Self {
        Self::LimitedProbabilistic {
            depth: 2,
            beam_width: Self::DEFAULT_BEAM_WIDTH,
        }
    }

    #[must_use]
    pub const fn depth(self) -> usize {
        match self {
            Self::Deterministic { depth }
            | Self::Probabilistic { depth }
            | Self::LimitedProbabilistic { depth, .. } => depth,
        }
    }
}

/// Where leaf scoring runs.
#[derive(Debug, Clone, Default)]
pub enum Evaluation {
    #[default]
    Sequential,
    Pool(Arc<WorkerPool>),
}

impl Evaluation {
    fn score_all<U>(
        &self,
        nodes: impl IntoIterator<Item = SearchNode<GameWorld, Placement>>,
        utility: U,
    ) -> Result<Vec<Scored<GameWorld, Placement>>, PlanError>
    where
        U: StateUtility<GameWorld> + 'static,
    {
        match self {
            Self::Sequential => SequentialStrategy::new(&utility).score_all(nodes),
            Self::Pool(pool) => PoolStrategy::new(pool, Arc::new(utility)).score_all(nodes),
        }
    }
}

/// Outcome of one search.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub placement: Placement,
    pub score: f32,
    pub actions: Vec<PrimitiveAction>,
}

#[derive(Debug)]
pub struct Agent {
    plan: VecDeque<PrimitiveAction>,
    model: Arc<UtilityModel>,
    policy: PlanningPolicy,
    evaluation: Evaluation,
}

impl Agent {
    /// Creates an agent that scores leaves in the calling thread.
    #[must_use]
    pub fn new(model: Arc<UtilityModel>, policy: PlanningPolicy) -> Self {
        Self {
            plan: VecDeque::new(),
            model,
            policy,
            evaluation: Evaluation::Sequential,
        }
    }

    #[must_use]
    pub fn with_evaluation(self, evaluation: Evaluation) -> Self {
        Self { evaluation, ..self }
    }

    #[must_use]
    pub fn policy(&self) -> PlanningPolicy {
        self.policy
    }

    /// Moves still queued from the last decision.
    pub fn pending_actions(&self) -> impl ExactSizeIterator<Item = PrimitiveAction> + '_ {
        self.plan.iter().copied()
    }

    /// Drops the queued moves so that the next call searches again.
    pub fn clear_plan(&mut self) {
        self.plan.clear();
    }

    /// Returns the next move for `world`, searching only when no move is queued.
    pub fn choose_action(&mut self, world: &GameWorld) -> Result<PrimitiveAction, PlanError> {
        if self.plan.is_empty() {
            let decision = self.decide(world)?;
            self.plan.extend(decision.actions);
        }
        self.plan.pop_front().ok_or(PlanError::NoLegalAction)
    }

    /// Runs one search from `world` without touching the queued plan.
    pub fn decide(&self, world: &GameWorld) -> Result<Decision, PlanError> {
        let tree = StateTree::new(world.clone(), PlacementExpander);
        let board = BoardUtility::new(Arc::clone(&self.model));
        let probabilistic = ProbabilisticUtility::uniform(Arc::clone(&self.model));

        let best = match self.policy {
            PlanningPolicy::Deterministic { depth } => {
                select_best(self.evaluation.score_all(tree.leaves_at(depth), board)?)
            }
            PlanningPolicy::Probabilistic { depth } => {
                select_best(self.evaluation.score_all(tree.leaves_at(depth), probabilistic)?)
            }
            PlanningPolicy::LimitedProbabilistic { depth, beam_width } => {
                let scored = self.evaluation.score_all(tree.leaves_at(depth), board)?;
                let beam = top_scored(scored, beam_width);
                select_best(self.evaluation.score_all(beam, probabilistic)?)
            }
        };

        let best = best.ok_or(PlanError::NoLegalAction)?;
        let placement = *best.node.first_action().ok_or(PlanError::NoLegalAction)?;
        let actions = placement.unroll(world);
        debug!(
            policy = ?self.policy,
            %placement,
            score = best.score,
            actions = actions.len(),
            "planned placement"
        );
        Ok(Decision {
            placement,
            score: best.score,
            actions,
        })
    }
}

/// The `width` best nodes (at least one), kept in input order.
///
/// Nodes with equal scores are ranked by position, so the earlier one survives a cut
/// between them.
fn top_scored<S, A>(scored: Vec<Scored<S, A>>, width: usize) -> Vec<SearchNode<S, A>> {
    let mut ranked: Vec<(usize, Scored<S, A>)> = scored.into_iter().enumerate().collect();
    ranked.sort_by(|(_, a), (_, b)| b.score.total_cmp(&a.score));
    ranked.truncate(width.max(1));
    ranked.sort_by_key(|(index, _)| *index);
    ranked.into_iter().map(|(_, scored)| scored.node).collect()
}
