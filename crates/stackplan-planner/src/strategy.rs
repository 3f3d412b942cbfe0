//! Policies for scoring a batch of search nodes.
//!
//! - [`SequentialStrategy`] - Scores nodes one by one in the calling thread
//! - [`PoolStrategy`] - Distributes nodes over a shared [`WorkerPool`]
//!
//! Both return every input node exactly once, paired with its score, in input order,
//! so the choice of strategy never changes which node wins.

use std::{
    panic::{self, AssertUnwindSafe},
    sync::{Arc, mpsc},
};

use tracing::trace;

use crate::{
    error::{PlanError, WorkerFailure},
    pool::WorkerPool,
    tree::{Scored, SearchNode},
};

/// Scalar objective of a state; larger is better.
///
/// Utilities are shared across worker threads and must not rely on mutable state.
pub trait StateUtility<S>: Send + Sync {
    fn utility(&self, state: &S) -> f32;
}

impl<S, F> StateUtility<S> for F
where
    F: Fn(&S) -> f32 + Send + Sync,
{
    fn utility(&self, state: &S) -> f32 {
        self(state)
    }
}

pub trait EvaluationStrategy<S> {
    /// Scores `nodes`, preserving their order.
    fn score_all<A>(
        &self,
        nodes: impl IntoIterator<Item = SearchNode<S, A>>,
    ) -> Result<Vec<Scored<S, A>>, PlanError>;
}

#[derive(Debug)]
pub struct SequentialStrategy<'a, U: ?Sized> {
    utility: &'a U,
}

impl<'a, U: ?Sized> SequentialStrategy<'a, U> {
    #[must_use]
    pub fn new(utility: &'a U) -> Self {
        Self { utility }
    }

    /// Scores `nodes` in order. Unlike [`EvaluationStrategy::score_all`], this cannot
    /// fail.
    #[must_use]
    pub fn score_each<S, A>(
        &self,
        nodes: impl IntoIterator<Item = SearchNode<S, A>>,
    ) -> Vec<Scored<S, A>>
    where
        U: StateUtility<S>,
    {
        nodes
            .into_iter()
            .map(|node| {
                let score = self.utility.utility(node.state());
                Scored { node, score }
            })
            .collect()
    }
}

impl<S, U> EvaluationStrategy<S> for SequentialStrategy<'_, U>
where
    U: StateUtility<S> + ?Sized,
{
    fn score_all<A>(
        &self,
        nodes: impl IntoIterator<Item = SearchNode<S, A>>,
    ) -> Result<Vec<Scored<S, A>>, PlanError> {
        Ok(self.score_each(nodes))
    }
}

/// Scores nodes on a [`WorkerPool`].
///
/// Each node's state is cloned and sent to a worker together with its position in
/// the batch; the scores come back on a channel owned by the batch and are put back
/// in input order. A panic inside the utility fails the whole batch with
/// [`WorkerFailure::Panicked`].
#[derive(Debug)]
pub struct PoolStrategy<'a, U: ?Sized> {
    pool: &'a WorkerPool,
    utility: Arc<U>,
}

impl<'a, U: ?Sized> PoolStrategy<'a, U> {
    #[must_use]
    pub fn new(pool: &'a WorkerPool, utility: Arc<U>) -> Self {
        Self { pool, utility }
    }
}

impl<S, U> EvaluationStrategy<S> for PoolStrategy<'_, U>
where
    S: Clone + Send + 'static,
    U: StateUtility<S> + ?Sized + 'static,
{
    fn score_all<A>(
        &self,
        nodes: impl IntoIterator<Item = SearchNode<S, A>>,
    ) -> Result<Vec<Scored<S, A>>, PlanError> {
        let nodes: Vec<_> = nodes.into_iter().collect();
        trace!(
            nodes = nodes.len(),
            workers = self.pool.size(),
            "scoring batch on worker pool"
        );

        let (result_tx, result_rx) = mpsc::channel::<(usize, Option<f32>)>();
        for (index, node) in nodes.iter().enumerate() {
            let state = node.state().clone();
            let utility = Arc::clone(&self.utility);
            let result_tx = result_tx.clone();
            self.pool.execute(Box::new(move || {
                let score = panic::catch_unwind(AssertUnwindSafe(|| utility.utility(&state)));
                // the receiver is gone only if the batch already failed
                let _ = result_tx.send((index, score.ok()));
            }))?;
        }
        drop(result_tx);

        let mut scores = vec![0.0; nodes.len()];
        for _ in 0..nodes.len() {
            let (index, score) = result_rx
                .recv()
                .map_err(|_| WorkerFailure::Disconnected)?;
            scores[index] = score.ok_or(WorkerFailure::Panicked { index })?;
        }

        Ok(nodes
            .into_iter()
            .zip(scores)
            .map(|(node, score)| Scored { node, score })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nodes(states: impl IntoIterator<Item = u32>) -> Vec<SearchNode<u32, ()>> {
        states.into_iter().map(SearchNode::root).collect()
    }

    fn scores<S, A>(scored: &[Scored<S, A>]) -> Vec<f32> {
        scored.iter().map(|s| s.score).collect()
    }

    #[expect(clippy::cast_precision_loss)]
    fn slow_square(state: &u32) -> f32 {
        // uneven work so that workers finish out of order
        std::thread::sleep(std::time::Duration::from_micros(u64::from(state % 7) * 50));
        (state * state) as f32
    }

    #[test]
    fn test_pool_matches_sequential_order() {
        let pool = WorkerPool::new(4).unwrap();
        let input = nodes(0..200);

        let sequential = SequentialStrategy::new(&slow_square)
            .score_all(input.clone())
            .unwrap();
        let pooled = PoolStrategy::new(&pool, Arc::new(slow_square))
            .score_all(input.clone())
            .unwrap();

        assert_eq!(scores(&sequential), scores(&pooled));
        let states: Vec<u32> = pooled.iter().map(|s| *s.node.state()).collect();
        assert_eq!(states, (0..200).collect::<Vec<_>>());
    }

    #[test]
    fn test_sequential_scores_each_node_once_in_order() {
        let input = nodes([3, 1, 2]);
        let strategy = SequentialStrategy::new(&slow_square);
        let each = strategy.score_each(input.clone());
        assert_eq!(scores(&each), [9.0, 1.0, 4.0]);
        assert_eq!(each, strategy.score_all(input).unwrap());
    }

    #[test]
    fn test_empty_batch() {
        let pool = WorkerPool::new(2).unwrap();
        let scored = PoolStrategy::new(&pool, Arc::new(slow_square))
            .score_all(nodes([]))
            .unwrap();
        assert!(scored.is_empty());
    }

    #[test]
    fn test_panicking_utility_fails_batch_and_pool_survives() {
        let pool = WorkerPool::new(2).unwrap();
        let fragile = Arc::new(|state: &u32| {
            assert!(*state != 13, "unlucky state");
            1.0
        });

        let err = PoolStrategy::new(&pool, Arc::clone(&fragile))
            .score_all(nodes(0..20))
            .unwrap_err();
        assert_eq!(
            err,
            PlanError::WorkerFailure(WorkerFailure::Panicked { index: 13 })
        );

        let scored = PoolStrategy::new(&pool, fragile)
            .score_all(nodes(20..40))
            .unwrap();
        assert_eq!(scored.len(), 20);
    }
}
