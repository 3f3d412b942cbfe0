//! Depth-limited breadth-first expansion of hypothetical states.
//!
//! A [`StateTree`] owns a root [`SearchNode`] and a [`NodeExpander`] that knows how
//! to produce the children of a node. The tree is built lazily by
//! [`StateTree::leaves_at`] and discarded after each decision.

use std::collections::VecDeque;

use stackplan_engine::GameWorld;

use crate::{
    action::{Placement, available_placements},
    error::PlanError,
    strategy::EvaluationStrategy,
};

/// A hypothetical state together with the actions that led to it from the root.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchNode<S, A> {
    state: S,
    path: Vec<A>,
}

impl<S, A> SearchNode<S, A> {
    #[must_use]
    pub fn root(state: S) -> Self {
        Self {
            state,
            path: vec![],
        }
    }

    /// Creates a child reached from `self` by `action`.
    #[must_use]
    pub fn child(&self, action: A, state: S) -> Self
    where
        A: Clone,
    {
        let mut path = Vec::with_capacity(self.path.len() + 1);
        path.extend_from_slice(&self.path);
        path.push(action);
        Self { state, path }
    }

    #[must_use]
    pub fn state(&self) -> &S {
        &self.state
    }

    #[must_use]
    pub fn path(&self) -> &[A] {
        &self.path
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.path.len()
    }

    #[must_use]
    pub fn first_action(&self) -> Option<&A> {
        self.path.first()
    }
}

/// A node paired with its utility.
#[derive(Debug, Clone, PartialEq)]
pub struct Scored<S, A> {
    pub node: SearchNode<S, A>,
    pub score: f32,
}

/// Child generation rule of a search domain.
pub trait NodeExpander {
    type State;
    type Action;

    /// Children of `node`, each owning an independent copy of the state.
    fn expand(
        &self,
        node: &SearchNode<Self::State, Self::Action>,
    ) -> Vec<SearchNode<Self::State, Self::Action>>;

    /// Terminal states are never expanded.
    fn is_terminal(&self, state: &Self::State) -> bool;
}

/// Expands a [`GameWorld`] into one child per [`available_placements`] entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlacementExpander;

impl NodeExpander for PlacementExpander {
    type State = GameWorld;
    type Action = Placement;

    fn expand(
        &self,
        node: &SearchNode<GameWorld, Placement>,
    ) -> Vec<SearchNode<GameWorld, Placement>> {
        available_placements(node.state())
            .into_iter()
            .map(|placement| node.child(placement, placement.apply_to_copy(node.state())))
            .collect()
    }

    fn is_terminal(&self, state: &GameWorld) -> bool {
        state.is_terminal()
    }
}

pub struct StateTree<E: NodeExpander> {
    root: SearchNode<E::State, E::Action>,
    expander: E,
}

impl<E> StateTree<E>
where
    E: NodeExpander,
    E::State: Clone,
    E::Action: Clone,
{
    #[must_use]
    pub fn new(root: E::State, expander: E) -> Self {
        Self {
            root: SearchNode::root(root),
            expander,
        }
    }

    #[must_use]
    pub fn root(&self) -> &SearchNode<E::State, E::Action> {
        &self.root
    }

    /// Nodes `depth` actions away from the root, in breadth-first order.
    ///
    /// Depth 0 yields the root alone. A terminal node reached before `depth` is
    /// yielded as-is with its shorter path, so only terminal nodes can be shallower
    /// than `depth`.
    pub fn leaves_at(&self, depth: usize) -> Leaves<'_, E> {
        Leaves {
            expander: &self.expander,
            frontier: VecDeque::from([self.root.clone()]),
            depth,
        }
    }

    /// The highest-scoring node at `depth`. Ties go to the node visited first.
    ///
    /// Returns `Ok(None)` when there is no leaf at all.
    pub fn best<St>(
        &self,
        depth: usize,
        strategy: &St,
    ) -> Result<Option<Scored<E::State, E::Action>>, PlanError>
    where
        St: EvaluationStrategy<E::State>,
    {
        let scored = strategy.score_all(self.leaves_at(depth))?;
        Ok(select_best(scored))
    }
}

/// Lazy iterator returned by [`StateTree::leaves_at`].
pub struct Leaves<'a, E: NodeExpander> {
    expander: &'a E,
    frontier: VecDeque<SearchNode<E::State, E::Action>>,
    depth: usize,
}

impl<E> Iterator for Leaves<'_, E>
where
    E: NodeExpander,
{
    type Item = SearchNode<E::State, E::Action>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.frontier.pop_front() {
            if node.depth() >= self.depth || self.expander.is_terminal(node.state()) {
                return Some(node);
            }
            self.frontier.extend(self.expander.expand(&node));
        }
        None
    }
}

/// First maximum in iteration order.
pub fn select_best<S, A>(scored: impl IntoIterator<Item = Scored<S, A>>) -> Option<Scored<S, A>> {
    let mut best: Option<Scored<S, A>> = None;
    for candidate in scored {
        if best.as_ref().is_none_or(|b| candidate.score > b.score) {
            best = Some(candidate);
        }
    }
    best
}
