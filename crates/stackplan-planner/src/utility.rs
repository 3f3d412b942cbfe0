//! [`StateUtility`] adapters that score [`GameWorld`]s with a [`UtilityModel`].

use std::sync::Arc;

use stackplan_engine::{GameWorld, PieceKind};
use stackplan_evaluator::utility::UtilityModel;

use crate::{
    strategy::{SequentialStrategy, StateUtility},
    tree::{PlacementExpander, StateTree, select_best},
};

/// Scores the board of a world. Terminal worlds score negative infinity.
#[derive(Debug, Clone)]
pub struct BoardUtility {
    model: Arc<UtilityModel>,
}

impl BoardUtility {
    #[must_use]
    pub fn new(model: Arc<UtilityModel>) -> Self {
        Self { model }
    }
}

impl StateUtility<GameWorld> for BoardUtility {
    fn utility(&self, world: &GameWorld) -> f32 {
        if world.is_terminal() {
            return f32::NEG_INFINITY;
        }
        self.model.aggregate(world)
    }
}

/// Expected best one-move score over the next piece.
///
/// For every piece kind, the falling piece is replaced by that kind and the best
/// [`BoardUtility`] among its placements is taken. The result is the weighted mean
/// of those maxima. Kinds with zero weight are skipped.
///
/// The one-move searches always run sequentially in the calling thread, so this
/// utility can itself be evaluated on a worker pool.
#[derive(Debug, Clone)]
pub struct ProbabilisticUtility {
    board: BoardUtility,
    piece_weights: [f32; PieceKind::LEN],
}

impl ProbabilisticUtility {
    /// Every piece kind equally likely.
    #[must_use]
    pub fn uniform(model: Arc<UtilityModel>) -> Self {
        Self::with_piece_weights(model, [1.0; PieceKind::LEN])
    }

    /// Piece likelihoods indexed in [`PieceKind::ALL`] order. Need not sum to 1.
    #[must_use]
    pub fn with_piece_weights(
        model: Arc<UtilityModel>,
        piece_weights: [f32; PieceKind::LEN],
    ) -> Self {
        Self {
            board: BoardUtility::new(model),
            piece_weights,
        }
    }

    fn best_placement_score(&self, world: GameWorld) -> f32 {
        let tree = StateTree::new(world, PlacementExpander);
        let scored = SequentialStrategy::new(&self.board).score_each(tree.leaves_at(1));
        select_best(scored).map_or(f32::NEG_INFINITY, |best| best.score)
    }
}

impl StateUtility<GameWorld> for ProbabilisticUtility {
    fn utility(&self, world: &GameWorld) -> f32 {
        if world.is_terminal() {
            return f32::NEG_INFINITY;
        }
        let mut total = 0.0;
        let mut total_weight = 0.0;
        for (kind, weight) in PieceKind::ALL.into_iter().zip(self.piece_weights) {
            if weight <= 0.0 {
                continue;
            }
            let mut next = world.clone();
            next.replace_falling_piece(kind);
            total += weight * self.best_placement_score(next);
            total_weight += weight;
        }
        if total_weight > 0.0 {
            total / total_weight
        } else {
            f32::NEG_INFINITY
        }
    }
}

#[cfg(test)]
mod tests {
    use stackplan_engine::{BitBoard, PieceSeed};
    use stackplan_evaluator::{
        board_feature::{EmptyRows, HoleCount},
        utility::default_utility_model,
    };

    use super::*;
    use crate::action::available_placements;

    fn holes_only() -> Arc<UtilityModel> {
        Arc::new(
            UtilityModel::new(vec![Box::new(HoleCount), Box::new(EmptyRows)], vec![-1.0, 0.0])
                .unwrap(),
        )
    }

    fn terminal_world() -> GameWorld {
        let art = ".#########\n".repeat(BitBoard::PLAYABLE_HEIGHT);
        let mut world = GameWorld::with_board(BitBoard::from_ascii(&art), PieceSeed::from(4));
        world.replace_falling_piece(PieceKind::O);
        world.drop_to_bottom();
        world.replace_falling_piece(PieceKind::O);
        world
    }

    #[test]
    fn test_terminal_worlds_score_negative_infinity() {
        let world = terminal_world();
        let model = Arc::new(default_utility_model());
        assert_eq!(
            BoardUtility::new(Arc::clone(&model)).utility(&world),
            f32::NEG_INFINITY
        );
        assert_eq!(
            ProbabilisticUtility::uniform(model).utility(&world),
            f32::NEG_INFINITY
        );
    }

    #[test]
    fn test_single_piece_weight_is_best_placement_of_that_piece() {
        let world = GameWorld::with_board(
            BitBoard::from_ascii(
                r"
                ###...####
                ####.#####
                ",
            ),
            PieceSeed::from(9),
        );
        let model = holes_only();
        let mut weights = [0.0; PieceKind::LEN];
        weights[PieceKind::T as usize] = 1.0;
        let probabilistic = ProbabilisticUtility::with_piece_weights(Arc::clone(&model), weights);

        let mut with_t = world.clone();
        with_t.replace_falling_piece(PieceKind::T);
        let board = BoardUtility::new(model);
        let expected = available_placements(&with_t)
            .into_iter()
            .map(|p| board.utility(&p.apply_to_copy(&with_t)))
            .fold(f32::NEG_INFINITY, f32::max);

        // an upside-down T fills the notch without holes
        assert_eq!(expected, 0.0);
        assert_eq!(probabilistic.utility(&world), expected);
    }

    #[test]
    fn test_uniform_is_mean_over_kinds() {
        let world = GameWorld::with_seed(PieceSeed::from(6));
        let model = holes_only();
        let uniform = ProbabilisticUtility::uniform(Arc::clone(&model)).utility(&world);
        // S and Z cannot lie flat on an empty floor and leave one hole each
        assert!((uniform - (-2.0 / 7.0)).abs() < 1e-6);
    }
}
