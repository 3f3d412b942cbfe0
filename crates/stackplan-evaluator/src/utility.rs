//! Linear utility over board features.
//!
//! ```text
//! utility = w₁·f₁ + w₂·f₂ + ... + wₙ·fₙ
//! ```
//!
//! The feature list and weights are fixed at construction. [`UtilityModel::evaluate`]
//! also returns the raw and weighted per-feature values for diagnostics;
//! [`UtilityModel::aggregate`] computes only the sum.

use std::iter;

use serde::Serialize;
use stackplan_engine::{BitBoard, GameWorld};

use crate::{
    board_analysis::BoardAnalysis,
    board_feature::{BoardFeature as _, BoxedBoardFeature, all_board_features},
};

/// Weights of [`all_board_features`] used when none are given.
///
/// These magnitudes were tuned against a hole feature that rewarded filled rows per
/// hole (`filled_rows / (holes + 1)`); here [`HoleCount`](crate::board_feature::HoleCount)
/// is a raw count, so only the sign of its weight was flipped and the scale is not
/// re-tuned. Pass explicit weights when the balance between features matters.
pub const DEFAULT_WEIGHTS: [f32; 4] = [3.237_593_2, -14.109_508, 22.322_539, 30.961_22];

/// Feature and weight lists of different lengths.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("utility model has {features} features but {weights} weights")]
pub struct MalformedUtilityModel {
    pub features: usize,
    pub weights: usize,
}

/// Per-feature contributions to one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UtilityBreakdown {
    pub aggregate: f32,
    pub raw: Vec<f32>,
    pub weighted: Vec<f32>,
}

#[derive(Debug, Clone)]
pub struct UtilityModel {
    features: Vec<BoxedBoardFeature>,
    weights: Vec<f32>,
}

impl UtilityModel {
    pub fn new(
        features: Vec<BoxedBoardFeature>,
        weights: Vec<f32>,
    ) -> Result<Self, MalformedUtilityModel> {
        if features.len() != weights.len() {
            return Err(MalformedUtilityModel {
                features: features.len(),
                weights: weights.len(),
            });
        }
        Ok(Self { features, weights })
    }

    #[must_use]
    pub fn features(&self) -> &[BoxedBoardFeature] {
        &self.features
    }

    #[must_use]
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    #[must_use]
    pub fn evaluate(&self, world: &GameWorld) -> UtilityBreakdown {
        self.evaluate_board(world.board())
    }

    #[must_use]
    pub fn evaluate_board(&self, board: &BitBoard) -> UtilityBreakdown {
        let analysis = BoardAnalysis::from_board(board);
        let raw: Vec<f32> = self.features.iter().map(|f| f.value(&analysis)).collect();
        let weighted: Vec<f32> = iter::zip(&raw, &self.weights).map(|(v, w)| v * w).collect();
        UtilityBreakdown {
            aggregate: weighted.iter().sum(),
            raw,
            weighted,
        }
    }

    /// Weighted sum only, without collecting the per-feature values.
    #[inline]
    #[must_use]
    pub fn aggregate(&self, world: &GameWorld) -> f32 {
        self.aggregate_board(world.board())
    }

    #[inline]
    #[must_use]
    pub fn aggregate_board(&self, board: &BitBoard) -> f32 {
        let analysis = BoardAnalysis::from_board(board);
        iter::zip(&self.features, &self.weights)
            .map(|(f, w)| f.value(&analysis) * w)
            .sum()
    }
}

/// [`all_board_features`] with [`DEFAULT_WEIGHTS`].
#[must_use]
pub fn default_utility_model() -> UtilityModel {
    UtilityModel {
        features: all_board_features(),
        weights: DEFAULT_WEIGHTS.to_vec(),
    }
}
