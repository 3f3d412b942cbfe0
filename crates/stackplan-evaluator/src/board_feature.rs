//! Board features: scalar signals extracted from a [`BoardAnalysis`].
//!
//! - [`FringeSmoothness`] - How flat the stack surface is
//! - [`HoleCount`] - Covered empty cells
//! - [`EmptyRows`] - Free rows above the stack, with diminishing returns
//! - [`AverageHeight`] - How low the bottom of the stack sits
//!
//! Features are pure functions of the board, so they can be called from any thread.
//! Their values are not normalized: the sign and scale are carried by the weights of a
//! [`UtilityModel`](crate::utility::UtilityModel).

use std::fmt;

use stackplan_engine::BitBoard;

use crate::board_analysis::BoardAnalysis;

/// Features in the order expected by [`default_utility_model`](crate::utility::default_utility_model).
#[must_use]
pub fn all_board_features() -> Vec<BoxedBoardFeature> {
    vec![
        Box::new(FringeSmoothness),
        Box::new(HoleCount),
        Box::new(EmptyRows),
        Box::new(AverageHeight),
    ]
}

pub trait BoardFeature: fmt::Debug + Send + Sync {
    #[must_use]
    fn id(&self) -> &str;
    #[must_use]
    fn name(&self) -> &str;
    #[must_use]
    fn clone_boxed(&self) -> BoxedBoardFeature;
    #[must_use]
    fn value(&self, analysis: &BoardAnalysis) -> f32;
}

pub type BoxedBoardFeature = Box<dyn BoardFeature>;

impl Clone for BoxedBoardFeature {
    fn clone(&self) -> Self {
        self.clone_boxed()
    }
}

impl BoardFeature for BoxedBoardFeature {
    fn id(&self) -> &str {
        self.as_ref().id()
    }

    fn name(&self) -> &str {
        self.as_ref().name()
    }

    fn clone_boxed(&self) -> BoxedBoardFeature {
        self.as_ref().clone_boxed()
    }

    fn value(&self, analysis: &BoardAnalysis) -> f32 {
        self.as_ref().value(analysis)
    }
}

/// Flatness of the surface.
///
/// `value = 1 / (changes + 1)` where `changes` counts adjacent columns of different
/// height. A perfectly flat surface scores 1.
#[derive(Debug, Clone)]
pub struct FringeSmoothness;

impl BoardFeature for FringeSmoothness {
    fn id(&self) -> &'static str {
        "fringe_smoothness"
    }
    fn name(&self) -> &'static str {
        "Fringe Smoothness"
    }
    fn clone_boxed(&self) -> BoxedBoardFeature {
        Box::new(self.clone())
    }
    #[expect(clippy::cast_precision_loss)]
    fn value(&self, analysis: &BoardAnalysis) -> f32 {
        1.0 / (analysis.surface_changes() as f32 + 1.0)
    }
}

/// Number of holes (empty cells with at least one occupied cell above them).
///
/// Larger is worse, so this feature takes a negative weight.
#[derive(Debug, Clone)]
pub struct HoleCount;

impl BoardFeature for HoleCount {
    fn id(&self) -> &'static str {
        "hole_count"
    }
    fn name(&self) -> &'static str {
        "Hole Count"
    }
    fn clone_boxed(&self) -> BoxedBoardFeature {
        Box::new(self.clone())
    }
    #[expect(clippy::cast_precision_loss)]
    fn value(&self, analysis: &BoardAnalysis) -> f32 {
        analysis.num_holes() as f32
    }
}

/// Free rows above the stack.
///
/// With `e` empty rows and `t = H / 3`, the value is `e²` up to `t` and grows linearly
/// beyond it: `t² + (e - t)`. Gaining headroom on a tall stack is worth more than on a
/// low one.
#[derive(Debug, Clone)]
pub struct EmptyRows;

impl BoardFeature for EmptyRows {
    fn id(&self) -> &'static str {
        "empty_rows"
    }
    fn name(&self) -> &'static str {
        "Empty Rows"
    }
    fn clone_boxed(&self) -> BoxedBoardFeature {
        Box::new(self.clone())
    }
    #[expect(clippy::cast_precision_loss)]
    fn value(&self, analysis: &BoardAnalysis) -> f32 {
        let empty = analysis.empty_top_rows() as f32;
        let threshold = BitBoard::PLAYABLE_HEIGHT as f32 / 3.0;
        if empty <= threshold {
            empty * empty
        } else {
            threshold * threshold + (empty - threshold)
        }
    }
}

/// Board height minus the mean height of the cells in the contiguous bottom rows.
///
/// Only rows up to the first empty row (counted from the bottom) take part. An empty
/// board scores 0.
#[derive(Debug, Clone)]
pub struct AverageHeight;

impl BoardFeature for AverageHeight {
    fn id(&self) -> &'static str {
        "average_height"
    }
    fn name(&self) -> &'static str {
        "Average Height"
    }
    fn clone_boxed(&self) -> BoxedBoardFeature {
        Box::new(self.clone())
    }
    #[expect(clippy::cast_precision_loss)]
    fn value(&self, analysis: &BoardAnalysis) -> f32 {
        analysis
            .bottom_stack_mean_height()
            .map_or(0.0, |mean| BitBoard::PLAYABLE_HEIGHT as f32 - mean)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value_of(feature: &dyn BoardFeature, art: &str) -> f32 {
        feature.value(&BoardAnalysis::from_board(&BitBoard::from_ascii(art)))
    }

    fn assert_close(actual: f32, expected: f32) {
        assert!(
            (actual - expected).abs() < 1e-4,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_feature_ids_are_unique() {
        let features = all_board_features();
        let mut ids: Vec<&str> = features.iter().map(|f| f.id()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), features.len());
    }

    #[test]
    fn test_empty_board_values() {
        let analysis = BoardAnalysis::from_board(&BitBoard::INITIAL);
        let values: Vec<f32> = all_board_features()
            .iter()
            .map(|f| f.value(&analysis))
            .collect();
        let threshold = 20.0_f32 / 3.0;
        let expected = [1.0, 0.0, threshold * threshold + (20.0 - threshold), 0.0];
        for (actual, expected) in values.into_iter().zip(expected) {
            assert_close(actual, expected);
        }
    }

    #[test]
    fn test_empty_rows_below_threshold_is_squared() {
        let art = "#.........\n".repeat(16);
        assert_close(value_of(&EmptyRows, &art), 16.0);
    }

    #[test]
    fn test_fringe_smoothness() {
        assert_close(value_of(&FringeSmoothness, "##########"), 1.0);
        assert_close(value_of(&FringeSmoothness, "#........."), 0.5);
        assert_close(value_of(&FringeSmoothness, "#.#......."), 0.25);
    }

    #[test]
    fn test_hole_count() {
        let art = r"
            ###.......
            .#........
            #..#......
        ";
        assert_close(value_of(&HoleCount, art), 4.0);
    }

    #[test]
    fn test_average_height() {
        // 10 cells at index 0 and 2 cells at index 1
        let art = r"
            ##........
            ##########
        ";
        assert_close(value_of(&AverageHeight, art), 20.0 - 2.0 / 12.0);
    }
}
