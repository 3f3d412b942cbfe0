use std::{collections::BTreeMap, iter};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stackplan_evaluator::{
    board_feature::{self, BoxedBoardFeature},
    utility::UtilityModel,
};

/// Weights of a utility model as stored on disk, keyed by feature id.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UtilityModelFile {
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub weights: BTreeMap<String, f32>,
}

impl UtilityModelFile {
    pub fn from_model(name: impl Into<String>, model: &UtilityModel) -> Self {
        Self {
            name: name.into(),
            created_at: Utc::now(),
            weights: iter::zip(model.features(), model.weights())
                .map(|(feature, weight)| (feature.id().to_owned(), *weight))
                .collect(),
        }
    }

    pub fn to_utility_model(&self) -> anyhow::Result<UtilityModel> {
        let all_features = board_feature::all_board_features();
        let (features, weights): (Vec<BoxedBoardFeature>, Vec<f32>) = self
            .weights
            .iter()
            .map(
                |(feature_id, weight)| -> anyhow::Result<(BoxedBoardFeature, f32)> {
                    let feature = all_features
                        .iter()
                        .find(|f| f.id() == feature_id)
                        .ok_or_else(|| {
                            anyhow::anyhow!("Feature ID {feature_id} in model not found")
                        })?;
                    Ok((feature.clone_boxed(), *weight))
                },
            )
            .collect::<anyhow::Result<Vec<_>>>()?
            .into_iter()
            .unzip();
        Ok(UtilityModel::new(features, weights)?)
    }
}

#[cfg(test)]
mod tests {
    use stackplan_engine::BitBoard;
    use stackplan_evaluator::utility::default_utility_model;

    use super::*;

    #[test]
    fn test_file_model_scores_like_the_saved_model() {
        let model = default_utility_model();
        let file = UtilityModelFile::from_model("default", &model);
        let json = serde_json::to_string(&file).unwrap();
        let loaded: UtilityModelFile = serde_json::from_str(&json).unwrap();
        let restored = loaded.to_utility_model().unwrap();

        let board = BitBoard::from_ascii(
            r"
            ..#.......
            #.##..#..#
            ####.#####
            ",
        );
        let expected = model.aggregate_board(&board);
        let actual = restored.aggregate_board(&board);
        assert!((expected - actual).abs() < 1e-3, "{expected} != {actual}");
    }

    #[test]
    fn test_unknown_feature_is_rejected() {
        let file: UtilityModelFile = serde_json::from_str(
            r#"{
                "name": "broken",
                "created_at": "2024-01-01T00:00:00Z",
                "weights": { "hole_count": -1.0, "bumpiness": 2.0 }
            }"#,
        )
        .unwrap();
        let err = file.to_utility_model().unwrap_err();
        assert!(err.to_string().contains("bumpiness"));
    }
}
