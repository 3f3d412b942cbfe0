//! Board features and the linear utility model that scores game states.
//!
//! - [`board_analysis`] - Lazily computed board metrics shared by the features
//! - [`board_feature`] - The [`BoardFeature`](board_feature::BoardFeature) trait and
//!   the built-in features
//! - [`utility`] - [`UtilityModel`](utility::UtilityModel), a weighted sum of features
//!
//! # Example
//!
//! ```
//! use stackplan_engine::{BitBoard, GameWorld, PieceSeed};
//! use stackplan_evaluator::utility::default_utility_model;
//!
//! let model = default_utility_model();
//! let world = GameWorld::with_board(BitBoard::from_ascii("####......"), PieceSeed::from(0));
//!
//! let breakdown = model.evaluate(&world);
//! assert_eq!(breakdown.raw.len(), model.features().len());
//! ```

pub mod board_analysis;
pub mod board_feature;
pub mod utility;
