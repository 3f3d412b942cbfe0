//! Falling-block game state: a bitboard, tetromino pieces, a seeded 7-bag generator,
//! and [`GameWorld`], the cloneable state value searched by the planner.

pub use self::{core::*, engine::*};

pub mod core;
pub mod engine;
