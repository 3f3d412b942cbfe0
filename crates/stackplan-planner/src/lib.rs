//! Lookahead planning over [`GameWorld`](stackplan_engine::GameWorld) states.
//!
//! An [`Agent`](agent::Agent) expands the placements reachable from the current world
//! into a [`StateTree`](tree::StateTree), scores the leaves with a
//! [`StateUtility`](strategy::StateUtility), and turns the winning placement into a
//! queue of primitive moves.
//!
//! - [`action`] - Primitive moves, placements, and placement enumeration
//! - [`tree`] - Breadth-first leaf generation and best-leaf selection
//! - [`strategy`] - Sequential and worker-pool leaf scoring
//! - [`pool`] - The long-lived worker thread pool
//! - [`utility`] - Board and next-piece expectation utilities
//! - [`agent`] - Planning policies and the move queue

pub mod action;
pub mod agent;
pub mod error;
pub mod pool;
pub mod strategy;
pub mod tree;
pub mod utility;
