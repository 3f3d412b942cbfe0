pub mod simulation;
pub mod utility_model;
