//! BDD step definitions for the blockbook monitor

pub mod change_steps;
pub mod evaluator_steps;
pub mod polling_steps;
