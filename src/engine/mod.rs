//! Execution engine for jcgroup
//!
//! The engine orchestrates:
//! 1. Planning - Compare config against state, one action per address
//! 2. Diffing - Show what each action changes
//! 3. Executing - Run operations in parallel and fold results into state

pub mod differ;
pub mod executor;
pub mod planner;

pub use executor::{ExecuteOptions, ExecuteSummary, execute, op_context, refresh};
