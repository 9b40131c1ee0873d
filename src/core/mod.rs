//! Evaluation orchestration
//!
//! Composes the runtime registry, the process runner and the outcome judge
//! into one call.

pub mod evaluator;

pub use evaluator::Evaluator;
