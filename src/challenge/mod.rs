//! Puzzle bookkeeping around the evaluator: the local challenge cache,
//! puzzle download and model-backed solution generation.

pub mod fetch;
pub mod generate;
pub mod store;

pub use fetch::PuzzleClient;
pub use generate::ModelProvider;
pub use store::{Challenge, ChallengeStore};
