//! Answer matching
//!
//! Pure functions over captured output; judging never fails, it only says
//! yes or no.

pub mod matcher;

pub use matcher::{MatchRule, OutcomeJudge};
