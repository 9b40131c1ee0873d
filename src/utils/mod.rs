//! Utilities
//!
//! Bounded output collection for spawned programs.

pub mod output;
