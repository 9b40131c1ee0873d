//! Execution control
//!
//! - [`runner`]: spawn, race exit against a deadline, kill and reap

pub mod runner;

pub use runner::ProcessRunner;
