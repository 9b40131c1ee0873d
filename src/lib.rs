//! aocgen: run puzzle solutions written in many languages and judge their output
//!
//! # Architecture
//!
//! ## Runtime Registry ([`judge`])
//! - [`judge::registry`]: Language identifier to file extension and invocation recipe
//! - [`judge::adapter`]: Recipe expansion into a concrete command line
//!
//! ## Execution Control ([`exec`])
//! - [`exec::runner`]: Process-group spawn, wall clock deadline, group kill and reap
//!
//! ## Verdict ([`verdict`])
//! - [`verdict::matcher`]: Substring judging with answer-derived fallbacks
//!
//! ## Orchestration ([`core`])
//! - [`core::evaluator`]: Registry lookup, bounded run, judgement
//!
//! ## Configuration ([`config`])
//! - [`config::settings`]: `config.json` loading, cache dir resolution
//! - [`config::types`]: Requests, outcomes and the error type
//!
//! ## Utilities ([`utils`])
//! - [`utils::output`]: Bounded output collection
//!
//! ## Challenges ([`challenge`])
//! - [`challenge::store`]: Cached challenges in `challenges.json`
//! - [`challenge::fetch`]: Puzzle page and input download
//! - [`challenge::generate`]: Model-backed solution generation

// Runtime Registry
pub mod judge;

// Execution Control
pub mod exec;

// Verdict
pub mod verdict;

// Orchestration
pub mod core;

// Configuration
pub mod config;

// Utilities
pub mod utils;

// Challenge cache, download and generation
pub mod challenge;

// CLI entrypoint for the aocgen binary
pub mod cli;

pub use config::types::*;
pub use crate::core::Evaluator;
