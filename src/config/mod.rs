//! Configuration & shared types
//!
//! - [`types`]: requests, outcomes, failure taxonomy and the error type
//! - [`settings`]: config.json loading and defaults

pub mod settings;
pub mod types;
