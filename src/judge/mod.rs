//! Language runtimes.
//!
//! The evaluator stays language-agnostic. The registry maps a language id to
//! a file extension and a single command line that compiles (if needed) and
//! runs the solution.

pub mod adapter;
pub mod registry;

pub use adapter::{Invocation, InvocationRecipe};
pub use registry::{RuntimeRegistry, RuntimeSpec};
