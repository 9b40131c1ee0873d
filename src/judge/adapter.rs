use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Placeholder replaced by the solution path when a recipe is expanded.
pub const SOURCE_PLACEHOLDER: &str = "{source}";

/// How to run a source file: one external command, compile step included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationRecipe {
    pub program: String,
    pub args: Vec<String>,
}

impl InvocationRecipe {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Substitute the source path into the argument list.
    pub fn expand(&self, source: &Path) -> Invocation {
        let source_arg = source.to_string_lossy();
        Invocation {
            program: self.program.clone(),
            args: self
                .args
                .iter()
                .map(|arg| arg.replace(SOURCE_PLACEHOLDER, &source_arg))
                .collect(),
            source: source.to_path_buf(),
            working_dir: None,
        }
    }
}

/// A fully resolved command line for one evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// The solution file; checked before spawning
    pub source: PathBuf,
    pub working_dir: Option<PathBuf>,
}

impl Invocation {
    pub fn in_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.working_dir = dir;
        self
    }

    /// Shell-ish rendering for logs
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
