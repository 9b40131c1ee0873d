/// Core types shared by the registry, runner, judge and evaluator
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// One evaluation call: which program, in which language, judged against what.
#[derive(Clone, Debug)]
pub struct EvaluationRequest {
    /// Solution source file (must exist, owned by the caller)
    pub source_path: PathBuf,
    /// Language identifier, case-sensitive ("python", "go", ...)
    pub language: String,
    /// Expected answer substring
    pub expected_answer: String,
    /// Wall clock budget, compile time included
    pub timeout: Duration,
    /// Directory the program runs in (defaults to the caller's cwd)
    pub working_dir: Option<PathBuf>,
}

impl EvaluationRequest {
    pub fn new(
        source_path: impl Into<PathBuf>,
        language: impl Into<String>,
        expected_answer: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            source_path: source_path.into(),
            language: language.into(),
            expected_answer: expected_answer.into(),
            timeout,
            working_dir: None,
        }
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }
}

/// Why an evaluation did not produce a judged verdict.
/// Closed set: a run either finished cleanly, ran out of time, or failed.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum FailureKind {
    #[default]
    #[serde(rename = "none")]
    None,
    #[serde(rename = "timeout")]
    Timeout,
    #[serde(rename = "execution_error")]
    ExecutionError,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::None => write!(f, "none"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::ExecutionError => write!(f, "execution_error"),
        }
    }
}

/// Output integrity classification
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum OutputIntegrity {
    #[default]
    #[serde(rename = "complete")]
    Complete,
    #[serde(rename = "truncated_by_limit")]
    TruncatedByLimit,
    #[serde(rename = "collection_timed_out")]
    CollectionTimedOut,
    #[serde(rename = "read_error")]
    ReadError,
}

impl std::fmt::Display for OutputIntegrity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputIntegrity::Complete => write!(f, "complete"),
            OutputIntegrity::TruncatedByLimit => write!(f, "truncated_by_limit"),
            OutputIntegrity::CollectionTimedOut => write!(f, "collection_timed_out"),
            OutputIntegrity::ReadError => write!(f, "read_error"),
        }
    }
}

/// Captured output of one child process
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CapturedOutput {
    /// Standard output
    pub stdout: String,
    /// Standard error
    pub stderr: String,
    /// Both streams in arrival order
    pub combined: String,
    /// Worst integrity state across both streams
    pub integrity: OutputIntegrity,
}

/// Result of running one invocation under a deadline, before judging
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RunOutcome {
    /// Captured output (partial when timed out)
    pub output: CapturedOutput,
    /// Failure classification
    pub failure_kind: FailureKind,
    /// Human-readable detail, empty on success
    pub diagnostic: String,
    /// Exit code of the process
    pub exit_code: Option<i32>,
    /// Signal that terminated the process (if any)
    pub signal: Option<i32>,
    /// Wall clock time (in seconds)
    pub wall_time: f64,
    /// Pid of the child, `None` when nothing was spawned
    pub pid: Option<u32>,
}

impl RunOutcome {
    /// Failure that happened before any process existed.
    pub fn not_started(diagnostic: impl Into<String>) -> Self {
        Self {
            failure_kind: FailureKind::ExecutionError,
            diagnostic: diagnostic.into(),
            ..Self::default()
        }
    }

    pub fn succeeded(&self) -> bool {
        self.failure_kind == FailureKind::None
    }
}

/// Judged evaluation: what the runner saw plus the judge's stamp.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EvaluationOutcome {
    /// Combined stdout/stderr
    pub raw_output: String,
    pub stdout: String,
    pub stderr: String,
    /// Set by the judge; always false unless `failure_kind` is `None`
    pub matched: bool,
    pub failure_kind: FailureKind,
    pub diagnostic: String,
    /// Child pid, `None` when nothing was spawned
    pub pid: Option<u32>,
}

/// Verdict reported to callers of `Evaluator::evaluate`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub matched: bool,
    pub raw_output: String,
}

/// Custom error types for aocgen
#[derive(Error, Debug)]
pub enum EvalError {
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("solution file not found: {}", .0.display())]
    MissingSource(PathBuf),

    #[error("process killed as timeout reached after {after:?}")]
    Timeout {
        after: Duration,
        partial_output: String,
    },

    #[error("process finished with error: {detail}")]
    Execution {
        detail: String,
        output: String,
        stderr: String,
    },

    #[error("challenge not found: {0}")]
    ChallengeNotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("model provider error: {0}")]
    Provider(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EvalError {
    /// Whatever the program printed before failing, for caller-side diagnostics.
    pub fn raw_output(&self) -> Option<&str> {
        match self {
            EvalError::Timeout { partial_output, .. } => Some(partial_output),
            EvalError::Execution { output, .. } => Some(output),
            _ => None,
        }
    }

    /// Which failure kind this error reports, if it came from a run.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            EvalError::Timeout { .. } => Some(FailureKind::Timeout),
            EvalError::Execution { .. } | EvalError::MissingSource(_) => {
                Some(FailureKind::ExecutionError)
            }
            _ => None,
        }
    }
}

impl From<reqwest::Error> for EvalError {
    fn from(err: reqwest::Error) -> Self {
        EvalError::Http(err.to_string())
    }
}

/// Result type alias for aocgen operations
pub type Result<T> = std::result::Result<T, EvalError>;
