use crate::config::settings::AocgenConfig;
use crate::config::types::{
    EvalError, EvaluationOutcome, EvaluationRequest, FailureKind, Result, Verdict,
};
use crate::exec::runner::ProcessRunner;
use crate::judge::registry::RuntimeRegistry;
use crate::utils::output::OutputLimits;
use crate::verdict::matcher::OutcomeJudge;
use log::{debug, info};

/// Registry lookup, bounded run, then judging. Holds only immutable parts,
/// so one evaluator can serve concurrent calls.
#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    registry: RuntimeRegistry,
    runner: ProcessRunner,
    judge: OutcomeJudge,
}

impl Evaluator {
    pub fn new(registry: RuntimeRegistry, runner: ProcessRunner, judge: OutcomeJudge) -> Self {
        Self {
            registry,
            runner,
            judge,
        }
    }

    pub fn from_config(config: &AocgenConfig) -> Self {
        Self::new(
            RuntimeRegistry::with_overrides(&config.languages),
            ProcessRunner::new(OutputLimits::from(&config.output)),
            OutcomeJudge::new(config.judge.fallbacks),
        )
    }

    pub fn registry(&self) -> &RuntimeRegistry {
        &self.registry
    }

    /// Run and judge, keeping every failure as data. Only configuration
    /// problems (unknown language, zero timeout) are errors here, and they
    /// are raised before anything is spawned.
    pub fn assess(&self, request: &EvaluationRequest) -> Result<EvaluationOutcome> {
        if request.timeout.is_zero() {
            return Err(EvalError::Config("timeout must be positive".to_string()));
        }
        // The child runs elsewhere, so a relative source is anchored to our cwd.
        let source = match &request.working_dir {
            Some(_) if request.source_path.is_relative() => {
                std::env::current_dir()?.join(&request.source_path)
            }
            _ => request.source_path.clone(),
        };
        let invocation = self
            .registry
            .invocation_for(&request.language, &source)?
            .in_dir(request.working_dir.clone());

        debug!(
            "Evaluating {} as {} with {:?} budget",
            request.source_path.display(),
            request.language,
            request.timeout
        );
        let run = self.runner.run(&invocation, request.timeout);

        let matched = run.succeeded() && self.judge.judge(&run.output.combined, &request.expected_answer);
        info!(
            "{} [{}]: failure={} matched={} in {:.3}s",
            request.source_path.display(),
            request.language,
            run.failure_kind,
            matched,
            run.wall_time
        );

        Ok(EvaluationOutcome {
            raw_output: run.output.combined,
            stdout: run.output.stdout,
            stderr: run.output.stderr,
            matched,
            failure_kind: run.failure_kind,
            diagnostic: run.diagnostic,
            pid: run.pid,
        })
    }

    /// Verdict for a clean run; timeouts and execution failures become errors
    /// carrying whatever output the program produced.
    pub fn evaluate(&self, request: &EvaluationRequest) -> Result<Verdict> {
        let outcome = self.assess(request)?;
        match outcome.failure_kind {
            FailureKind::None => Ok(Verdict {
                matched: outcome.matched,
                raw_output: outcome.raw_output,
            }),
            FailureKind::Timeout => Err(EvalError::Timeout {
                after: request.timeout,
                partial_output: outcome.raw_output,
            }),
            // Only a run that never started can blame the source file.
            FailureKind::ExecutionError
                if outcome.pid.is_none() && !request.source_path.is_file() =>
            {
                Err(EvalError::MissingSource(request.source_path.clone()))
            }
            FailureKind::ExecutionError => Err(EvalError::Execution {
                detail: outcome.diagnostic,
                output: outcome.raw_output,
                stderr: outcome.stderr,
            }),
        }
    }
}
