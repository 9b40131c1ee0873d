/// Process execution under a wall clock deadline
///
/// One child per run, spawned as the leader of its own process group. A
/// watcher thread blocks in `waitid(WNOWAIT)` and signals when the child has
/// exited without reaping it, so the pid and process group stay valid until
/// the runner has swept the group. The runner blocks on whichever of the exit
/// signal and the deadline fires first.
use crate::config::types::{FailureKind, RunOutcome};
use crate::judge::adapter::Invocation;
use crate::utils::output::{OutputCollector, OutputLimits};
use crossbeam_channel::{after, bounded, select, Receiver};
use log::{debug, warn};
use nix::errno::Errno;
use nix::sys::signal::{killpg, Signal};
use nix::sys::wait::{waitid, Id, WaitPidFlag};
use nix::unistd::Pid;
use std::os::unix::process::{CommandExt, ExitStatusExt};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// Runs one invocation at a time per call; holds no per-run state.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    limits: OutputLimits,
}

enum Race {
    Exited,
    DeadlineExpired,
    WatcherLost(String),
}

impl ProcessRunner {
    pub fn new(limits: OutputLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &OutputLimits {
        &self.limits
    }

    /// Execute `invocation`, killing it if it outlives `timeout`.
    pub fn run(&self, invocation: &Invocation, timeout: Duration) -> RunOutcome {
        if !invocation.source.is_file() {
            return RunOutcome::not_started(format!(
                "solution file not found: {}",
                invocation.source.display()
            ));
        }

        let start_time = Instant::now();
        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .process_group(0);
        if let Some(dir) = &invocation.working_dir {
            cmd.current_dir(dir);
        }

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                return RunOutcome::not_started(format!(
                    "failed to start command `{}`: {}",
                    invocation.display(),
                    e
                ))
            }
        };
        let pid = child.id();
        debug!("Spawned `{}` as pid {}", invocation.display(), pid);

        let collector =
            OutputCollector::start(&self.limits, child.stdout.take(), child.stderr.take());

        let race = match spawn_exit_watcher(pid) {
            Ok(exited) => wait_first(&exited, timeout),
            Err(e) => Race::WatcherLost(format!("failed to watch process: {}", e)),
        };

        if let Race::DeadlineExpired = race {
            warn!(
                "pid {} exceeded {:?}, killing process group",
                pid, timeout
            );
        }

        // Sweep on every path: a runaway leader or descendants left behind by
        // a clean exit both die here, while the unreaped leader pins the pgid.
        kill_process_group(pid);
        let status = reap(&mut child);
        let output = collector.finish(self.limits.collection_grace);
        let wall_time = start_time.elapsed().as_secs_f64();

        let mut outcome = RunOutcome {
            output,
            wall_time,
            pid: Some(pid),
            ..RunOutcome::default()
        };

        let status = match (race, status) {
            (Race::DeadlineExpired, status) => {
                outcome.failure_kind = FailureKind::Timeout;
                outcome.diagnostic =
                    format!("process killed as timeout reached after {:?}", timeout);
                outcome.signal = status.ok().and_then(|s| s.signal());
                return outcome;
            }
            (Race::WatcherLost(reason), _) => {
                outcome.failure_kind = FailureKind::ExecutionError;
                outcome.diagnostic = reason;
                return outcome;
            }
            (Race::Exited, Err(reason)) => {
                outcome.failure_kind = FailureKind::ExecutionError;
                outcome.diagnostic = reason;
                return outcome;
            }
            (Race::Exited, Ok(status)) => status,
        };

        outcome.exit_code = status.code();
        outcome.signal = status.signal();
        if status.success() {
            debug!("pid {} exited cleanly in {:.3}s", pid, wall_time);
            return outcome;
        }

        let reason = match (status.code(), status.signal()) {
            (Some(code), _) => format!("exit status {}", code),
            (None, Some(signal)) => format!("terminated by signal {}", signal),
            (None, None) => "abnormal termination".to_string(),
        };
        let stderr = outcome.output.stderr.trim();
        outcome.failure_kind = FailureKind::ExecutionError;
        outcome.diagnostic = if stderr.is_empty() {
            reason
        } else {
            format!("{}\n{}", reason, stderr)
        };
        debug!("pid {} failed: {}", pid, outcome.diagnostic);
        outcome
    }
}

fn wait_first(exited: &Receiver<nix::Result<()>>, timeout: Duration) -> Race {
    let deadline = after(timeout);
    select! {
        recv(exited) -> msg => match msg {
            Ok(Ok(())) => Race::Exited,
            Ok(Err(errno)) => Race::WatcherLost(format!("waitid failed: {}", errno)),
            Err(_) => Race::WatcherLost("exit watcher disconnected".to_string()),
        },
        recv(deadline) -> _ => Race::DeadlineExpired,
    }
}

/// Signals once the child has exited. Never reaps.
fn spawn_exit_watcher(pid: u32) -> std::io::Result<Receiver<nix::Result<()>>> {
    let (tx, rx) = bounded(1);
    thread::Builder::new()
        .name(format!("exit-watcher-{}", pid))
        .spawn(move || {
            let target = Pid::from_raw(pid as i32);
            let result = loop {
                match waitid(Id::Pid(target), WaitPidFlag::WEXITED | WaitPidFlag::WNOWAIT) {
                    Err(Errno::EINTR) => continue,
                    other => break other.map(|_| ()),
                }
            };
            // Receiver is gone when the deadline won; nothing to report then.
            let _ = tx.send(result);
        })?;
    Ok(rx)
}

/// SIGKILL the group led by `pid`. ESRCH means it is already empty.
fn kill_process_group(pid: u32) {
    match killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => {}
        // EPERM shows up on macOS once only the zombie leader remains.
        Err(e) => debug!("killpg({}) failed: {}", pid, e),
    }
}

fn reap(child: &mut Child) -> std::result::Result<ExitStatus, String> {
    child
        .wait()
        .map_err(|e| format!("failed to reap process {}: {}", child.id(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::judge::adapter::InvocationRecipe;
    use std::path::Path;

    fn bash_script(dir: &Path, body: &str) -> Invocation {
        let path = dir.join("script.sh");
        std::fs::write(&path, body).unwrap();
        InvocationRecipe::new("bash", &["{source}"]).expand(&path)
    }

    #[test]
    fn test_missing_source_never_spawns() {
        let runner = ProcessRunner::default();
        let invocation =
            InvocationRecipe::new("bash", &["{source}"]).expand(Path::new("/nonexistent/x.sh"));
        let outcome = runner.run(&invocation, Duration::from_secs(1));
        assert_eq!(outcome.failure_kind, FailureKind::ExecutionError);
        assert!(outcome.pid.is_none());
        assert!(outcome.diagnostic.contains("not found"));
    }

    #[test]
    fn test_missing_toolchain_is_execution_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, "").unwrap();
        let invocation =
            InvocationRecipe::new("aocgen-no-such-toolchain", &["{source}"]).expand(&path);

        let outcome = ProcessRunner::default().run(&invocation, Duration::from_secs(1));
        assert_eq!(outcome.failure_kind, FailureKind::ExecutionError);
        assert!(outcome.diagnostic.contains("failed to start"));
    }

    #[test]
    fn test_clean_exit_captures_output() {
        let dir = tempfile::tempdir().unwrap();
        let invocation = bash_script(dir.path(), "echo 'The answer is: 42'\necho note >&2\n");

        let outcome = ProcessRunner::default().run(&invocation, Duration::from_secs(10));
        assert_eq!(outcome.failure_kind, FailureKind::None, "{}", outcome.diagnostic);
        assert_eq!(outcome.exit_code, Some(0));
        assert_eq!(outcome.output.stdout, "The answer is: 42\n");
        assert_eq!(outcome.output.stderr, "note\n");
        assert!(outcome.output.combined.contains("42"));
    }

    #[test]
    fn test_nonzero_exit_surfaces_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let invocation = bash_script(dir.path(), "echo partial\necho boom >&2\nexit 3\n");

        let outcome = ProcessRunner::default().run(&invocation, Duration::from_secs(10));
        assert_eq!(outcome.failure_kind, FailureKind::ExecutionError);
        assert_eq!(outcome.exit_code, Some(3));
        assert!(outcome.diagnostic.contains("exit status 3"));
        assert!(outcome.diagnostic.contains("boom"));
        assert_eq!(outcome.output.stdout, "partial\n");
    }

    #[test]
    fn test_timeout_kills_and_keeps_partial_output() {
        let dir = tempfile::tempdir().unwrap();
        let invocation = bash_script(dir.path(), "echo started\nwhile true; do :; done\n");

        let started = Instant::now();
        let outcome = ProcessRunner::default().run(&invocation, Duration::from_millis(500));
        assert_eq!(outcome.failure_kind, FailureKind::Timeout);
        assert_eq!(outcome.signal, Some(Signal::SIGKILL as i32));
        assert!(outcome.output.stdout.contains("started"));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_working_dir_is_applied() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("input.txt"), "puzzle-input").unwrap();
        let invocation = bash_script(dir.path(), "cat input.txt\n")
            .in_dir(Some(dir.path().to_path_buf()));

        let outcome = ProcessRunner::default().run(&invocation, Duration::from_secs(10));
        assert!(outcome.succeeded(), "{}", outcome.diagnostic);
        assert_eq!(outcome.output.stdout, "puzzle-input");
    }
}
