/// Bounded output collection for child processes
///
/// Each stream gets its own reader thread. Bytes land in a per-stream buffer
/// and in a combined buffer in arrival order, both capped. Readers keep
/// draining past the cap so the child never blocks on a full pipe.
use crate::config::settings::OutputConfig;
use crate::config::types::{CapturedOutput, OutputIntegrity};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::io::Read;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

/// Output limits configuration
#[derive(Debug, Clone)]
pub struct OutputLimits {
    /// Combined stdout+stderr limit (bytes)
    pub combined_limit: usize,
    /// Per-stream stdout limit (bytes)
    pub stdout_limit: usize,
    /// Per-stream stderr limit (bytes)
    pub stderr_limit: usize,
    /// How long to wait for readers once the child is gone
    pub collection_grace: Duration,
}

impl Default for OutputLimits {
    fn default() -> Self {
        OutputLimits::from(&OutputConfig::default())
    }
}

impl From<&OutputConfig> for OutputLimits {
    fn from(config: &OutputConfig) -> Self {
        OutputLimits {
            combined_limit: config.combined_limit,
            stdout_limit: config.stdout_limit,
            stderr_limit: config.stderr_limit,
            collection_grace: Duration::from_millis(config.collection_grace_ms),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

#[derive(Default)]
struct Buffers {
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    combined: Vec<u8>,
    combined_truncated: bool,
}

/// Running collection over one child's stdout and stderr
pub struct OutputCollector {
    buffers: Arc<Mutex<Buffers>>,
    pending: Vec<Receiver<OutputIntegrity>>,
}

impl OutputCollector {
    /// Spawn reader threads for whichever streams are present
    pub fn start<O, E>(limits: &OutputLimits, stdout: Option<O>, stderr: Option<E>) -> Self
    where
        O: Read + Send + 'static,
        E: Read + Send + 'static,
    {
        let buffers = Arc::new(Mutex::new(Buffers::default()));
        let mut pending = Vec::new();

        if let Some(stdout) = stdout {
            pending.push(spawn_reader(
                stdout,
                Stream::Stdout,
                limits.stdout_limit,
                limits.combined_limit,
                Arc::clone(&buffers),
            ));
        }
        if let Some(stderr) = stderr {
            pending.push(spawn_reader(
                stderr,
                Stream::Stderr,
                limits.stderr_limit,
                limits.combined_limit,
                Arc::clone(&buffers),
            ));
        }

        OutputCollector { buffers, pending }
    }

    /// Wait up to `grace` for readers to hit EOF, then snapshot the buffers.
    /// A reader still blocked after the grace period is abandoned.
    pub fn finish(self, grace: Duration) -> CapturedOutput {
        let deadline = Instant::now() + grace;
        let mut integrity = OutputIntegrity::Complete;

        for rx in &self.pending {
            let stream_integrity = rx
                .recv_deadline(deadline)
                .unwrap_or(OutputIntegrity::CollectionTimedOut);
            integrity = worst(integrity, stream_integrity);
        }

        let buffers = self.buffers.lock().unwrap_or_else(|e| e.into_inner());
        if buffers.combined_truncated {
            integrity = worst(integrity, OutputIntegrity::TruncatedByLimit);
        }

        CapturedOutput {
            stdout: String::from_utf8_lossy(&buffers.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&buffers.stderr).into_owned(),
            combined: String::from_utf8_lossy(&buffers.combined).into_owned(),
            integrity,
        }
    }
}

fn severity(integrity: OutputIntegrity) -> u8 {
    match integrity {
        OutputIntegrity::Complete => 0,
        OutputIntegrity::TruncatedByLimit => 1,
        OutputIntegrity::CollectionTimedOut => 2,
        OutputIntegrity::ReadError => 3,
    }
}

fn worst(a: OutputIntegrity, b: OutputIntegrity) -> OutputIntegrity {
    if severity(b) > severity(a) {
        b
    } else {
        a
    }
}

fn spawn_reader<R: Read + Send + 'static>(
    stream: R,
    kind: Stream,
    limit: usize,
    combined_limit: usize,
    buffers: Arc<Mutex<Buffers>>,
) -> Receiver<OutputIntegrity> {
    let (tx, rx) = bounded(1);
    let name = match kind {
        Stream::Stdout => "collect-stdout",
        Stream::Stderr => "collect-stderr",
    };
    let spawned = thread::Builder::new()
        .name(name.to_string())
        .spawn(move || collect_stream(stream, kind, limit, combined_limit, &buffers, tx));
    if let Err(e) = spawned {
        log::warn!("Failed to spawn {} thread: {}", name, e);
    }
    rx
}

/// Collect from a single stream with limit
fn collect_stream<R: Read>(
    mut stream: R,
    kind: Stream,
    limit: usize,
    combined_limit: usize,
    buffers: &Mutex<Buffers>,
    tx: Sender<OutputIntegrity>,
) {
    let mut chunk = [0u8; 4096];
    let mut integrity = OutputIntegrity::Complete;

    loop {
        match stream.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                let mut buffers = buffers.lock().unwrap_or_else(|e| e.into_inner());
                let own = match kind {
                    Stream::Stdout => &mut buffers.stdout,
                    Stream::Stderr => &mut buffers.stderr,
                };
                let room = limit.saturating_sub(own.len());
                if room < n {
                    integrity = OutputIntegrity::TruncatedByLimit;
                }
                own.extend_from_slice(&chunk[..n.min(room)]);

                let room = combined_limit.saturating_sub(buffers.combined.len());
                if room < n {
                    buffers.combined_truncated = true;
                }
                buffers.combined.extend_from_slice(&chunk[..n.min(room)]);
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                log::debug!("{:?} read failed: {}", kind, e);
                integrity = OutputIntegrity::ReadError;
                break;
            }
        }
    }

    let _ = tx.send(integrity);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn limits(stdout: usize, stderr: usize, combined: usize) -> OutputLimits {
        OutputLimits {
            combined_limit: combined,
            stdout_limit: stdout,
            stderr_limit: stderr,
            collection_grace: Duration::from_millis(500),
        }
    }

    #[test]
    fn test_output_limits_default() {
        let limits = OutputLimits::default();
        assert_eq!(limits.combined_limit, 10 * 1024 * 1024);
        assert_eq!(limits.stdout_limit, 8 * 1024 * 1024);
        assert_eq!(limits.stderr_limit, 2 * 1024 * 1024);
    }

    #[test]
    fn test_no_streams() {
        let collector =
            OutputCollector::start::<Cursor<Vec<u8>>, Cursor<Vec<u8>>>(&limits(8, 8, 8), None, None);
        let output = collector.finish(Duration::from_millis(100));
        assert!(output.combined.is_empty());
        assert_eq!(output.integrity, OutputIntegrity::Complete);
    }

    #[test]
    fn test_collects_both_streams() {
        let collector = OutputCollector::start(
            &limits(1024, 1024, 2048),
            Some(Cursor::new(b"answer 42\n".to_vec())),
            Some(Cursor::new(b"warning\n".to_vec())),
        );
        let output = collector.finish(Duration::from_secs(1));
        assert_eq!(output.stdout, "answer 42\n");
        assert_eq!(output.stderr, "warning\n");
        assert!(output.combined.contains("answer 42"));
        assert!(output.combined.contains("warning"));
        assert_eq!(output.integrity, OutputIntegrity::Complete);
    }

    #[test]
    fn test_stream_limit_truncates() {
        let collector = OutputCollector::start::<_, Cursor<Vec<u8>>>(
            &limits(4, 4, 64),
            Some(Cursor::new(b"0123456789".to_vec())),
            None,
        );
        let output = collector.finish(Duration::from_secs(1));
        assert_eq!(output.stdout, "0123");
        assert_eq!(output.integrity, OutputIntegrity::TruncatedByLimit);
    }

    #[test]
    fn test_combined_limit_truncates() {
        let collector = OutputCollector::start::<_, Cursor<Vec<u8>>>(
            &limits(64, 64, 3),
            Some(Cursor::new(b"abcdef".to_vec())),
            None,
        );
        let output = collector.finish(Duration::from_secs(1));
        assert_eq!(output.stdout, "abcdef");
        assert_eq!(output.combined, "abc");
        assert_eq!(output.integrity, OutputIntegrity::TruncatedByLimit);
    }

    #[test]
    fn test_output_integrity_display() {
        assert_eq!(format!("{}", OutputIntegrity::Complete), "complete");
        assert_eq!(format!("{}", OutputIntegrity::TruncatedByLimit), "truncated_by_limit");
        assert_eq!(format!("{}", OutputIntegrity::CollectionTimedOut), "collection_timed_out");
        assert_eq!(format!("{}", OutputIntegrity::ReadError), "read_error");
    }
}
