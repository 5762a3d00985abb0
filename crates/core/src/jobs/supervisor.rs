//! Launches and monitors one worker process per job.
//!
//! Supervision runs on its own spawned task. Both output streams are drained
//! concurrently with waiting on the child, and the resulting [`JobOutcome`]
//! is applied to the record by that same task. Nothing is propagated across
//! the spawn boundary; failures end up as job state.

use std::process::{ExitStatus, Stdio};
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

use crate::jobs::command::WorkerCommand;
use crate::jobs::log_buffer::LogSource;
use crate::jobs::record::{JobOutcome, JobRecord};

/// Log marker appended when a job finishes with exit code 0.
pub const COMPLETED_MARKER: &str = "✅ Completed";

/// Runs worker processes on behalf of job records.
pub struct ProcessSupervisor;

impl ProcessSupervisor {
    /// Supervise `job` from `queued` to a terminal state.
    ///
    /// Intended to be passed to `tokio::spawn` exactly once per job.
    pub async fn start(job: Arc<JobRecord>, command: WorkerCommand) {
        if let Err(e) = job.mark_running(&format!("▶ Starting {}...", command.label)) {
            tracing::warn!(job_id = %job.id(), error = %e, "Job not startable, skipping");
            return;
        }
        tracing::info!(job_id = %job.id(), program = %command.program, "Worker starting");

        let outcome = Self::run(&job, &command).await;
        Self::apply(&job, &command, outcome);
    }

    /// Spawn the worker and stream its output into the job log until it exits.
    pub async fn run(job: &JobRecord, command: &WorkerCommand) -> JobOutcome {
        let mut cmd = command.to_command();
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                return JobOutcome::SpawnFailed(format!("Failed to start {}: {e}", command.label));
            }
        };

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let (_, _, status) = tokio::join!(
            drain_stream(job, LogSource::Out, stdout),
            drain_stream(job, LogSource::Err, stderr),
            child.wait(),
        );

        match status {
            Ok(status) => exit_outcome(status),
            Err(e) => JobOutcome::WaitFailed(format!("Failed to wait for {}: {e}", command.label)),
        }
    }

    /// Record `outcome` as the job's terminal state.
    pub fn apply(job: &JobRecord, command: &WorkerCommand, outcome: JobOutcome) {
        let label = &command.label;
        let result = match &outcome {
            JobOutcome::Completed { exit_code: Some(0) } => {
                tracing::info!(job_id = %job.id(), "Worker completed");
                job.complete(COMPLETED_MARKER)
            }
            JobOutcome::Completed {
                exit_code: Some(code),
            } => {
                tracing::warn!(job_id = %job.id(), exit_code = code, "Worker failed");
                job.fail(&format!("{label} failed (code {code})"), Some(*code))
            }
            JobOutcome::Completed { exit_code: None } => {
                tracing::warn!(job_id = %job.id(), "Worker terminated without exit code");
                job.fail(&format!("{label} terminated without an exit code"), None)
            }
            JobOutcome::SpawnFailed(reason) | JobOutcome::WaitFailed(reason) => {
                tracing::error!(job_id = %job.id(), error = %reason, "Worker did not run to completion");
                job.fail(reason, None)
            }
        };

        if let Err(e) = result {
            tracing::error!(job_id = %job.id(), error = %e, "Failed to record job outcome");
        }
    }
}

/// Signal terminations carry no exit code.
fn exit_outcome(status: ExitStatus) -> JobOutcome {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            tracing::debug!(signal, "Worker killed by signal");
        }
    }
    JobOutcome::Completed {
        exit_code: status.code(),
    }
}

/// Append every line of `stream` to the job log, tagged with `source`.
///
/// A partial trailing line is held in the reader until its newline or EOF.
async fn drain_stream<R>(job: &JobRecord, source: LogSource, stream: Option<R>)
where
    R: AsyncRead + Unpin,
{
    let Some(stream) = stream else {
        return;
    };

    let mut segments = BufReader::new(stream).split(b'\n');
    loop {
        match segments.next_segment().await {
            Ok(Some(bytes)) => job.append_log(source, &String::from_utf8_lossy(&bytes)),
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(job_id = %job.id(), stream = %source, error = %e, "Failed to read worker output");
                break;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
