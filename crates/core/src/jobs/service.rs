//! Job submission and polling.
//!
//! [`JobService`] ties the pieces together: it validates a request, prepares
//! the target folder, registers a queued job, hands it to a
//! [`ProcessSupervisor`] on a spawned task, and serves cursor-based polls.

use std::sync::Arc;

use serde::Serialize;

use crate::error::CoreError;
use crate::jobs::command::WorkerCommandBuilder;
use crate::jobs::log_buffer::{LogSource, DEFAULT_LOG_CAPACITY};
use crate::jobs::record::{JobId, JobRecord, JobSnapshot};
use crate::jobs::registry::JobRegistry;
use crate::jobs::supervisor::ProcessSupervisor;
use crate::library::MusicLibrary;
use crate::validation::{validate_folder_name, validate_source_url};

/// One poll response: job state plus the log lines at or after the cursor.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPoll {
    pub job: JobSnapshot,
    pub logs: Vec<String>,
    pub next_since: u64,
}

pub struct JobService {
    registry: Arc<JobRegistry>,
    library: MusicLibrary,
    commands: Arc<dyn WorkerCommandBuilder>,
    log_capacity: usize,
}

impl JobService {
    pub fn new(
        registry: Arc<JobRegistry>,
        library: MusicLibrary,
        commands: Arc<dyn WorkerCommandBuilder>,
    ) -> Self {
        Self {
            registry,
            library,
            commands,
            log_capacity: DEFAULT_LOG_CAPACITY,
        }
    }

    /// Maximum number of retained log lines for jobs submitted from now on.
    pub fn with_log_capacity(mut self, log_capacity: usize) -> Self {
        self.log_capacity = log_capacity;
        self
    }

    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    pub fn library(&self) -> &MusicLibrary {
        &self.library
    }

    /// Accept a download request and start it in the background.
    ///
    /// Returns as soon as the job is registered; the worker is launched on a
    /// separate task and may not have started yet. On a multi-thread runtime
    /// that task can begin before the caller has sent its response.
    pub async fn submit(&self, source_url: &str, folder: &str) -> Result<JobId, CoreError> {
        let source_url = validate_source_url(source_url)?;
        let folder = validate_folder_name(folder)?;
        self.library.ensure_folder(&folder).await?;

        let id = JobId::generate();
        let record = JobRecord::new(id.clone(), source_url, folder, self.log_capacity);
        record.append_log(LogSource::Out, &format!("Job queued: {id}"));
        record.append_log(LogSource::Out, &format!("Folder: {}", record.folder()));

        let job = self.registry.create(record).await?;
        let command = self.commands.build(job.source_url(), job.folder());

        tracing::info!(job_id = %id, folder = %job.folder(), "Job queued");
        tokio::spawn(ProcessSupervisor::start(job, command));

        Ok(id)
    }

    /// Current state of a job plus every retained log line from `since` on.
    pub async fn poll(&self, job_id: &str, since: u64) -> Result<JobPoll, CoreError> {
        let job = self.registry.get(job_id).await?;
        let (snapshot, slice) = job.read(since);
        Ok(JobPoll {
            job: snapshot,
            logs: slice.lines,
            next_since: slice.next_cursor,
        })
    }

    pub async fn list_folders(&self) -> Result<Vec<String>, CoreError> {
        self.library.list_folders().await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(all(test, unix))]
mod tests {
    use std::time::Duration;

    use assert_matches::assert_matches;
    use tempfile::TempDir;

    use super::*;
    use crate::jobs::command::WorkerCommand;
    use crate::jobs::record::JobStatus;

    /// Runs a fixed shell script regardless of the request.
    struct ShellCommand(&'static str);

    impl WorkerCommandBuilder for ShellCommand {
        fn build(&self, _source_url: &str, _folder: &str) -> WorkerCommand {
            WorkerCommand::new("worker", "sh").arg("-c").arg(self.0)
        }
    }

    struct MissingProgram;

    impl WorkerCommandBuilder for MissingProgram {
        fn build(&self, _source_url: &str, _folder: &str) -> WorkerCommand {
            WorkerCommand::new("worker", "/nonexistent/tunegrab-worker-binary")
        }
    }

    fn service(dir: &TempDir, commands: Arc<dyn WorkerCommandBuilder>) -> JobService {
        JobService::new(
            Arc::new(JobRegistry::new()),
            MusicLibrary::new(dir.path()),
            commands,
        )
    }

    async fn wait_for_terminal(service: &JobService, id: &str) -> JobPoll {
        for _ in 0..200 {
            let poll = service.poll(id, 0).await.expect("poll");
            if poll.job.status.is_terminal() {
                return poll;
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
        panic!("job {id} did not finish");
    }

    const URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

    #[tokio::test]
    async fn submit_creates_folder_and_runs_to_done() {
        let dir = tempfile::tempdir().expect("temp dir");
        let service = service(&dir, Arc::new(ShellCommand("echo downloading")));

        let id = service.submit(URL, "Jazz").await.expect("submit");
        assert_eq!(id.as_str().len(), 32);
        assert!(dir.path().join("Jazz").is_dir());

        let poll = wait_for_terminal(&service, id.as_str()).await;
        assert_eq!(poll.job.status, JobStatus::Done);
        assert_eq!(poll.job.exit_code, Some(0));
        assert_eq!(poll.logs[0], format!("[out] Job queued: {id}"));
        assert_eq!(poll.logs[1], "[out] Folder: Jazz");
        assert!(poll.logs.contains(&"[out] downloading".to_string()));
        assert_eq!(poll.next_since, poll.logs.len() as u64);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn first_poll_sees_queued_job() {
        let dir = tempfile::tempdir().expect("temp dir");
        let service = service(&dir, Arc::new(ShellCommand("echo downloading")));

        let id = service.submit(URL, "Jazz").await.expect("submit");
        let poll = service.poll(id.as_str(), 0).await.expect("poll");

        assert_eq!(poll.job.status, JobStatus::Queued);
        assert_eq!(
            poll.logs,
            vec![format!("[out] Job queued: {id}"), "[out] Folder: Jazz".to_string()]
        );
        assert_eq!(poll.next_since, 2);

        let done = wait_for_terminal(&service, id.as_str()).await;
        assert_eq!(done.job.status, JobStatus::Done);
    }

    #[tokio::test]
    async fn failing_worker_ends_in_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let service = service(&dir, Arc::new(ShellCommand("echo nope >&2; exit 1")));

        let id = service.submit(URL, "Rock").await.expect("submit");
        let poll = wait_for_terminal(&service, id.as_str()).await;

        assert_eq!(poll.job.status, JobStatus::Error);
        assert_eq!(poll.job.exit_code, Some(1));
        assert_eq!(poll.job.error_message.as_deref(), Some("worker failed (code 1)"));
        assert!(poll.logs.contains(&"[err] nope".to_string()));
    }

    #[tokio::test]
    async fn spawn_failure_ends_in_error_without_exit_code() {
        let dir = tempfile::tempdir().expect("temp dir");
        let service = service(&dir, Arc::new(MissingProgram));

        let id = service.submit(URL, "Rock").await.expect("submit");
        let poll = wait_for_terminal(&service, id.as_str()).await;

        assert_eq!(poll.job.status, JobStatus::Error);
        assert_eq!(poll.job.exit_code, None);
        assert!(poll.job.error_message.is_some());
    }

    #[tokio::test]
    async fn cursor_polls_return_only_new_lines() {
        let dir = tempfile::tempdir().expect("temp dir");
        let service = service(&dir, Arc::new(ShellCommand("echo one; echo two")));

        let id = service.submit(URL, "Jazz").await.expect("submit");
        let full = wait_for_terminal(&service, id.as_str()).await;

        let first = service.poll(id.as_str(), 0).await.expect("poll");
        let rest = service.poll(id.as_str(), 2).await.expect("poll");
        assert_eq!(first.logs, full.logs);
        assert_eq!(rest.logs, full.logs[2..].to_vec());

        let past_end = service.poll(id.as_str(), 1_000).await.expect("poll");
        assert!(past_end.logs.is_empty());
        assert_eq!(past_end.next_since, 1_000);
    }

    #[tokio::test]
    async fn invalid_input_is_rejected_before_registration() {
        let dir = tempfile::tempdir().expect("temp dir");
        let service = service(&dir, Arc::new(ShellCommand("exit 0")));

        assert_matches!(
            service.submit("https://example.com/video", "Jazz").await,
            Err(CoreError::Validation(msg)) if msg == "Invalid youtubeUrl"
        );
        assert_matches!(
            service.submit(URL, "../etc").await,
            Err(CoreError::Validation(msg)) if msg == "Invalid folder"
        );
        assert!(service.registry().is_empty().await);
    }

    #[tokio::test]
    async fn missing_library_root_is_internal_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let service = JobService::new(
            Arc::new(JobRegistry::new()),
            MusicLibrary::new(dir.path().join("missing")),
            Arc::new(ShellCommand("exit 0")),
        );

        assert_matches!(
            service.submit(URL, "Jazz").await,
            Err(CoreError::Internal(msg)) if msg == "MUSIC_ROOT missing"
        );
    }

    #[tokio::test]
    async fn unknown_job_is_not_found() {
        let dir = tempfile::tempdir().expect("temp dir");
        let service = service(&dir, Arc::new(ShellCommand("exit 0")));
        assert_matches!(
            service.poll("0123456789abcdef0123456789abcdef", 0).await,
            Err(CoreError::NotFound { entity: "Job", .. })
        );
    }

    #[tokio::test]
    async fn log_capacity_bounds_retained_lines() {
        let dir = tempfile::tempdir().expect("temp dir");
        let service = service(&dir, Arc::new(ShellCommand("for i in 1 2 3 4 5 6; do echo $i; done")))
            .with_log_capacity(3);

        let id = service.submit(URL, "Jazz").await.expect("submit");
        let poll = wait_for_terminal(&service, id.as_str()).await;

        assert_eq!(poll.logs.len(), 3);
        assert_eq!(poll.logs.last().map(String::as_str), Some("[out] ✅ Completed"));
        assert!(poll.next_since > 3);
    }
}
