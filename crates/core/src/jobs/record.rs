//! Job identity, lifecycle state, and the per-job record.
//!
//! A [`JobRecord`] pairs immutable identity (id, source URL, folder, creation
//! time) with mutable lifecycle state and a [`LogBuffer`]. The mutable part
//! sits behind a single mutex that is only held for one field mutation or one
//! snapshot read, never across process I/O.

use std::borrow::Borrow;
use std::fmt;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use rand::Rng;
use serde::Serialize;

use crate::error::CoreError;
use crate::jobs::log_buffer::{LogBuffer, LogSlice, LogSource};
use crate::types::Timestamp;

/// Number of random bytes in a job id (rendered as twice as many hex chars).
const JOB_ID_BYTES: usize = 16;

// ---------------------------------------------------------------------------
// JobId
// ---------------------------------------------------------------------------

/// Opaque, unguessable job identifier: 32 lowercase hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Generate a fresh id from the thread-local CSPRNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; JOB_ID_BYTES];
        rand::rng().fill(&mut bytes);
        Self(bytes.iter().map(|b| format!("{b:02x}")).collect())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for JobId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<String> for JobId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Lifecycle status visible to pollers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Done,
    Error,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Done => "done",
            Self::Error => "error",
        }
    }

    /// `done` and `error` are terminal: no further transitions occur.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state with the data each state carries.
///
/// `finished_at` only exists in the terminal variants, and `exit_code` only
/// where a process actually exited.
#[derive(Debug, Clone)]
enum Lifecycle {
    Queued,
    Running {
        started_at: Timestamp,
    },
    Done {
        started_at: Timestamp,
        finished_at: Timestamp,
        exit_code: i32,
    },
    Error {
        started_at: Timestamp,
        finished_at: Timestamp,
        exit_code: Option<i32>,
        message: String,
    },
}

impl Lifecycle {
    fn status(&self) -> JobStatus {
        match self {
            Self::Queued => JobStatus::Queued,
            Self::Running { .. } => JobStatus::Running,
            Self::Done { .. } => JobStatus::Done,
            Self::Error { .. } => JobStatus::Error,
        }
    }

    fn started_at(&self) -> Option<Timestamp> {
        match self {
            Self::Queued => None,
            Self::Running { started_at }
            | Self::Done { started_at, .. }
            | Self::Error { started_at, .. } => Some(*started_at),
        }
    }

    fn finished_at(&self) -> Option<Timestamp> {
        match self {
            Self::Done { finished_at, .. } | Self::Error { finished_at, .. } => Some(*finished_at),
            _ => None,
        }
    }

    fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Done { exit_code, .. } => Some(*exit_code),
            Self::Error { exit_code, .. } => *exit_code,
            _ => None,
        }
    }

    fn error_message(&self) -> Option<&str> {
        match self {
            Self::Error { message, .. } => Some(message),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// How supervision of a worker process ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// The process exited. `None` means it was terminated without an exit
    /// code (e.g. by a signal).
    Completed { exit_code: Option<i32> },
    /// The process could not be launched.
    SpawnFailed(String),
    /// The process was launched but waiting on it failed.
    WaitFailed(String),
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Point-in-time copy of every non-log field of a job.
///
/// Timestamps serialise as Unix epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSnapshot {
    pub id: JobId,
    pub status: JobStatus,
    pub folder: String,
    pub source_url: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: Timestamp,
    #[serde(with = "chrono::serde::ts_milliseconds_option")]
    pub started_at: Option<Timestamp>,
    #[serde(with = "chrono::serde::ts_milliseconds_option")]
    pub finished_at: Option<Timestamp>,
    pub exit_code: Option<i32>,
    pub error_message: Option<String>,
}

// ---------------------------------------------------------------------------
// JobRecord
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct JobState {
    lifecycle: Lifecycle,
    log: LogBuffer,
}

/// One download job: immutable identity plus lifecycle state and its log.
#[derive(Debug)]
pub struct JobRecord {
    id: JobId,
    source_url: String,
    folder: String,
    created_at: Timestamp,
    state: Mutex<JobState>,
}

impl JobRecord {
    /// Create a record in the `queued` state with an empty log.
    pub fn new(id: JobId, source_url: String, folder: String, log_capacity: usize) -> Self {
        Self {
            id,
            source_url,
            folder,
            created_at: Utc::now(),
            state: Mutex::new(JobState {
                lifecycle: Lifecycle::Queued,
                log: LogBuffer::new(log_capacity),
            }),
        }
    }

    pub fn id(&self) -> &JobId {
        &self.id
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn folder(&self) -> &str {
        &self.folder
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn status(&self) -> JobStatus {
        self.state().lifecycle.status()
    }

    pub fn finished_at(&self) -> Option<Timestamp> {
        self.state().lifecycle.finished_at()
    }

    /// Append worker output or a marker line to the job log.
    pub fn append_log(&self, source: LogSource, text: &str) {
        self.state().log.append(source, text);
    }

    /// `queued → running`. Appends `marker` to the log in the same critical
    /// section.
    pub fn mark_running(&self, marker: &str) -> Result<(), CoreError> {
        let mut guard = self.state();
        let state = &mut *guard;
        match state.lifecycle {
            Lifecycle::Queued => {
                state.lifecycle = Lifecycle::Running {
                    started_at: Utc::now(),
                };
                state.log.append(LogSource::Out, marker);
                Ok(())
            }
            ref other => Err(self.illegal_transition(other.status(), JobStatus::Running)),
        }
    }

    /// `running → done` with exit code 0. Appends `marker` as an `out` line.
    pub fn complete(&self, marker: &str) -> Result<(), CoreError> {
        let mut guard = self.state();
        let state = &mut *guard;
        match state.lifecycle {
            Lifecycle::Running { started_at } => {
                state.lifecycle = Lifecycle::Done {
                    started_at,
                    finished_at: Utc::now(),
                    exit_code: 0,
                };
                state.log.append(LogSource::Out, marker);
                Ok(())
            }
            ref other => Err(self.illegal_transition(other.status(), JobStatus::Done)),
        }
    }

    /// `running → error`. `message` becomes the error message and is also
    /// appended as an `err` line.
    pub fn fail(&self, message: &str, exit_code: Option<i32>) -> Result<(), CoreError> {
        let mut guard = self.state();
        let state = &mut *guard;
        match state.lifecycle {
            Lifecycle::Running { started_at } => {
                state.lifecycle = Lifecycle::Error {
                    started_at,
                    finished_at: Utc::now(),
                    exit_code,
                    message: message.to_string(),
                };
                state.log.append(LogSource::Err, message);
                Ok(())
            }
            ref other => Err(self.illegal_transition(other.status(), JobStatus::Error)),
        }
    }

    /// Snapshot of the non-log fields.
    pub fn snapshot(&self) -> JobSnapshot {
        let state = self.state();
        self.snapshot_locked(&state)
    }

    /// Snapshot plus the log read from `cursor`, taken under one lock so the
    /// status and the lines agree.
    pub fn read(&self, cursor: u64) -> (JobSnapshot, LogSlice) {
        let state = self.state();
        (self.snapshot_locked(&state), state.log.read_from(cursor))
    }

    fn snapshot_locked(&self, state: &JobState) -> JobSnapshot {
        let lifecycle = &state.lifecycle;
        JobSnapshot {
            id: self.id.clone(),
            status: lifecycle.status(),
            folder: self.folder.clone(),
            source_url: self.source_url.clone(),
            created_at: self.created_at,
            started_at: lifecycle.started_at(),
            finished_at: lifecycle.finished_at(),
            exit_code: lifecycle.exit_code(),
            error_message: lifecycle.error_message().map(str::to_string),
        }
    }

    fn illegal_transition(&self, from: JobStatus, to: JobStatus) -> CoreError {
        CoreError::Conflict(format!(
            "Job {} cannot transition from {from} to {to}",
            self.id
        ))
    }

    fn state(&self) -> MutexGuard<'_, JobState> {
        self.state.lock().unwrap_or_else(|poisoned| {
            tracing::error!(job_id = %self.id, "Job state mutex poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
