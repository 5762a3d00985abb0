//! In-memory job table.
//!
//! Jobs live only for the lifetime of the process. Terminal jobs are evicted
//! by [`JobRegistry::sweep_finished`] once their retention window has passed.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;

use crate::error::CoreError;
use crate::jobs::record::{JobId, JobRecord, JobStatus};
use crate::types::Timestamp;

/// Number of registered jobs in each status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct JobCounts {
    pub queued: usize,
    pub running: usize,
    pub done: usize,
    pub error: usize,
}

/// In-memory store of all known jobs.
///
/// Thread-safe via interior `RwLock`; designed to be wrapped in `Arc` and
/// shared between request handlers, supervisors, and the retention sweep.
/// The map lock is never held across process I/O.
#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: RwLock<HashMap<JobId, Arc<JobRecord>>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new job. Fails with `Conflict` if the id is already taken.
    pub async fn create(&self, record: JobRecord) -> Result<Arc<JobRecord>, CoreError> {
        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(record.id()) {
            return Err(CoreError::Conflict(format!(
                "Job {} already exists",
                record.id()
            )));
        }
        let record = Arc::new(record);
        jobs.insert(record.id().clone(), Arc::clone(&record));
        Ok(record)
    }

    pub async fn get(&self, id: &str) -> Result<Arc<JobRecord>, CoreError> {
        self.jobs
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| CoreError::NotFound {
                entity: "Job",
                id: id.to_string(),
            })
    }

    /// Visit every registered job while holding the read lock.
    pub async fn for_each<F>(&self, mut visitor: F)
    where
        F: FnMut(&JobRecord),
    {
        let jobs = self.jobs.read().await;
        for job in jobs.values() {
            visitor(job);
        }
    }

    /// Remove a job. No-op if it is not registered.
    pub async fn delete(&self, id: &str) {
        self.jobs.write().await.remove(id);
    }

    /// Remove every terminal job that finished before `cutoff`.
    ///
    /// Jobs that are still queued or running are kept regardless of age.
    /// Returns the number of jobs removed.
    pub async fn sweep_finished(&self, cutoff: Timestamp) -> usize {
        let mut jobs = self.jobs.write().await;
        let before = jobs.len();
        jobs.retain(|_, job| match job.finished_at() {
            Some(finished_at) => finished_at >= cutoff,
            None => true,
        });
        before - jobs.len()
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }

    pub async fn counts(&self) -> JobCounts {
        let mut counts = JobCounts::default();
        self.for_each(|job| match job.status() {
            JobStatus::Queued => counts.queued += 1,
            JobStatus::Running => counts.running += 1,
            JobStatus::Done => counts.done += 1,
            JobStatus::Error => counts.error += 1,
        })
        .await;
        counts
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
