//! Periodic eviction of finished download jobs.
//!
//! Jobs in a terminal state stay pollable for the retention window, then
//! disappear from the registry. Queued and running jobs are never evicted.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tunegrab_core::jobs::JobRegistry;

use crate::config::ServerConfig;

/// Retention sweep timing.
#[derive(Debug, Clone, Copy)]
pub struct RetentionSettings {
    /// How long a finished job stays in the registry.
    pub retention: Duration,
    /// How often the sweep runs.
    pub interval: Duration,
}

impl RetentionSettings {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            retention: Duration::from_secs(config.job_retention_secs),
            interval: Duration::from_secs(config.job_sweep_interval_secs.max(1)),
        }
    }
}

/// Evict every job that finished more than `retention` ago. Returns the
/// number of evicted jobs.
pub async fn sweep_once(registry: &JobRegistry, retention: Duration) -> usize {
    let retention = chrono::Duration::from_std(retention).unwrap_or(chrono::Duration::MAX);
    let cutoff = Utc::now()
        .checked_sub_signed(retention)
        .unwrap_or(chrono::DateTime::<Utc>::MIN_UTC);
    registry.sweep_finished(cutoff).await
}

/// Run the job retention loop until `cancel` is triggered.
pub async fn run(registry: Arc<JobRegistry>, settings: RetentionSettings, cancel: CancellationToken) {
    tracing::info!(
        retention_secs = settings.retention.as_secs(),
        interval_secs = settings.interval.as_secs(),
        "Job retention sweep started"
    );

    let mut interval = tokio::time::interval(settings.interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Job retention sweep stopping");
                break;
            }
            _ = interval.tick() => {
                let evicted = sweep_once(&registry, settings.retention).await;
                if evicted > 0 {
                    tracing::info!(evicted, "Job retention: evicted finished jobs");
                } else {
                    tracing::debug!("Job retention: nothing to evict");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use tunegrab_core::jobs::{JobId, JobRecord};

    use super::*;

    async fn finished_job(registry: &JobRegistry) -> Arc<JobRecord> {
        let job = registry
            .create(JobRecord::new(
                JobId::generate(),
                "https://youtu.be/abc123".into(),
                "Jazz".into(),
                10,
            ))
            .await
            .expect("create");
        job.mark_running("go").expect("running");
        job.complete("done").expect("done");
        job
    }

    #[tokio::test]
    async fn sweep_respects_retention_window() {
        let registry = JobRegistry::new();
        let job = finished_job(&registry).await;

        assert_eq!(sweep_once(&registry, Duration::from_secs(3600)).await, 0);
        assert!(registry.get(job.id().as_str()).await.is_ok());

        assert_eq!(sweep_once(&registry, Duration::ZERO).await, 1);
        assert!(registry.get(job.id().as_str()).await.is_err());
    }

    #[tokio::test]
    async fn huge_retention_does_not_overflow() {
        let registry = JobRegistry::new();
        finished_job(&registry).await;
        assert_eq!(sweep_once(&registry, Duration::from_secs(u64::MAX)).await, 0);
    }

    #[tokio::test]
    async fn loop_sweeps_and_stops_on_cancel() {
        let registry = Arc::new(JobRegistry::new());
        finished_job(&registry).await;

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(
            Arc::clone(&registry),
            RetentionSettings {
                retention: Duration::ZERO,
                interval: Duration::from_millis(10),
            },
            cancel.clone(),
        ));

        for _ in 0..100 {
            if registry.is_empty().await {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(registry.is_empty().await);

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("loop stops")
            .expect("no panic");
    }
}
