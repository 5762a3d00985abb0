//! tunegrab API server library.
//!
//! Exposes the building blocks (config, state, error handling, routes,
//! background tasks) so integration tests and the binary entrypoint can
//! both access them.

pub mod background;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;

use std::sync::Arc;

use tunegrab_core::jobs::{JobRegistry, JobService, YtDlpCommand};
use tunegrab_core::library::MusicLibrary;

use crate::config::ServerConfig;
use crate::middleware::rate_limit::RateLimiter;
use crate::state::AppState;

/// Wire the production [`AppState`]: yt-dlp via `docker exec` into the
/// configured container, writing under `MUSIC_ROOT`.
pub fn build_state(config: ServerConfig) -> AppState {
    let commands = Arc::new(YtDlpCommand::new(
        config.docker_bin.clone(),
        config.ytdlp_container.clone(),
    ));
    let jobs = JobService::new(
        Arc::new(JobRegistry::new()),
        MusicLibrary::new(config.music_root.clone()),
        commands,
    )
    .with_log_capacity(config.job_log_max_lines);

    AppState {
        rate_limiter: Arc::new(RateLimiter::per_minute(config.rate_limit_per_minute)),
        jobs: Arc::new(jobs),
        config: Arc::new(config),
    }
}
