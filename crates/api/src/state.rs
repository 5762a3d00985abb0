use std::sync::Arc;

use tunegrab_core::jobs::JobService;

use crate::config::ServerConfig;
use crate::middleware::rate_limit::RateLimiter;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration (API key, CORS, limits).
    pub config: Arc<ServerConfig>,
    /// Job submission, polling, and the music library.
    pub jobs: Arc<JobService>,
    /// Per-client request budget.
    pub rate_limiter: Arc<RateLimiter>,
}
