use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;
use tunegrab_core::jobs::JobCounts;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Always `true` while the server is answering.
    pub ok: bool,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Registered jobs per status.
    pub jobs: JobCounts,
}

/// GET /health -- returns service health and job counts.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let jobs = state.jobs.registry().counts().await;

    Json(HealthResponse {
        ok: true,
        version: env!("CARGO_PKG_VERSION"),
        jobs,
    })
}

/// Mount the health check route (no authentication).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
