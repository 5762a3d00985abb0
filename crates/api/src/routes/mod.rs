pub mod downloads;
pub mod health;
pub mod library;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /health                      service and job counts (public)
///
/// /music/folders               list library folders
///
/// /youtube/download            submit a download job (POST)
/// /downloads/{job_id}          poll job state and logs (?since=N)
/// ```
///
/// Everything except `/health` requires `Authorization: Bearer <API_KEY>`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .nest("/music", library::router())
        .merge(downloads::router())
}
