//! Route definitions for download jobs.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::downloads;
use crate::state::AppState;

/// Download job routes.
///
/// ```text
/// POST   /youtube/download        -> create_download
/// GET    /downloads/{job_id}      -> poll_download
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/youtube/download", post(downloads::create_download))
        .route("/downloads/{job_id}", get(downloads::poll_download))
}
