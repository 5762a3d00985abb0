//! Handlers for the music library.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use crate::error::AppResult;
use crate::middleware::auth::ApiKeyAuth;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// GET /music/folders
// ---------------------------------------------------------------------------

/// List the library's top-level folders, sorted case-insensitively.
pub async fn list_folders(
    _auth: ApiKeyAuth,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let folders = state.jobs.list_folders().await?;
    tracing::debug!(count = folders.len(), "Listed music folders");
    Ok(Json(folders))
}
