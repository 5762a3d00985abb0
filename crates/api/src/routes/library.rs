//! Route definitions for the music library.

use axum::routing::get;
use axum::Router;

use crate::handlers::library;
use crate::state::AppState;

/// Music library routes.
///
/// ```text
/// GET    /folders                 -> list_folders
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/folders", get(library::list_folders))
}
