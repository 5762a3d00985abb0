//! Handlers for download jobs.
//!
//! Submitting a download returns immediately with a job id; clients then
//! poll with an increasing `since` cursor to follow the job log.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use tunegrab_core::jobs::JobId;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::ApiKeyAuth;
use crate::response::OkResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Body of `POST /youtube/download`.
///
/// Missing fields are treated as empty and rejected by validation.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDownloadRequest {
    #[serde(default, alias = "youtubeUrl")]
    pub source_url: String,
    #[serde(default)]
    pub folder: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadCreated {
    pub job_id: JobId,
}

#[derive(Debug, Default, Deserialize)]
pub struct PollQuery {
    pub since: Option<String>,
}

/// Parse a `since` cursor leniently.
///
/// Anything that is not a finite number becomes 0, negatives clamp to 0 and
/// fractions are truncated.
pub fn parse_since(raw: Option<&str>) -> u64 {
    let Some(raw) = raw else {
        return 0;
    };
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value > 0.0 => value.trunc() as u64,
        _ => 0,
    }
}

// ---------------------------------------------------------------------------
// POST /youtube/download
// ---------------------------------------------------------------------------

/// Validate the request, register a job, and start it in the background.
pub async fn create_download(
    _auth: ApiKeyAuth,
    State(state): State<AppState>,
    body: Result<Json<CreateDownloadRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(input) = body.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

    let job_id = state.jobs.submit(&input.source_url, &input.folder).await?;
    tracing::info!(job_id = %job_id, "Download job accepted");

    Ok(Json(OkResponse::new(DownloadCreated { job_id })))
}

// ---------------------------------------------------------------------------
// GET /downloads/{job_id}
// ---------------------------------------------------------------------------

/// Return the job state plus every retained log line from `since` on.
pub async fn poll_download(
    _auth: ApiKeyAuth,
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    Query(params): Query<PollQuery>,
) -> AppResult<impl IntoResponse> {
    let since = parse_since(params.since.as_deref());
    let poll = state.jobs.poll(&job_id, since).await?;
    Ok(Json(OkResponse::new(poll)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn since_parsing_is_lenient() {
        assert_eq!(parse_since(None), 0);
        assert_eq!(parse_since(Some("")), 0);
        assert_eq!(parse_since(Some("abc")), 0);
        assert_eq!(parse_since(Some("-5")), 0);
        assert_eq!(parse_since(Some("NaN")), 0);
        assert_eq!(parse_since(Some("inf")), 0);
        assert_eq!(parse_since(Some("7")), 7);
        assert_eq!(parse_since(Some(" 3.9 ")), 3);
    }

    #[test]
    fn create_request_accepts_both_url_field_names() {
        let a: CreateDownloadRequest =
            serde_json::from_str(r#"{"sourceUrl":"https://youtu.be/x","folder":"Jazz"}"#)
                .expect("sourceUrl");
        let b: CreateDownloadRequest =
            serde_json::from_str(r#"{"youtubeUrl":"https://youtu.be/x","folder":"Jazz"}"#)
                .expect("youtubeUrl");
        assert_eq!(a.source_url, b.source_url);

        let empty: CreateDownloadRequest = serde_json::from_str("{}").expect("empty");
        assert!(empty.source_url.is_empty());
        assert!(empty.folder.is_empty());
    }
}
