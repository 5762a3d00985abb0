//! Shared response envelope for API handlers.
//!
//! Successful responses carry `"ok": true` next to their payload fields,
//! e.g. `{ "ok": true, "jobId": "..." }`. Use [`OkResponse`] instead of
//! ad-hoc `serde_json::json!` so payloads stay typed.

use serde::Serialize;

/// Standard `{ "ok": true, ...T }` response envelope.
///
/// `T` must serialize as a map; its fields are flattened next to `ok`.
///
/// # Example
///
/// ```ignore
/// Ok(Json(OkResponse::new(JobCreated { job_id })))
/// ```
#[derive(Debug, Serialize)]
pub struct OkResponse<T: Serialize> {
    pub ok: bool,
    #[serde(flatten)]
    pub body: T,
}

impl<T: Serialize> OkResponse<T> {
    pub fn new(body: T) -> Self {
        Self { ok: true, body }
    }
}
