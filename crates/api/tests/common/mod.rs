#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use tunegrab_api::config::ServerConfig;
use tunegrab_api::middleware::rate_limit::RateLimiter;
use tunegrab_api::router::build_app_router;
use tunegrab_api::state::AppState;
use tunegrab_core::jobs::{JobRegistry, JobService, WorkerCommand, WorkerCommandBuilder};
use tunegrab_core::library::MusicLibrary;

/// API key accepted by test apps.
pub const TEST_API_KEY: &str = "test-api-key";

/// Build a test `ServerConfig` rooted at `music_root`.
///
/// Allows every CORS origin and sets a rate limit high enough that only the
/// rate limit tests hit it.
pub fn test_config(music_root: &Path) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        api_key: TEST_API_KEY.to_string(),
        music_root: music_root.to_path_buf(),
        ytdlp_container: "yt-dlp-music".to_string(),
        docker_bin: "docker".to_string(),
        cors_origins: vec![],
        request_timeout_secs: 30,
        rate_limit_per_minute: 1000,
        job_log_max_lines: 2000,
        job_retention_secs: 7200,
        job_sweep_interval_secs: 60,
    }
}

/// Worker that runs a fixed shell script instead of yt-dlp.
pub struct ShellWorker(pub &'static str);

impl WorkerCommandBuilder for ShellWorker {
    fn build(&self, _source_url: &str, _folder: &str) -> WorkerCommand {
        WorkerCommand::new("yt-dlp", "sh").arg("-c").arg(self.0)
    }
}

/// Build the full application router for `config`, running `worker` for
/// every submitted job.
///
/// Uses the same [`build_app_router`] as `main.rs` so integration tests
/// exercise the production middleware stack.
pub fn build_app_with(config: ServerConfig, worker: Arc<dyn WorkerCommandBuilder>) -> (Router, AppState) {
    let jobs = JobService::new(
        Arc::new(JobRegistry::new()),
        MusicLibrary::new(config.music_root.clone()),
        worker,
    )
    .with_log_capacity(config.job_log_max_lines);

    let state = AppState {
        rate_limiter: Arc::new(RateLimiter::per_minute(config.rate_limit_per_minute)),
        jobs: Arc::new(jobs),
        config: Arc::new(config.clone()),
    };

    (build_app_router(state.clone(), &config), state)
}

/// Build a test app rooted at `music_root` whose worker succeeds immediately.
pub fn build_test_app(music_root: &Path) -> Router {
    build_app_with(test_config(music_root), Arc::new(ShellWorker("echo ok"))).0
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn get_auth(app: Router, uri: &str, api_key: &str) -> Response<Body> {
    let request = Request::builder()
        .uri(uri)
        .header("authorization", format!("Bearer {api_key}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    api_key: &str,
) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {api_key}"))
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Poll `job_id` until it reaches `done` or `error`, returning the final
/// poll body.
pub async fn wait_for_terminal(app: &Router, job_id: &str) -> serde_json::Value {
    let uri = format!("/api/downloads/{job_id}");
    for _ in 0..200 {
        let json = body_json(get_auth(app.clone(), &uri, TEST_API_KEY).await).await;
        let status = json["job"]["status"].as_str().unwrap_or_default().to_string();
        if status == "done" || status == "error" {
            return json;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    panic!("job {job_id} did not finish");
}
