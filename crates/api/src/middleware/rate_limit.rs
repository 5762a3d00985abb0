//! Fixed-window request budget per client address.
//!
//! Every client IP gets `max_requests` per window. Requests without
//! connection info (e.g. in-process tests) share the `unknown` bucket.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;

use crate::error::AppError;
use crate::state::AppState;

/// Length of one rate-limit window.
pub const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(60);

/// Bucket count above which expired buckets are pruned on the next check.
const PRUNE_THRESHOLD: usize = 1024;

#[derive(Debug, Clone, Copy)]
struct Bucket {
    window_started: Instant,
    accepted: u32,
}

/// Result of admitting one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { remaining: u32 },
    Limited { retry_after_secs: u64 },
}

#[derive(Debug)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    buckets: Mutex<HashMap<String, Bucket>>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests: max_requests.max(1),
            window,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// `max_requests` per [`RATE_LIMIT_WINDOW`].
    pub fn per_minute(max_requests: u32) -> Self {
        Self::new(max_requests, RATE_LIMIT_WINDOW)
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    /// Count one request from `client` at `now`.
    pub fn check(&self, client: &str, now: Instant) -> RateDecision {
        let mut buckets = self.buckets();

        if buckets.len() > PRUNE_THRESHOLD {
            let window = self.window;
            buckets.retain(|_, b| now.saturating_duration_since(b.window_started) < window);
        }

        let bucket = buckets.entry(client.to_string()).or_insert(Bucket {
            window_started: now,
            accepted: 0,
        });
        let elapsed = now.saturating_duration_since(bucket.window_started);
        if elapsed >= self.window {
            bucket.window_started = now;
            bucket.accepted = 0;
        }

        if bucket.accepted >= self.max_requests {
            let remaining = self.window.saturating_sub(elapsed);
            let retry_after_secs = remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0);
            return RateDecision::Limited {
                retry_after_secs: retry_after_secs.max(1),
            };
        }

        bucket.accepted += 1;
        RateDecision::Allowed {
            remaining: self.max_requests - bucket.accepted,
        }
    }

    fn buckets(&self) -> MutexGuard<'_, HashMap<String, Bucket>> {
        self.buckets.lock().unwrap_or_else(|poisoned| {
            tracing::error!("Rate limiter mutex poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

/// Axum middleware rejecting clients over their budget with 429.
///
/// Install with `axum::middleware::from_fn_with_state`.
pub async fn enforce(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    match state.rate_limiter.check(&client, Instant::now()) {
        RateDecision::Limited { retry_after_secs } => {
            tracing::warn!(client = %client, retry_after_secs, "Rate limit exceeded");
            Err(AppError::RateLimited { retry_after_secs })
        }
        RateDecision::Allowed { remaining } => {
            let mut response = next.run(request).await;
            let headers = response.headers_mut();
            headers.insert(
                HeaderName::from_static("ratelimit-limit"),
                HeaderValue::from(state.rate_limiter.max_requests()),
            );
            headers.insert(
                HeaderName::from_static("ratelimit-remaining"),
                HeaderValue::from(remaining),
            );
            Ok(response)
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn allows_up_to_limit_then_rejects() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));
        let now = Instant::now();

        assert_eq!(limiter.check("a", now), RateDecision::Allowed { remaining: 1 });
        assert_eq!(limiter.check("a", now), RateDecision::Allowed { remaining: 0 });
        assert_matches!(
            limiter.check("a", now + Duration::from_secs(10)),
            RateDecision::Limited { retry_after_secs: 50 }
        );
    }

    #[test]
    fn clients_have_separate_buckets() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let now = Instant::now();

        assert_matches!(limiter.check("a", now), RateDecision::Allowed { .. });
        assert_matches!(limiter.check("b", now), RateDecision::Allowed { .. });
        assert_matches!(limiter.check("a", now), RateDecision::Limited { .. });
    }

    #[test]
    fn window_resets_after_expiry() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let now = Instant::now();

        assert_matches!(limiter.check("a", now), RateDecision::Allowed { .. });
        assert_matches!(limiter.check("a", now), RateDecision::Limited { .. });
        assert_matches!(
            limiter.check("a", now + Duration::from_secs(60)),
            RateDecision::Allowed { remaining: 0 }
        );
    }

    #[test]
    fn retry_after_is_at_least_one_second() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let now = Instant::now();
        limiter.check("a", now);

        assert_matches!(
            limiter.check("a", now + Duration::from_millis(59_900)),
            RateDecision::Limited { retry_after_secs: 1 }
        );
    }
}
