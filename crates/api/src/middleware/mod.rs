//! Request guards.
//!
//! - [`auth::ApiKeyAuth`] -- Requires the shared API key as a Bearer token.
//! - [`rate_limit::enforce`] -- Fixed-window per-client request budget.

pub mod auth;
pub mod rate_limit;
