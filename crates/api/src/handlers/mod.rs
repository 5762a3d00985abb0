//! Request handlers.
//!
//! Handlers authenticate via [`ApiKeyAuth`], delegate to the
//! [`JobService`] in [`AppState`], and map errors via [`AppError`].
//!
//! [`ApiKeyAuth`]: crate::middleware::auth::ApiKeyAuth
//! [`JobService`]: tunegrab_core::jobs::JobService
//! [`AppState`]: crate::state::AppState
//! [`AppError`]: crate::error::AppError

pub mod downloads;
pub mod library;
