//! Domain logic for the tunegrab download service.
//!
//! Nothing in this crate knows about HTTP; the `tunegrab-api` crate wraps it.

pub mod error;
pub mod jobs;
pub mod library;
pub mod types;
pub mod validation;
