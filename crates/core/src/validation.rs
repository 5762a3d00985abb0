//! Input validation for download requests.
//!
//! Source URLs must point at a single YouTube video; folder names are
//! sanitised into a single safe path component before they ever touch the
//! filesystem.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::error::CoreError;

/// Hosts accepted as YouTube sources (after stripping a leading `www.`).
pub const VALID_SOURCE_HOSTS: &[&str] = &[
    "youtube.com",
    "m.youtube.com",
    "music.youtube.com",
    "youtu.be",
];

/// Maximum length of a sanitised folder name, in characters.
pub const MAX_FOLDER_NAME_CHARS: usize = 80;

static CONTROL_CHARS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\x00-\x1F\x7F]").expect("valid regex"));

static RESERVED_CHARS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[<>:"|?*]"#).expect("valid regex"));

static WHITESPACE_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

// ---------------------------------------------------------------------------
// Source URL
// ---------------------------------------------------------------------------

/// Returns `true` if `raw` is an http(s) URL for a single YouTube video.
///
/// Accepted shapes:
/// - `https://youtu.be/<id>`
/// - `https://(www.|m.|music.)youtube.com/watch?v=<id>`
/// - `https://(www.|m.|music.)youtube.com/shorts/<id>`
pub fn is_valid_youtube_url(raw: &str) -> bool {
    let Ok(url) = Url::parse(raw.trim()) else {
        return false;
    };
    if url.scheme() != "http" && url.scheme() != "https" {
        return false;
    }
    let Some(host) = url.host_str() else {
        return false;
    };
    let host = host.strip_prefix("www.").unwrap_or(host);
    if !VALID_SOURCE_HOSTS.contains(&host) {
        return false;
    }

    let path = url.path();
    if host == "youtu.be" {
        return path.len() > 1;
    }
    if path == "/watch" {
        return url
            .query_pairs()
            .any(|(key, value)| key == "v" && !value.is_empty());
    }
    if path.starts_with("/shorts/") {
        return path.split('/').filter(|s| !s.is_empty()).count() >= 2;
    }
    false
}

/// Validate a source URL, returning the trimmed URL on success.
pub fn validate_source_url(raw: &str) -> Result<String, CoreError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || !is_valid_youtube_url(trimmed) {
        return Err(CoreError::Validation("Invalid youtubeUrl".to_string()));
    }
    Ok(trimmed.to_string())
}

// ---------------------------------------------------------------------------
// Folder name
// ---------------------------------------------------------------------------

/// Sanitise a user-supplied folder name into a single path component.
///
/// Returns `None` when nothing usable remains or the result is `.`. Names
/// containing `..` or a path separator are rejected outright rather than
/// rewritten.
pub fn sanitize_folder_name(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() || raw.contains("..") || raw.contains('/') || raw.contains('\\') {
        return None;
    }

    let cleaned = CONTROL_CHARS_RE.replace_all(raw, "");
    let cleaned = RESERVED_CHARS_RE.replace_all(&cleaned, "");
    let cleaned = WHITESPACE_RUN_RE.replace_all(&cleaned, " ");
    let truncated: String = cleaned.trim().chars().take(MAX_FOLDER_NAME_CHARS).collect();
    let name = truncated.trim_end();

    if name.is_empty() || name == "." {
        None
    } else {
        Some(name.to_string())
    }
}

/// Validate and sanitise a folder name.
pub fn validate_folder_name(raw: &str) -> Result<String, CoreError> {
    sanitize_folder_name(raw).ok_or_else(|| CoreError::Validation("Invalid folder".to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
