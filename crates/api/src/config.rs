use std::path::PathBuf;
use std::str::FromStr;

/// Errors raised while loading [`ServerConfig`] at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} has invalid value '{value}'")]
    Invalid { var: &'static str, value: String },
}

/// Server configuration loaded from environment variables.
///
/// Everything except `API_KEY` has a default suitable for the docker-compose
/// deployment next to the yt-dlp container.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8787`).
    pub port: u16,
    /// Shared secret expected as `Authorization: Bearer <key>`.
    pub api_key: String,
    /// Music library root on the host (default: `/music`).
    pub music_root: PathBuf,
    /// Docker container that runs yt-dlp (default: `yt-dlp-music`).
    pub ytdlp_container: String,
    /// Docker CLI executable (default: `docker`).
    pub docker_bin: String,
    /// Allowed CORS origins. Empty allows any origin; a trailing `*` is a
    /// prefix match.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Requests per client per minute (default: `40`).
    pub rate_limit_per_minute: u32,
    /// Retained log lines per job (default: `2000`).
    pub job_log_max_lines: usize,
    /// How long finished jobs stay pollable, in seconds (default: `7200`).
    pub job_retention_secs: u64,
    /// Interval between retention sweeps, in seconds (default: `60`).
    pub job_sweep_interval_secs: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default        |
    /// |---------------------------|----------------|
    /// | `HOST`                    | `0.0.0.0`      |
    /// | `PORT`                    | `8787`         |
    /// | `API_KEY`                 | required       |
    /// | `MUSIC_ROOT`              | `/music`       |
    /// | `YTDLP_CONTAINER`         | `yt-dlp-music` |
    /// | `DOCKER_BIN`              | `docker`       |
    /// | `CORS_ORIGINS`            | (any origin)   |
    /// | `REQUEST_TIMEOUT_SECS`    | `30`           |
    /// | `RATE_LIMIT_PER_MINUTE`   | `40`           |
    /// | `JOB_LOG_MAX_LINES`       | `2000`         |
    /// | `JOB_RETENTION_SECS`      | `7200`         |
    /// | `JOB_SWEEP_INTERVAL_SECS` | `60`           |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_key = get("API_KEY").ok_or(ConfigError::Missing("API_KEY"))?;

        let cors_origins = get("CORS_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_var(&get, "PORT", 8787)?,
            api_key,
            music_root: get("MUSIC_ROOT").unwrap_or_else(|| "/music".into()).into(),
            ytdlp_container: get("YTDLP_CONTAINER").unwrap_or_else(|| "yt-dlp-music".into()),
            docker_bin: get("DOCKER_BIN").unwrap_or_else(|| "docker".into()),
            cors_origins,
            request_timeout_secs: parse_var(&get, "REQUEST_TIMEOUT_SECS", 30)?,
            rate_limit_per_minute: parse_var(&get, "RATE_LIMIT_PER_MINUTE", 40)?,
            job_log_max_lines: parse_var(&get, "JOB_LOG_MAX_LINES", 2000)?,
            job_retention_secs: parse_var(&get, "JOB_RETENTION_SECS", 7200)?,
            job_sweep_interval_secs: parse_var(&get, "JOB_SWEEP_INTERVAL_SECS", 60)?,
        })
    }
}

fn parse_var<T, G>(get: &G, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(var) {
        None => Ok(default),
        Some(value) => value.parse().map_err(|_| ConfigError::Invalid { var, value }),
    }
}
