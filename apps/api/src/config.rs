use std::time::Duration;

use anyhow::{Context, Result};

use crate::layout::pagination::PaginationMode;
use crate::retention::Retention;
use crate::upload::PollConfig;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub redis_url: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub renderer_url: String,
    pub port: u16,
    pub rust_log: String,
    pub pagination_policy: PaginationMode,
    /// Page size for the chunked and essential policies; each has its own default.
    pub sections_per_page: Option<usize>,
    pub poll_max_attempts: u32,
    pub poll_interval_secs: u64,
    pub poll_initial_delay_secs: u64,
    pub session_ttl_secs: i64,
    pub job_ttl_secs: i64,
    pub sweep_interval_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            redis_url: require_env("REDIS_URL")?,
            s3_bucket: require_env("S3_BUCKET")?,
            s3_endpoint: require_env("S3_ENDPOINT")?,
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            renderer_url: require_env("RENDERER_URL")?,
            port: optional_env("PORT", 8080).context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            pagination_policy: std::env::var("PAGINATION_POLICY")
                .ok()
                .map(|v| v.parse::<PaginationMode>())
                .transpose()
                .map_err(anyhow::Error::msg)?
                .unwrap_or_default(),
            sections_per_page: maybe_env("SECTIONS_PER_PAGE")
                .context("SECTIONS_PER_PAGE must be a positive integer")?,
            poll_max_attempts: optional_env("POLL_MAX_ATTEMPTS", 20)
                .context("POLL_MAX_ATTEMPTS must be a positive integer")?,
            poll_interval_secs: optional_env("POLL_INTERVAL_SECS", 10)
                .context("POLL_INTERVAL_SECS must be a number of seconds")?,
            poll_initial_delay_secs: optional_env("POLL_INITIAL_DELAY_SECS", 15)
                .context("POLL_INITIAL_DELAY_SECS must be a number of seconds")?,
            session_ttl_secs: optional_env("SESSION_TTL_SECS", 86_400)
                .context("SESSION_TTL_SECS must be a number of seconds")?,
            job_ttl_secs: optional_env("JOB_TTL_SECS", 3_600)
                .context("JOB_TTL_SECS must be a number of seconds")?,
            sweep_interval_secs: optional_env("SWEEP_INTERVAL_SECS", 300)
                .context("SWEEP_INTERVAL_SECS must be a number of seconds")?,
        })
    }

    pub fn poll_config(&self) -> PollConfig {
        PollConfig {
            max_attempts: self.poll_max_attempts,
            interval: Duration::from_secs(self.poll_interval_secs),
            initial_delay: Duration::from_secs(self.poll_initial_delay_secs),
        }
    }

    pub fn retention(&self) -> Retention {
        Retention {
            session_ttl: chrono::Duration::seconds(self.session_ttl_secs),
            job_ttl: chrono::Duration::seconds(self.job_ttl_secs),
            sweep_interval: Duration::from_secs(self.sweep_interval_secs),
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => Ok(raw.trim().parse::<T>()?),
        Err(_) => Ok(default),
    }
}

fn maybe_env<T>(key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => Ok(Some(raw.trim().parse::<T>()?)),
        Err(_) => Ok(None),
    }
}
