//! Upload / poll workflow.
//!
//! An uploaded résumé is processed out of band by the extraction pipeline, which
//! writes structured JSON back to the object store. `poll_for_document` waits for that
//! JSON with a bounded, cancellable retry loop.
//!
//! `AppState` carries the collaborators as `Arc<dyn UploadService>` /
//! `Arc<dyn ResultFetcher>`; `s3` holds the production implementations.

pub mod handlers;
pub mod jobs;
pub mod s3;

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::errors::UpstreamError;

pub use jobs::{JobStatus, JobStore, UploadJob};

// ────────────────────────────────────────────────────────────────────────────
// Collaborator traits
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
    pub job_description: Option<String>,
}

/// Stores an uploaded file and returns its storage locator.
#[async_trait]
pub trait UploadService: Send + Sync {
    async fn upload(&self, request: UploadRequest) -> Result<String, UpstreamError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Ready(Value),
    NotReady,
}

/// One processed résumé in the result store.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredResult {
    pub key: String,
    pub size: i64,
    pub last_modified: Option<DateTime<Utc>>,
}

/// Fetches the processed résumé JSON for a locator, or the latest result when none is given.
#[async_trait]
pub trait ResultFetcher: Send + Sync {
    async fn fetch(&self, locator: Option<&str>) -> Result<FetchOutcome, UpstreamError>;

    /// Every stored result, newest first.
    async fn list(&self) -> Result<Vec<StoredResult>, UpstreamError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Poll loop
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub max_attempts: u32,
    pub interval: Duration,
    pub initial_delay: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_attempts: 20,
            interval: Duration::from_secs(10),
            initial_delay: Duration::from_secs(15),
        }
    }
}

/// Waits `initial_delay`, then fetches up to `max_attempts` times, `interval` apart.
///
/// Not-ready responses and per-attempt failures are logged and retried. The loop ends
/// with `Exhausted` once the budget is spent, or `Cancelled` as soon as `cancel` fires.
pub async fn poll_for_document(
    fetcher: &dyn ResultFetcher,
    locator: Option<&str>,
    config: PollConfig,
    cancel: &CancellationToken,
) -> Result<Value, UpstreamError> {
    sleep_or_cancel(config.initial_delay, cancel).await?;

    let mut last = String::from("result not ready");
    for attempt in 1..=config.max_attempts {
        if attempt > 1 {
            sleep_or_cancel(config.interval, cancel).await?;
        }

        let outcome = tokio::select! {
            _ = cancel.cancelled() => return Err(UpstreamError::Cancelled),
            outcome = fetcher.fetch(locator) => outcome,
        };

        match outcome {
            Ok(FetchOutcome::Ready(document)) => {
                info!("Processed résumé ready after {attempt} attempt(s)");
                return Ok(document);
            }
            Ok(FetchOutcome::NotReady) => {
                debug!("Poll attempt {attempt}/{} not ready", config.max_attempts);
                last = String::from("result not ready");
            }
            Err(e) => {
                warn!("Poll attempt {attempt}/{} failed: {e}", config.max_attempts);
                last = e.to_string();
            }
        }
    }

    Err(UpstreamError::Exhausted {
        attempts: config.max_attempts,
        last,
    })
}

async fn sleep_or_cancel(delay: Duration, cancel: &CancellationToken) -> Result<(), UpstreamError> {
    tokio::select! {
        _ = cancel.cancelled() => Err(UpstreamError::Cancelled),
        _ = tokio::time::sleep(delay) => Ok(()),
    }
}
