//! In-memory collaborators for router and handler tests.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::{json, Value};

use crate::config::Config;
use crate::errors::UpstreamError;
use crate::export::{ExportService, RenderJob};
use crate::identity::{OnboardingError, OnboardingStore};
use crate::layout::pagination::PaginationMode;
use crate::session::SessionStore;
use crate::state::AppState;
use crate::upload::{
    FetchOutcome, JobStore, PollConfig, ResultFetcher, StoredResult, UploadRequest, UploadService,
};

pub struct TestHarness {
    /// Bytes the fake renderer returns for every PDF.
    pub pdf: Vec<u8>,
    /// Document the fake fetcher returns once asked.
    pub processed: Value,
}

impl Default for TestHarness {
    fn default() -> Self {
        Self {
            pdf: b"%PDF-1.7 test".to_vec(),
            processed: json!({ "name": "Jane", "skills": ["Rust"] }),
        }
    }
}

struct KeyEchoUploads;

#[async_trait]
impl UploadService for KeyEchoUploads {
    async fn upload(&self, request: UploadRequest) -> Result<String, UpstreamError> {
        Ok(format!("uploads/{}", request.file_name))
    }
}

struct ReadyResults(Value);

#[async_trait]
impl ResultFetcher for ReadyResults {
    async fn fetch(&self, locator: Option<&str>) -> Result<FetchOutcome, UpstreamError> {
        match locator {
            Some(key) if key.contains("missing") => Ok(FetchOutcome::NotReady),
            _ => Ok(FetchOutcome::Ready(self.0.clone())),
        }
    }

    async fn list(&self) -> Result<Vec<StoredResult>, UpstreamError> {
        Ok(vec![StoredResult {
            key: "rewritten-resumes/jane.json".to_string(),
            size: 42,
            last_modified: None,
        }])
    }
}

struct FixedPdf(Bytes);

#[async_trait]
impl ExportService for FixedPdf {
    async fn render_pdf(&self, _job: RenderJob<'_>) -> Result<Bytes, UpstreamError> {
        Ok(self.0.clone())
    }
}

#[derive(Default)]
struct MemoryOnboarding(Mutex<HashSet<String>>);

#[async_trait]
impl OnboardingStore for MemoryOnboarding {
    async fn is_completed(&self, sub: &str) -> Result<bool, OnboardingError> {
        Ok(self.0.lock().unwrap().contains(sub))
    }

    async fn set_completed(&self, sub: &str, completed: bool) -> Result<(), OnboardingError> {
        let mut done = self.0.lock().unwrap();
        if completed {
            done.insert(sub.to_string());
        } else {
            done.remove(sub);
        }
        Ok(())
    }
}

pub fn test_config() -> Config {
    Config {
        redis_url: "redis://127.0.0.1:6379".to_string(),
        s3_bucket: "test-bucket".to_string(),
        s3_endpoint: "http://127.0.0.1:9000".to_string(),
        aws_access_key_id: "test".to_string(),
        aws_secret_access_key: "test".to_string(),
        renderer_url: "http://127.0.0.1:3001".to_string(),
        port: 8080,
        rust_log: "debug".to_string(),
        pagination_policy: PaginationMode::Single,
        sections_per_page: None,
        poll_max_attempts: 3,
        poll_interval_secs: 0,
        poll_initial_delay_secs: 0,
        session_ttl_secs: 86_400,
        job_ttl_secs: 3_600,
        sweep_interval_secs: 300,
    }
}

pub fn test_state(harness: TestHarness) -> AppState {
    let config = test_config();
    AppState {
        sessions: SessionStore::new(),
        jobs: JobStore::new(),
        uploads: Arc::new(KeyEchoUploads),
        results: Arc::new(ReadyResults(harness.processed)),
        exporter: Arc::new(FixedPdf(Bytes::from(harness.pdf))),
        onboarding: Arc::new(MemoryOnboarding::default()),
        pagination: config
            .pagination_policy
            .build(config.sections_per_page),
        poll: PollConfig {
            max_attempts: config.poll_max_attempts,
            interval: Duration::ZERO,
            initial_delay: Duration::ZERO,
        },
    }
}
