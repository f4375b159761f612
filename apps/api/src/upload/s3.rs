use async_trait::async_trait;
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::Object;
use aws_sdk_s3::Client as S3Client;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::UpstreamError;
use crate::upload::{FetchOutcome, ResultFetcher, StoredResult, UploadRequest, UploadService};

pub const UPLOAD_PREFIX: &str = "uploads/";
pub const RESULT_PREFIX: &str = "rewritten-resumes/";
const JOB_DESCRIPTION_SUFFIX: &str = ".job-description.txt";

/// Object-store backed upload and result fetch.
#[derive(Clone)]
pub struct S3Storage {
    client: S3Client,
    bucket: String,
}

impl S3Storage {
    pub fn new(client: S3Client, bucket: String) -> Self {
        Self { client, bucket }
    }

    async fn get_json(&self, key: &str) -> Result<FetchOutcome, UpstreamError> {
        let output = match self.client.get_object().bucket(&self.bucket).key(key).send().await {
            Ok(output) => output,
            Err(e) => return missing_is_not_ready(key, e.into_service_error()),
        };

        let body = output
            .body
            .collect()
            .await
            .map_err(|e| UpstreamError::Storage(format!("reading {key} failed: {e}")))?
            .into_bytes();

        let document: Value = serde_json::from_slice(&body)?;
        Ok(FetchOutcome::Ready(document))
    }

    /// Every object under the result prefix, following continuation tokens.
    async fn list_results(&self) -> Result<Vec<StoredResult>, UpstreamError> {
        let mut results = Vec::new();
        let mut continuation: Option<String> = None;
        loop {
            let page = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(RESULT_PREFIX)
                .set_continuation_token(continuation.take())
                .send()
                .await
                .map_err(|e| UpstreamError::Storage(format!("listing {RESULT_PREFIX} failed: {e}")))?;

            results.extend(page.contents().iter().filter_map(stored_result));
            match page.next_continuation_token() {
                Some(token) => continuation = Some(token.to_string()),
                None => break,
            }
        }

        newest_first(&mut results);
        debug!("{} result(s) under s3://{}/{RESULT_PREFIX}", results.len(), self.bucket);
        Ok(results)
    }
}

#[async_trait]
impl UploadService for S3Storage {
    async fn upload(&self, request: UploadRequest) -> Result<String, UpstreamError> {
        let key = upload_key(Uuid::new_v4(), &request.file_name);

        let mut put = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(request.bytes));
        if let Some(content_type) = &request.content_type {
            put = put.content_type(content_type);
        }
        put.send()
            .await
            .map_err(|e| UpstreamError::Storage(format!("upload of {key} failed: {e}")))?;

        if let Some(job_description) = request.job_description.filter(|jd| !jd.trim().is_empty()) {
            let jd_key = format!("{key}{JOB_DESCRIPTION_SUFFIX}");
            self.client
                .put_object()
                .bucket(&self.bucket)
                .key(&jd_key)
                .body(ByteStream::from(job_description.into_bytes()))
                .content_type("text/plain")
                .send()
                .await
                .map_err(|e| UpstreamError::Storage(format!("upload of {jd_key} failed: {e}")))?;
        }

        info!("Uploaded résumé to s3://{}/{key}", self.bucket);
        Ok(key)
    }
}

#[async_trait]
impl ResultFetcher for S3Storage {
    async fn fetch(&self, locator: Option<&str>) -> Result<FetchOutcome, UpstreamError> {
        match locator {
            Some(locator) => self.get_json(&result_key(locator)).await,
            None => match self.list_results().await?.first() {
                Some(latest) => self.get_json(&latest.key).await,
                None => Ok(FetchOutcome::NotReady),
            },
        }
    }

    async fn list(&self) -> Result<Vec<StoredResult>, UpstreamError> {
        self.list_results().await
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Responses
// ────────────────────────────────────────────────────────────────────────────

/// A missing key means the pipeline has not written the result yet.
fn missing_is_not_ready(key: &str, error: GetObjectError) -> Result<FetchOutcome, UpstreamError> {
    if error.is_no_such_key() {
        debug!("{key} not written yet");
        return Ok(FetchOutcome::NotReady);
    }
    Err(UpstreamError::Storage(format!("get {key} failed: {error}")))
}

/// Listing entry for a result object. Folder placeholders are skipped.
fn stored_result(object: &Object) -> Option<StoredResult> {
    let key = object.key().filter(|k| !k.ends_with('/'))?;
    Some(StoredResult {
        key: key.to_string(),
        size: object.size().unwrap_or_default(),
        last_modified: object
            .last_modified()
            .and_then(|t| DateTime::<Utc>::from_timestamp(t.secs(), t.subsec_nanos())),
    })
}

/// Sorts by modification time, newest first. Entries without a timestamp go last.
fn newest_first(results: &mut [StoredResult]) {
    results.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));
}

// ────────────────────────────────────────────────────────────────────────────
// Key layout
// ────────────────────────────────────────────────────────────────────────────

/// `uploads/<id>-<file name>`, with path separators in the name flattened.
pub fn upload_key(id: Uuid, file_name: &str) -> String {
    let name: String = file_name
        .trim()
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();
    let name = if name.is_empty() { "resume".to_string() } else { name };
    format!("{UPLOAD_PREFIX}{id}-{name}")
}

/// Where the pipeline writes the result for an upload locator:
/// `rewritten-resumes/<file stem>.json`.
pub fn result_key(locator: &str) -> String {
    if locator.starts_with(RESULT_PREFIX) {
        return locator.to_string();
    }
    let file = locator.rsplit('/').next().unwrap_or(locator);
    let stem = match file.rfind('.') {
        Some(dot) if dot > 0 => &file[..dot],
        _ => file,
    };
    format!("{RESULT_PREFIX}{stem}.json")
}
