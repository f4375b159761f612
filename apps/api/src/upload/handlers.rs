use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::{AppError, UpstreamError};
use crate::session::EditingSession;
use crate::state::AppState;
use crate::upload::{poll_for_document, FetchOutcome, JobStatus, StoredResult, UploadJob, UploadRequest};

/// POST /api/v1/uploads
///
/// Multipart body: `file` (required) and `jobDescription` (optional). Stores the file,
/// starts polling for the processed result and returns the pending job.
pub async fn handle_create_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadJob>), AppError> {
    let mut file: Option<UploadRequest> = None;
    let mut job_description: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or("resume").to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Could not read file: {e}")))?;
                file = Some(UploadRequest {
                    file_name,
                    content_type,
                    bytes,
                    job_description: None,
                });
            }
            "jobDescription" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Could not read jobDescription: {e}")))?;
                job_description = Some(text);
            }
            _ => {}
        }
    }

    let mut request = file.ok_or_else(|| AppError::Validation("Missing 'file' field".to_string()))?;
    if request.bytes.is_empty() {
        return Err(AppError::Validation("Uploaded file is empty".to_string()));
    }
    request.job_description = job_description;

    let locator = state.uploads.upload(request).await?;
    let job = UploadJob::new(locator.clone());
    let job_id = job.id;
    let cancel = job.cancel_token();
    state.jobs.insert(job.clone()).await;

    info!("Upload job {job_id} created for {locator}");
    tokio::spawn(run_poll(state, job_id, locator, cancel));

    Ok((StatusCode::ACCEPTED, Json(job)))
}

/// GET /api/v1/uploads/:id
pub async fn handle_get_upload(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<UploadJob>, AppError> {
    state
        .jobs
        .get(id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Upload job {id} not found")))
}

/// DELETE /api/v1/uploads/:id
pub async fn handle_cancel_upload(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<UploadJob>, AppError> {
    state
        .jobs
        .cancel(id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Upload job {id} not found")))
}

// ────────────────────────────────────────────────────────────────────────────
// Processed results
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ResultQuery {
    pub key: String,
}

async fn fetch_result(state: &AppState, key: &str) -> Result<Value, AppError> {
    let key = key.trim();
    if key.is_empty() {
        return Err(AppError::Validation("Result key must not be empty".to_string()));
    }
    match state.results.fetch(Some(key)).await? {
        FetchOutcome::Ready(raw) => Ok(raw),
        FetchOutcome::NotReady => Err(AppError::NotFound(format!("Result '{key}' not found"))),
    }
}

/// GET /api/v1/results
/// Processed résumés in the result store, newest first.
pub async fn handle_list_results(State(state): State<AppState>) -> Result<Json<Vec<StoredResult>>, AppError> {
    Ok(Json(state.results.list().await?))
}

/// GET /api/v1/results/document?key=
/// The stored JSON as written by the processing pipeline, not normalized.
pub async fn handle_get_result(
    State(state): State<AppState>,
    Query(query): Query<ResultQuery>,
) -> Result<Json<Value>, AppError> {
    fetch_result(&state, &query.key).await.map(Json)
}

/// POST /api/v1/results/session
/// Opens an editing session on a stored result.
pub async fn handle_open_result(
    State(state): State<AppState>,
    Json(query): Json<ResultQuery>,
) -> Result<(StatusCode, Json<EditingSession>), AppError> {
    let raw = fetch_result(&state, &query.key).await?;
    let session = EditingSession::from_raw(&raw);
    state.sessions.insert(session.clone()).await;
    info!("Session {} opened from result {}", session.id, query.key);
    Ok((StatusCode::CREATED, Json(session)))
}

/// Polls for the processed résumé and opens a session when it arrives.
pub(crate) async fn run_poll(state: AppState, job_id: Uuid, locator: String, cancel: CancellationToken) {
    let outcome = poll_for_document(state.results.as_ref(), Some(&locator), state.poll, &cancel).await;

    let status = match outcome {
        Ok(raw) => {
            open_session(&state, job_id, &raw, &cancel).await;
            return;
        }
        Err(UpstreamError::Cancelled) => {
            info!("Upload job {job_id} cancelled");
            JobStatus::Cancelled
        }
        Err(e @ UpstreamError::Exhausted { .. }) => {
            warn!("Upload job {job_id} failed: {e}");
            JobStatus::Failed {
                message: "Résumé processing did not finish in time".to_string(),
            }
        }
        Err(e) => {
            warn!("Upload job {job_id} failed: {e}");
            JobStatus::Failed {
                message: "Résumé processing failed".to_string(),
            }
        }
    };

    state.jobs.finish(job_id, status).await;
}

/// Opens the session for a finished poll unless the job was cancelled meanwhile.
/// A cancel can land between the insert and `finish`; the session is dropped then.
async fn open_session(
    state: &AppState,
    job_id: Uuid,
    raw: &Value,
    cancel: &CancellationToken,
) -> Option<Uuid> {
    if cancel.is_cancelled() {
        info!("Upload job {job_id} cancelled before its result was opened");
        return None;
    }
    let session_id = state.sessions.insert(EditingSession::from_raw(raw)).await;
    if state.jobs.finish(job_id, JobStatus::Ready { session_id }).await {
        info!("Upload job {job_id} ready as session {session_id}");
        Some(session_id)
    } else {
        state.sessions.remove(session_id).await;
        info!("Upload job {job_id} cancelled; session {session_id} discarded");
        None
    }
}
