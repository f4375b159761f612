use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::export::{export_document, ExportFormat, ExportRequest};
use crate::state::AppState;

/// POST /api/v1/sessions/:id/export
pub async fn handle_export(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ExportRequest>,
) -> Result<Response, AppError> {
    let format: ExportFormat = req.format.parse().map_err(AppError::Validation)?;
    let session = state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))?;

    let artifact = export_document(
        state.exporter.as_ref(),
        &session.document,
        &session.section_order,
        format,
        &req,
    )
    .await?;

    info!(
        "Exported session {id} as {} ({} bytes)",
        artifact.attachment_name(),
        artifact.bytes.len()
    );

    let disposition = format!("attachment; filename=\"{}\"", artifact.attachment_name());
    Ok((
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
            (header::CACHE_CONTROL, "no-cache, no-store, must-revalidate".to_string()),
            (header::PRAGMA, "no-cache".to_string()),
            (header::EXPIRES, "0".to_string()),
        ],
        artifact.bytes,
    )
        .into_response())
}
