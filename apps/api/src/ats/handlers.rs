use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;
use uuid::Uuid;

use crate::ats::{score_document, AtsReport};
use crate::document::normalize;
use crate::errors::AppError;
use crate::state::AppState;

/// GET /api/v1/sessions/:id/ats
pub async fn handle_session_ats(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AtsReport>, AppError> {
    let session = state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))?;
    Ok(Json(score_document(&session.document)))
}

/// POST /api/v1/documents/ats
/// Normalizes the body first, so raw processed output can be scored directly.
pub async fn handle_document_ats(Json(raw): Json<Value>) -> Json<AtsReport> {
    Json(score_document(&normalize(&raw)))
}
