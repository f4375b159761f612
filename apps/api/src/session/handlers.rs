use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::editor::{FormattedText, Formatting};
use crate::errors::AppError;
use crate::layout::{MoveDirection, PageAssignment, SectionDescriptor};
use crate::session::{EditingSession, SessionStore};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldEdit {
    pub path: String,
    pub value: String,
    #[serde(default)]
    pub formatting: Formatting,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldEditResponse {
    pub applied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub session: EditingSession,
}

#[derive(Debug, Deserialize)]
pub struct FieldQuery {
    pub path: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddSection {
    pub section_type: String,
    #[serde(default)]
    pub custom_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MoveSection {
    pub direction: MoveDirection,
}

#[derive(Debug, Deserialize)]
pub struct Rearrange {
    pub ids: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse {
    #[serde(flatten)]
    pub page: PageAssignment,
    pub page_count: usize,
    pub policy: &'static str,
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Session {id} not found"))
}

async fn load(sessions: &SessionStore, id: Uuid) -> Result<EditingSession, AppError> {
    sessions.get(id).await.ok_or_else(|| not_found(id))
}

/// POST /api/v1/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
    Json(raw): Json<Value>,
) -> (StatusCode, Json<EditingSession>) {
    let session = EditingSession::from_raw(&raw);
    state.sessions.insert(session.clone()).await;
    (StatusCode::CREATED, Json(session))
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<EditingSession>, AppError> {
    Ok(Json(load(&state.sessions, id).await?))
}

/// DELETE /api/v1/sessions/:id
pub async fn handle_delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !state.sessions.remove(id).await {
        return Err(not_found(id));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /api/v1/sessions/:id/fields
///
/// An address that cannot be resolved is not an error: the document is returned
/// unchanged with `applied: false`.
pub async fn handle_edit_field(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<FieldEdit>,
) -> Result<Json<FieldEditResponse>, AppError> {
    let response = state
        .sessions
        .update(id, |session| {
            let result = session.edit(&req.path, &req.value, req.formatting);
            FieldEditResponse {
                applied: result.is_ok(),
                reason: result.err().map(|e| e.to_string()),
                session: session.clone(),
            }
        })
        .await
        .ok_or_else(|| not_found(id))?;
    Ok(Json(response))
}

/// GET /api/v1/sessions/:id/fields?path=
pub async fn handle_get_field(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<FieldQuery>,
) -> Result<Json<FormattedText>, AppError> {
    let session = load(&state.sessions, id).await?;
    session
        .field_text(&query.path)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("No text field at '{}'", query.path)))
}

/// GET /api/v1/sessions/:id/sections
pub async fn handle_list_sections(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<SectionDescriptor>>, AppError> {
    Ok(Json(load(&state.sessions, id).await?.section_order))
}

/// POST /api/v1/sessions/:id/sections
pub async fn handle_add_section(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<AddSection>,
) -> Result<(StatusCode, Json<Vec<SectionDescriptor>>), AppError> {
    let section_type = req.section_type.trim().to_lowercase();
    if section_type.is_empty() {
        return Err(AppError::Validation("sectionType must not be empty".to_string()));
    }
    let order = state
        .sessions
        .update(id, |session| {
            session.add_section(&section_type, req.custom_name.as_deref());
            session.section_order.clone()
        })
        .await
        .ok_or_else(|| not_found(id))?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// DELETE /api/v1/sessions/:id/sections/:section_id
pub async fn handle_delete_section(
    State(state): State<AppState>,
    Path((id, section_id)): Path<(Uuid, String)>,
) -> Result<Json<Vec<SectionDescriptor>>, AppError> {
    let (existed, order) = state
        .sessions
        .update(id, |session| {
            let existed = session.delete_section(&section_id);
            (existed, session.section_order.clone())
        })
        .await
        .ok_or_else(|| not_found(id))?;
    if !existed {
        return Err(AppError::NotFound(format!("Section '{section_id}' not found")));
    }
    Ok(Json(order))
}

/// POST /api/v1/sessions/:id/sections/:section_id/move
pub async fn handle_move_section(
    State(state): State<AppState>,
    Path((id, section_id)): Path<(Uuid, String)>,
    Json(req): Json<MoveSection>,
) -> Result<Json<Vec<SectionDescriptor>>, AppError> {
    let order = state
        .sessions
        .update(id, |session| {
            session.move_section(&section_id, req.direction);
            session.section_order.clone()
        })
        .await
        .ok_or_else(|| not_found(id))?;
    Ok(Json(order))
}

/// PUT /api/v1/sessions/:id/sections/order
pub async fn handle_rearrange_sections(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<Rearrange>,
) -> Result<Json<Vec<SectionDescriptor>>, AppError> {
    let (accepted, order) = state
        .sessions
        .update(id, |session| {
            let accepted = session.rearrange(&req.ids);
            (accepted, session.section_order.clone())
        })
        .await
        .ok_or_else(|| not_found(id))?;
    if !accepted {
        return Err(AppError::Validation(
            "ids must list every current section exactly once".to_string(),
        ));
    }
    Ok(Json(order))
}

/// GET /api/v1/sessions/:id/pages/:page
pub async fn handle_get_page(
    State(state): State<AppState>,
    Path((id, page)): Path<(Uuid, usize)>,
) -> Result<Json<PageResponse>, AppError> {
    let session = load(&state.sessions, id).await?;
    let policy = state.pagination.as_ref();
    Ok(Json(PageResponse {
        page: session.page(policy, page),
        page_count: policy.page_count(&session.section_order, &session.document),
        policy: policy.name(),
    }))
}
