use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::{normalize, ResumeDocument};
use crate::editor::{edit, Formatting};
use crate::layout::sections::derive_section_order;
use crate::layout::SectionDescriptor;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizeResponse {
    pub document: ResumeDocument,
    pub section_order: Vec<SectionDescriptor>,
}

impl NormalizeResponse {
    fn from_document(document: ResumeDocument) -> Self {
        let section_order = derive_section_order(&document);
        Self {
            document,
            section_order,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DocumentEdit {
    pub document: Value,
    pub path: String,
    pub value: String,
    #[serde(default)]
    pub formatting: Formatting,
}

/// POST /api/v1/documents/normalize
/// Stateless: normalizes the body and derives its section order without opening a session.
pub async fn handle_normalize(Json(raw): Json<Value>) -> Json<NormalizeResponse> {
    Json(NormalizeResponse::from_document(normalize(&raw)))
}

/// POST /api/v1/documents/edit
/// Stateless edit. An unresolvable path returns the normalized document unchanged.
pub async fn handle_edit_document(Json(req): Json<DocumentEdit>) -> Json<NormalizeResponse> {
    let document = normalize(&req.document);
    Json(NormalizeResponse::from_document(edit(
        &document,
        &req.path,
        &req.value,
        req.formatting,
    )))
}
