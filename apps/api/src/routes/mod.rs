pub mod health;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::ats::handlers as ats;
use crate::document::handlers as documents;
use crate::export::handlers as export;
use crate::identity::handlers as identity;
use crate::session::handlers as sessions;
use crate::state::AppState;
use crate::upload::handlers as uploads;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Documents
        .route("/api/v1/documents/normalize", post(documents::handle_normalize))
        .route("/api/v1/documents/edit", post(documents::handle_edit_document))
        .route("/api/v1/documents/ats", post(ats::handle_document_ats))
        // Editing sessions
        .route("/api/v1/sessions", post(sessions::handle_create_session))
        .route(
            "/api/v1/sessions/:id",
            get(sessions::handle_get_session).delete(sessions::handle_delete_session),
        )
        .route(
            "/api/v1/sessions/:id/fields",
            get(sessions::handle_get_field).patch(sessions::handle_edit_field),
        )
        .route(
            "/api/v1/sessions/:id/sections",
            get(sessions::handle_list_sections).post(sessions::handle_add_section),
        )
        .route(
            "/api/v1/sessions/:id/sections/order",
            put(sessions::handle_rearrange_sections),
        )
        .route(
            "/api/v1/sessions/:id/sections/:section_id",
            axum::routing::delete(sessions::handle_delete_section),
        )
        .route(
            "/api/v1/sessions/:id/sections/:section_id/move",
            post(sessions::handle_move_section),
        )
        .route("/api/v1/sessions/:id/pages/:page", get(sessions::handle_get_page))
        .route("/api/v1/sessions/:id/export", post(export::handle_export))
        .route("/api/v1/sessions/:id/ats", get(ats::handle_session_ats))
        // Uploads
        .route("/api/v1/uploads", post(uploads::handle_create_upload))
        .route(
            "/api/v1/uploads/:id",
            get(uploads::handle_get_upload).delete(uploads::handle_cancel_upload),
        )
        // Processed results
        .route("/api/v1/results", get(uploads::handle_list_results))
        .route("/api/v1/results/document", get(uploads::handle_get_result))
        .route("/api/v1/results/session", post(uploads::handle_open_result))
        // Onboarding
        .route(
            "/api/v1/onboarding",
            get(identity::handle_get_onboarding).put(identity::handle_set_onboarding),
        )
        .with_state(state)
}
