use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Failure talking to an external collaborator (object store, renderer).
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("storage error: {0}")]
    Storage(String),

    #[error("could not parse upstream payload: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("upstream returned an empty artifact")]
    EmptyArtifact,

    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: String },

    #[error("cancelled")]
    Cancelled,
}

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Authentication required".to_string(),
            ),
            AppError::Upstream(e) => {
                tracing::error!("Upstream error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "UPSTREAM_ERROR",
                    "An upstream service failed".to_string(),
                )
            }
            AppError::Storage(msg) => {
                tracing::error!("Storage error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_ERROR",
                    "A storage error occurred".to_string(),
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND, "NOT_FOUND"),
            (AppError::Validation("x".into()), StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            (AppError::Unauthorized, StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            (
                AppError::Upstream(UpstreamError::EmptyArtifact),
                StatusCode::BAD_GATEWAY,
                "UPSTREAM_ERROR",
            ),
            (AppError::Storage("x".into()), StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
        ];
        for (error, status, code) in cases {
            let (s, c, _) = error.parts();
            assert_eq!((s, c), (status, code));
        }
    }

    #[test]
    fn test_internal_details_are_not_exposed() {
        let (_, _, message) = AppError::Storage("bucket secret-bucket missing".into()).parts();
        assert!(!message.contains("secret-bucket"));

        let (_, _, message) = AppError::Upstream(UpstreamError::Status {
            status: 500,
            message: "stack trace".into(),
        })
        .parts();
        assert!(!message.contains("stack trace"));
    }

    #[test]
    fn test_into_response_sets_status() {
        let response = AppError::NotFound("session".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
