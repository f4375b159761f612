//! HTTP client for the external PDF renderer.
//!
//! POSTs the render job as JSON to `<RENDERER_URL>/simple-pdf` and returns the body bytes.
//! Retries on 429 and 5xx with exponential backoff.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::errors::UpstreamError;
use crate::export::{ExportService, RenderJob};

const RENDER_PATH: &str = "/simple-pdf";
const MAX_RETRIES: u32 = 3;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Deserialize)]
struct RendererError {
    #[serde(default)]
    error: String,
    #[serde(default)]
    message: String,
}

#[derive(Clone)]
pub struct HttpRenderer {
    client: Client,
    endpoint: String,
    base_delay: Duration,
}

impl HttpRenderer {
    pub fn new(base_url: &str) -> Result<Self, UpstreamError> {
        Ok(Self {
            client: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            endpoint: format!("{}{RENDER_PATH}", base_url.trim_end_matches('/')),
            base_delay: Duration::from_secs(1),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// How a renderer status is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusClass {
    Success,
    /// 429 and 5xx: worth another attempt.
    Retryable,
    Fatal,
}

fn classify(status: StatusCode) -> StatusClass {
    if status.is_success() {
        StatusClass::Success
    } else if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        StatusClass::Retryable
    } else {
        StatusClass::Fatal
    }
}

/// Delay before retry `attempt` (1-based): `base`, `2 * base`, `4 * base`, ...
fn retry_delay(base: Duration, attempt: u32) -> Duration {
    base * (1 << attempt.saturating_sub(1).min(16))
}

/// Prefers the renderer's `message`, then its `error`, then the raw body.
fn error_message(body: String) -> String {
    match serde_json::from_str::<RendererError>(&body) {
        Ok(e) if !e.message.is_empty() => e.message,
        Ok(e) if !e.error.is_empty() => e.error,
        _ => body,
    }
}

#[async_trait]
impl ExportService for HttpRenderer {
    async fn render_pdf(&self, job: RenderJob<'_>) -> Result<Bytes, UpstreamError> {
        let mut last_error: Option<UpstreamError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                let delay = retry_delay(self.base_delay, attempt);
                warn!(
                    "Render attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = match self.client.post(&self.endpoint).json(&job).send().await {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(UpstreamError::Http(e));
                    continue;
                }
            };

            let status = response.status();
            match classify(status) {
                StatusClass::Success => {}
                StatusClass::Retryable => {
                    let body = response.text().await.unwrap_or_default();
                    warn!("Renderer returned {}: {}", status, body);
                    last_error = Some(UpstreamError::Status {
                        status: status.as_u16(),
                        message: error_message(body),
                    });
                    continue;
                }
                StatusClass::Fatal => {
                    let body = response.text().await.unwrap_or_default();
                    return Err(UpstreamError::Status {
                        status: status.as_u16(),
                        message: error_message(body),
                    });
                }
            }

            let bytes = response.bytes().await?;
            if bytes.is_empty() {
                return Err(UpstreamError::EmptyArtifact);
            }

            debug!("Rendered {} ({} bytes)", job.file_name, bytes.len());
            return Ok(bytes);
        }

        Err(last_error.unwrap_or(UpstreamError::Exhausted {
            attempts: MAX_RETRIES,
            last: "renderer unavailable".to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use axum::{http::StatusCode as ServerStatus, routing::post, Router};

    use crate::document::ResumeDocument;
    use crate::export::{DesignSettings, TemplateId};

    /// Local renderer answering with `statuses` in turn, then 200 with a PDF body.
    async fn fake_renderer(statuses: Vec<u16>) -> (HttpRenderer, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let app = Router::new().route(
            RENDER_PATH,
            post(move || {
                let counter = counter.clone();
                let statuses = statuses.clone();
                async move {
                    let n = counter.fetch_add(1, Ordering::SeqCst);
                    match statuses.get(n) {
                        Some(code) => (
                            ServerStatus::from_u16(*code).unwrap(),
                            br#"{"error":"Simple PDF generation failed","message":"busy"}"#.to_vec(),
                        ),
                        None => (ServerStatus::OK, b"%PDF-1.7".to_vec()),
                    }
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let mut renderer = HttpRenderer::new(&format!("http://{addr}")).unwrap();
        renderer.base_delay = Duration::from_millis(1);
        (renderer, hits)
    }

    async fn render(renderer: &HttpRenderer) -> Result<Bytes, UpstreamError> {
        let document = ResumeDocument::default();
        let design = DesignSettings::default();
        renderer
            .render_pdf(RenderJob {
                resume_data: &document,
                template: TemplateId::default(),
                design_settings: &design,
                file_name: "resume.pdf",
                html_content: None,
            })
            .await
    }

    #[test]
    fn test_endpoint_joins_base_url() {
        assert_eq!(
            HttpRenderer::new("http://renderer:3001/").unwrap().endpoint(),
            "http://renderer:3001/simple-pdf"
        );
        assert_eq!(
            HttpRenderer::new("http://renderer:3001").unwrap().endpoint(),
            "http://renderer:3001/simple-pdf"
        );
    }

    #[test]
    fn test_status_classification() {
        assert_eq!(classify(StatusCode::OK), StatusClass::Success);
        assert_eq!(classify(StatusCode::TOO_MANY_REQUESTS), StatusClass::Retryable);
        assert_eq!(classify(StatusCode::BAD_GATEWAY), StatusClass::Retryable);
        assert_eq!(classify(StatusCode::SERVICE_UNAVAILABLE), StatusClass::Retryable);
        assert_eq!(classify(StatusCode::BAD_REQUEST), StatusClass::Fatal);
        assert_eq!(classify(StatusCode::NOT_FOUND), StatusClass::Fatal);
    }

    #[test]
    fn test_backoff_doubles() {
        let base = Duration::from_secs(1);
        assert_eq!(retry_delay(base, 1), Duration::from_secs(1));
        assert_eq!(retry_delay(base, 2), Duration::from_secs(2));
        assert_eq!(retry_delay(base, 3), Duration::from_secs(4));
    }

    #[test]
    fn test_error_message_prefers_message_then_error() {
        assert_eq!(
            error_message(r#"{"error":"Simple PDF generation failed","message":"boom"}"#.into()),
            "boom"
        );
        assert_eq!(error_message(r#"{"error":"bad template"}"#.into()), "bad template");
        assert_eq!(error_message("plain text".into()), "plain text");
    }

    #[tokio::test]
    async fn test_retries_server_errors_then_succeeds() {
        let (renderer, hits) = fake_renderer(vec![503, 429]).await;
        let bytes = render(&renderer).await.unwrap();
        assert_eq!(&bytes[..], b"%PDF-1.7");
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let (renderer, hits) = fake_renderer(vec![500, 500, 500, 500]).await;
        let err = render(&renderer).await.unwrap_err();
        assert!(matches!(err, UpstreamError::Status { status: 500, ref message } if message == "busy"));
        assert_eq!(hits.load(Ordering::SeqCst), MAX_RETRIES as usize);
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let (renderer, hits) = fake_renderer(vec![400]).await;
        let err = render(&renderer).await.unwrap_err();
        assert!(matches!(err, UpstreamError::Status { status: 400, .. }));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
