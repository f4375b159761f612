//! Export: turns a session's document into a downloadable artifact.
//!
//! TXT is rendered here. PDF goes through an `ExportService` (the external renderer),
//! carried in `AppState` as `Arc<dyn ExportService>`.

pub mod handlers;
pub mod renderer;
pub mod text;

use std::str::FromStr;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::document::ResumeDocument;
use crate::errors::UpstreamError;
use crate::layout::SectionDescriptor;

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Pdf,
    Txt,
}

impl ExportFormat {
    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Txt => "text/plain; charset=utf-8",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Txt => "txt",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(ExportFormat::Pdf),
            "txt" => Ok(ExportFormat::Txt),
            other => Err(format!("Unsupported export format '{other}' (expected pdf or txt)")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateId {
    #[default]
    Modern,
    Elegant,
    Professional,
    Minimalist,
    Creative,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DesignColors {
    pub primary: String,
    pub background: String,
    pub text: String,
}

impl Default for DesignColors {
    fn default() -> Self {
        Self {
            primary: "#4a6cf7".to_string(),
            background: "#ffffff".to_string(),
            text: "#333333".to_string(),
        }
    }
}

/// Style settings forwarded to the renderer untouched. Sizes are multipliers of the
/// template's base size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DesignSettings {
    pub font: String,
    pub font_size: f32,
    pub page_margins: f32,
    pub section_spacing: f32,
    pub colors: DesignColors,
}

impl Default for DesignSettings {
    fn default() -> Self {
        Self {
            font: "Rubik".to_string(),
            font_size: 1.0,
            page_margins: 1.0,
            section_spacing: 1.0,
            colors: DesignColors::default(),
        }
    }
}

/// Body of `POST /api/v1/sessions/:id/export`. `format` is kept as a string so an
/// unsupported value is reported as a validation error rather than a decode failure.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    pub format: String,
    #[serde(default)]
    pub template: TemplateId,
    #[serde(default)]
    pub design_settings: DesignSettings,
    #[serde(default)]
    pub file_name: Option<String>,
    /// Captured preview markup; the renderer prefers it over the document when present.
    #[serde(default)]
    pub html_content: Option<String>,
}

/// What the renderer receives.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderJob<'a> {
    pub resume_data: &'a ResumeDocument,
    pub template: TemplateId,
    pub design_settings: &'a DesignSettings,
    pub file_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_content: Option<&'a str>,
}

#[derive(Debug, Clone)]
pub struct ExportArtifact {
    pub format: ExportFormat,
    pub file_name: String,
    pub bytes: Bytes,
}

impl ExportArtifact {
    pub fn attachment_name(&self) -> String {
        format!("{}.{}", self.file_name, self.format.extension())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Renderer trait
// ────────────────────────────────────────────────────────────────────────────

/// Renders a document to PDF bytes.
#[async_trait]
pub trait ExportService: Send + Sync {
    async fn render_pdf(&self, job: RenderJob<'_>) -> Result<Bytes, UpstreamError>;
}

/// Produces the artifact for `format`. An empty artifact is an error, never a result.
pub async fn export_document(
    exporter: &dyn ExportService,
    document: &ResumeDocument,
    order: &[SectionDescriptor],
    format: ExportFormat,
    request: &ExportRequest,
) -> Result<ExportArtifact, UpstreamError> {
    let file_name = safe_file_name(request.file_name.as_deref().unwrap_or_default(), document);

    let bytes = match format {
        ExportFormat::Txt => Bytes::from(text::render_plain_text(document, order)),
        ExportFormat::Pdf => {
            exporter
                .render_pdf(RenderJob {
                    resume_data: document,
                    template: request.template,
                    design_settings: &request.design_settings,
                    file_name: &file_name,
                    html_content: request.html_content.as_deref(),
                })
                .await?
        }
    };

    if bytes.is_empty() {
        return Err(UpstreamError::EmptyArtifact);
    }

    Ok(ExportArtifact {
        format,
        file_name,
        bytes,
    })
}

/// File name without extension, safe for a `Content-Disposition` header.
/// Falls back to the person's name, then to `resume`.
pub fn safe_file_name(requested: &str, document: &ResumeDocument) -> String {
    let candidate = if requested.trim().is_empty() {
        document.basics.name.as_deref().unwrap_or_default()
    } else {
        requested
    };

    let cleaned: String = candidate
        .trim()
        .trim_end_matches(".pdf")
        .trim_end_matches(".txt")
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.' => c,
            _ => '_',
        })
        .collect();
    let cleaned = cleaned.trim_matches(|c| c == '_' || c == '.').to_string();

    if cleaned.is_empty() {
        "resume".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::normalize;
    use serde_json::json;
    use std::sync::Mutex;

    struct FixedRenderer {
        bytes: &'static [u8],
        seen_template: Mutex<Option<TemplateId>>,
    }

    #[async_trait]
    impl ExportService for FixedRenderer {
        async fn render_pdf(&self, job: RenderJob<'_>) -> Result<Bytes, UpstreamError> {
            *self.seen_template.lock().unwrap() = Some(job.template);
            Ok(Bytes::from_static(self.bytes))
        }
    }

    fn request(format: &str) -> ExportRequest {
        serde_json::from_value(json!({ "format": format, "template": "elegant" })).unwrap()
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("PDF".parse::<ExportFormat>(), Ok(ExportFormat::Pdf));
        assert_eq!("txt".parse::<ExportFormat>(), Ok(ExportFormat::Txt));
        assert!("docx".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_request_defaults() {
        let req: ExportRequest = serde_json::from_value(json!({ "format": "pdf" })).unwrap();
        assert_eq!(req.template, TemplateId::Modern);
        assert_eq!(req.design_settings, DesignSettings::default());
        assert!(req.html_content.is_none());

        let req: ExportRequest = serde_json::from_value(json!({
            "format": "pdf",
            "designSettings": { "font": "Inter", "colors": { "primary": "#000" } }
        }))
        .unwrap();
        assert_eq!(req.design_settings.font, "Inter");
        assert_eq!(req.design_settings.font_size, 1.0);
        assert_eq!(req.design_settings.colors.primary, "#000");
        assert_eq!(req.design_settings.colors.text, "#333333");
    }

    #[test]
    fn test_safe_file_name() {
        let doc = normalize(&json!({ "name": "Jane Doe" }));
        assert_eq!(safe_file_name("", &doc), "Jane_Doe");
        assert_eq!(safe_file_name("my cv.pdf", &doc), "my_cv");
        assert_eq!(safe_file_name("../../etc", &doc), "etc");
        assert_eq!(safe_file_name("\"quoted\"", &ResumeDocument::default()), "quoted");
        assert_eq!(safe_file_name("", &ResumeDocument::default()), "resume");
    }

    #[tokio::test]
    async fn test_pdf_goes_through_renderer() {
        let renderer = FixedRenderer {
            bytes: b"%PDF-1.7",
            seen_template: Mutex::new(None),
        };
        let doc = normalize(&json!({ "name": "Jane" }));
        let artifact = export_document(&renderer, &doc, &[], ExportFormat::Pdf, &request("pdf"))
            .await
            .unwrap();

        assert_eq!(artifact.attachment_name(), "Jane.pdf");
        assert_eq!(&artifact.bytes[..], b"%PDF-1.7");
        assert_eq!(*renderer.seen_template.lock().unwrap(), Some(TemplateId::Elegant));
    }

    #[tokio::test]
    async fn test_empty_pdf_is_an_error() {
        let renderer = FixedRenderer {
            bytes: b"",
            seen_template: Mutex::new(None),
        };
        let err = export_document(
            &renderer,
            &ResumeDocument::default(),
            &[],
            ExportFormat::Pdf,
            &request("pdf"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, UpstreamError::EmptyArtifact));
    }

    #[tokio::test]
    async fn test_txt_is_rendered_locally() {
        let renderer = FixedRenderer {
            bytes: b"",
            seen_template: Mutex::new(None),
        };
        let doc = normalize(&json!({ "name": "Jane", "summary": "Builder" }));
        let order = crate::layout::sections::derive_section_order(&doc);
        let artifact = export_document(&renderer, &doc, &order, ExportFormat::Txt, &request("txt"))
            .await
            .unwrap();

        let text = std::str::from_utf8(&artifact.bytes).unwrap();
        assert!(text.starts_with("Jane\n"));
        assert!(text.contains("SUMMARY\n-------\nBuilder\n"));
        assert!(renderer.seen_template.lock().unwrap().is_none());
    }
}
