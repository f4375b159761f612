use std::sync::Arc;

use crate::export::ExportService;
use crate::identity::OnboardingStore;
use crate::layout::PaginationPolicy;
use crate::session::SessionStore;
use crate::upload::{JobStore, PollConfig, ResultFetcher, UploadService};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionStore,
    pub jobs: JobStore,
    /// Object store the uploaded file goes to. Default: S3Storage.
    pub uploads: Arc<dyn UploadService>,
    /// Where processed résumé JSON is read back from. Default: S3Storage.
    pub results: Arc<dyn ResultFetcher>,
    /// PDF renderer. Default: HttpRenderer against RENDERER_URL.
    pub exporter: Arc<dyn ExportService>,
    pub onboarding: Arc<dyn OnboardingStore>,
    /// Selected via PAGINATION_POLICY.
    pub pagination: Arc<dyn PaginationPolicy>,
    pub poll: PollConfig,
}
