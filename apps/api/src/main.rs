mod ats;
mod config;
mod document;
mod editor;
mod errors;
mod export;
mod identity;
mod layout;
mod retention;
mod routes;
mod session;
mod state;
mod upload;

#[cfg(test)]
mod testing;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::export::renderer::HttpRenderer;
use crate::identity::RedisOnboardingStore;
use crate::routes::build_router;
use crate::session::SessionStore;
use crate::state::AppState;
use crate::upload::s3::S3Storage;
use crate::upload::JobStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting ResumeCraft API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize Redis
    let redis = redis::Client::open(config.redis_url.clone())?;
    info!("Redis client initialized");

    // Initialize S3 / MinIO
    let s3 = build_s3_client(&config).await;
    let storage = Arc::new(S3Storage::new(s3, config.s3_bucket.clone()));
    info!("S3 storage initialized (bucket: {})", config.s3_bucket);

    // Initialize PDF renderer client
    let renderer = HttpRenderer::new(&config.renderer_url)?;
    info!("PDF renderer at {}", renderer.endpoint());

    let pagination = config.pagination_policy.build(config.sections_per_page);
    info!("Pagination policy: {}", pagination.name());

    let state = AppState {
        sessions: SessionStore::new(),
        jobs: JobStore::new(),
        uploads: storage.clone(),
        results: storage,
        exporter: Arc::new(renderer),
        onboarding: Arc::new(RedisOnboardingStore::new(redis)),
        pagination,
        poll: config.poll_config(),
    };

    tokio::spawn(retention::run_sweeper(
        state.sessions.clone(),
        state.jobs.clone(),
        config.retention(),
    ));
    info!(
        "Retention: sessions {}s, jobs {}s, sweep every {}s",
        config.session_ttl_secs, config.job_ttl_secs, config.sweep_interval_secs
    );

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "resumecraft-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    aws_sdk_s3::Client::new(&s3_config)
}
