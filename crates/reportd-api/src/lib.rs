//! reportd API /v1: REST endpoints
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use reportd_core::ReportConfig;
use reportd_engine::RenderEngine;

pub use error::ApiError;
pub use metrics::ReportMetrics;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ReportConfig>,
    pub engine: Arc<dyn RenderEngine>,
    pub metrics: Arc<ReportMetrics>,
}

impl AppState {
    pub fn new(
        config: ReportConfig,
        engine: Arc<dyn RenderEngine>,
    ) -> Result<Self, prometheus::Error> {
        Ok(Self {
            config: Arc::new(config),
            engine,
            metrics: Arc::new(ReportMetrics::new()?),
        })
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/v1/reports", get(handlers::list_reports))
        .route("/v1/reports/gross-with-vat", post(handlers::gross_with_vat))
        .route("/v1/reports/view", post(handlers::view))
        .route("/v1/reports/custom", post(handlers::custom))
        .route("/v1/reports/cleanup", post(handlers::cleanup))
        .route("/v1/reports/connection-test", get(handlers::connection_test))
        .route("/v1/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .layer(axum::middleware::from_fn(middleware::no_store))
        .layer(middleware::trace())
        .layer(middleware::cors())
        .with_state(state)
}

pub async fn run(addr: &str, state: AppState) -> anyhow::Result<()> {
    let app = create_app(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("reportd listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
