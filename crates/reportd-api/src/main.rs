//! Binary entrypoint for the reportd API server.
use std::sync::Arc;

use anyhow::Context;
use reportd_api::{run, AppState};
use reportd_core::ReportConfig;
use reportd_engine::{ensure_directories, ProcessEngine};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("reportd=info,tower_http=info")),
        )
        .init();

    // REPORTD_CONFIG points at an optional YAML file; env vars override it.
    let config = ReportConfig::from_env().context("loading configuration")?;
    ensure_directories(&config).context("preparing storage directories")?;

    let engine = Arc::new(ProcessEngine::from_config(&config.engine));
    let addr = config.server.addr.clone();
    let state = AppState::new(config, engine).context("registering metrics")?;

    run(&addr, state).await
}
