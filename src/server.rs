//! HTTP server bootstrap.

use std::sync::Arc;

use anyhow::Context;
use ticketlens_core::{config::Config, Pipeline};
use tokio::net::TcpListener;
use tracing::info;

use crate::api::{self, AppState};

/// Build the shared state and router from `config`.
pub fn app(config: &Config) -> axum::Router {
    let state = Arc::new(AppState::new(
        Pipeline::from_config(&config.ingest),
        config.report.top_technicians,
    ));
    api::router(state, config.server.max_upload_bytes)
}

/// Bind and serve until the process receives Ctrl-C.
///
/// `bind` overrides `config.server.bind` when given.
pub async fn serve(config: &Config, bind: Option<&str>) -> anyhow::Result<()> {
    let addr = bind.unwrap_or(config.server.bind.as_str());
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(
        addr = %listener.local_addr()?,
        max_upload_bytes = config.server.max_upload_bytes,
        "listening"
    );

    axum::serve(listener, app(config))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown requested");
    }
}
