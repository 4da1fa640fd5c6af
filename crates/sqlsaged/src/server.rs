//! HTTP server for sqlsaged

use crate::pipeline::Pipeline;
use crate::routes;
use anyhow::{Context, Result};
use axum::Router;
use std::sync::Arc;
use std::time::Instant;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Largest accepted request body
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Application state shared across handlers
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            start_time: Instant::now(),
        }
    }
}

/// All routes with their layers, ready to serve
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(routes::page_routes())
        .merge(routes::ask_routes())
        .merge(routes::health_routes())
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
}

/// Run the HTTP server until Ctrl-C
pub async fn run(bind: &str, state: Arc<AppState>) -> Result<()> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;
    info!("  Listening on http://{}", bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutting down gracefully");
    }
}
