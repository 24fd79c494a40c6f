//! API Routes
//!
//! HTTP endpoints for Prometheus scraping and operational status.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::api::ExporterMetrics;
use crate::config::ExporterConfig;
use crate::poller::ExporterStatus;

/// Shared API state
pub struct ApiState {
    pub metrics: Arc<ExporterMetrics>,
    pub status: Arc<RwLock<ExporterStatus>>,
}

/// Run the HTTP API server
pub async fn run_api_server(
    config: Arc<ExporterConfig>,
    metrics: Arc<ExporterMetrics>,
    status: Arc<RwLock<ExporterStatus>>,
) -> anyhow::Result<()> {
    let state = Arc::new(ApiState { metrics, status });

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/status", get(get_status))
        .route("/metrics", get(get_metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind((
        config.exporter_address.as_str(),
        config.exporter_port,
    ))
    .await?;
    info!("📊 metrics endpoint listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}

/// GET /health - Simple health check
async fn health_check() -> impl IntoResponse {
    "OK"
}

/// GET /status - Detailed status
async fn get_status(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    let status = state.status.read().await;

    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": state.metrics.uptime_secs(),
        "network": {
            "known_nodes": status.known_nodes,
            "last_cycle_samples": status.last_cycle_samples,
            "highest_block": status.highest_block,
        },
        "window": {
            "cycles": status.cycles,
            "len": status.window_len,
            "full": status.window_full,
        }
    }))
}

/// GET /metrics - Prometheus format metrics
async fn get_metrics(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    match state.metrics.gather() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            body,
        ),
        Err(e) => {
            error!("failed to render metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                String::new(),
            )
        }
    }
}
