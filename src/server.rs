//! HTTP surface: three POST endpoints and a health probe.
//!
//! Bodies are taken as raw bytes and parsed here rather than through axum's
//! `Json` extractor, so a body that is not JSON at all still gets the
//! validator's 400 response shape instead of an extractor rejection.

use crate::analyze::{Analyzer, Flow, FlowResponse};
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<Analyzer>,
}

impl AppState {
    pub fn new(analyzer: Analyzer) -> Self {
        Self {
            analyzer: Arc::new(analyzer),
        }
    }
}

impl IntoResponse for FlowResponse {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}

/// Create the router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/extract", post(extract))
        .route("/extract-enriched", post(extract_enriched))
        .route("/describe-image", post(describe_image))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve until the listener fails.
pub async fn serve(state: AppState, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, create_router(state)).await
}

/// Health check endpoint for container orchestration.
async fn health() -> impl IntoResponse {
    StatusCode::OK
}

async fn extract(State(state): State<AppState>, body: Bytes) -> FlowResponse {
    run(&state, Flow::Extract, &body).await
}

async fn extract_enriched(State(state): State<AppState>, body: Bytes) -> FlowResponse {
    run(&state, Flow::ExtractEnriched, &body).await
}

async fn describe_image(State(state): State<AppState>, body: Bytes) -> FlowResponse {
    run(&state, Flow::DescribeImage, &body).await
}

async fn run(state: &AppState, flow: Flow, body: &[u8]) -> FlowResponse {
    // Unparseable bodies fall through to validation as `null`.
    let value: Value = serde_json::from_slice(body).unwrap_or(Value::Null);
    state.analyzer.run(flow, &value).await
}
