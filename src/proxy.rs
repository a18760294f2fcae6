//! HTTP passthrough in front of the memory service
//!
//! Exposes a small fixed set of memory endpoints and relays them to the
//! backend, attaching the configured API key.

use axum::{
    extract::{RawQuery, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use reqwest::Method;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::client::{MemoryApiClient, Upstream};
use crate::error::SyncError;

/// Service name reported by `/health` and `/info`
pub const SERVICE_NAME: &str = "memory-sync-proxy";

/// Routes served by the proxy, as listed by `/info`
pub const ENDPOINTS: &[&str] = &[
    "GET /health",
    "GET /memory/search",
    "POST /memory/add",
    "GET /memory/stats",
    "GET /memory/health",
    "GET /info",
];

/// Shared handler state
#[derive(Clone)]
pub struct ProxyState {
    client: Arc<MemoryApiClient>,
}

impl ProxyState {
    pub fn new(client: MemoryApiClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }
}

/// Error returned to proxy callers
#[derive(Debug)]
pub struct ProxyError(SyncError);

impl From<SyncError> for ProxyError {
    fn from(e: SyncError) -> Self {
        ProxyError(e)
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        tracing::error!("Memory backend request failed: {}", self.0);
        (
            StatusCode::BAD_GATEWAY,
            Json(json!({ "error": self.0.to_string() })),
        )
            .into_response()
    }
}

fn relay(upstream: Upstream) -> Response {
    (upstream.status, Json(upstream.body)).into_response()
}

/// Build the proxy router
pub fn router(state: ProxyState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/info", get(info_handler))
        .route("/memory/search", get(search_handler))
        .route("/memory/add", post(add_handler))
        .route("/memory/stats", get(stats_handler))
        .route("/memory/health", get(backend_health_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": SERVICE_NAME,
        "version": crate::VERSION,
    }))
}

async fn info_handler(State(state): State<ProxyState>) -> impl IntoResponse {
    Json(json!({
        "service": SERVICE_NAME,
        "version": crate::VERSION,
        "backend": state.client.base_url(),
        "endpoints": ENDPOINTS,
    }))
}

async fn search_handler(
    State(state): State<ProxyState>,
    RawQuery(query): RawQuery,
) -> Result<Response, ProxyError> {
    let upstream = state
        .client
        .forward(Method::GET, "/memory/search", query.as_deref(), None)
        .await?;
    Ok(relay(upstream))
}

async fn add_handler(
    State(state): State<ProxyState>,
    Json(body): Json<Value>,
) -> Result<Response, ProxyError> {
    let upstream = state
        .client
        .forward(Method::POST, "/memory/add", None, Some(&body))
        .await?;
    Ok(relay(upstream))
}

async fn stats_handler(State(state): State<ProxyState>) -> Result<Response, ProxyError> {
    let upstream = state
        .client
        .forward(Method::GET, "/memory/stats", None, None)
        .await?;
    Ok(relay(upstream))
}

async fn backend_health_handler(
    State(state): State<ProxyState>,
) -> Result<Response, ProxyError> {
    let upstream = state
        .client
        .forward(Method::GET, "/health", None, None)
        .await?;
    Ok(relay(upstream))
}
