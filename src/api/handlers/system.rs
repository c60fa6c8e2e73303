//! System endpoints: status page and health check.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;

/// Body of the root status page.
pub const STATUS_PAGE: &str = "<h1>WebSocket server is running</h1>\n";

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
    /// Subscribers currently registered.
    subscribers: usize,
    /// Messages waiting in the broadcast queue.
    queued_messages: usize,
}

/// `GET /` — Static status page.
#[utoipa::path(
    get,
    path = "/",
    tag = "System",
    summary = "Status page",
    responses(
        (status = 200, description = "Server is running", body = String, content_type = "text/html"),
    )
)]
pub async fn status_page() -> Html<&'static str> {
    Html(STATUS_PAGE)
}

/// `GET /health` — Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health, version, subscriber count and broadcast queue depth.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Broadcast engine has stopped", body = HealthResponse),
    )
)]
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let accepting = !state.broadcaster.is_closed();
    let status = if accepting {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        status,
        Json(HealthResponse {
            status: (if accepting { "healthy" } else { "shutting_down" }).to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            subscribers: state.registry.len().await,
            queued_messages: state.broadcaster.queued(),
        }),
    )
}

/// System routes mounted at the root level (not under /api/v1).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(status_page))
        .route("/health", get(health_handler))
}
