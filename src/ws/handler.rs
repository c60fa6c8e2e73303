//! Axum WebSocket upgrade handler.

use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::response::{IntoResponse, Response};

use super::connection::run_connection;
use crate::app_state::AppState;

/// `GET /ws` — Upgrade HTTP connection to a subscriber WebSocket.
///
/// Requests that are not valid upgrades are logged and answered with the
/// rejection's 4xx status. A failure after the handshake is logged too; in
/// both cases no subscriber is registered.
pub async fn ws_handler(
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
    State(state): State<AppState>,
) -> Response {
    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => {
            tracing::warn!(
                status = %rejection.status(),
                error = %rejection.body_text(),
                "websocket upgrade rejected"
            );
            return rejection.into_response();
        }
    };
    ws.on_failed_upgrade(|error| tracing::error!(%error, "websocket upgrade failed"))
        .on_upgrade(move |socket| run_connection(socket, state))
}
