//! Message submission handler.

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::SubmitMessageRequest;
use crate::app_state::AppState;
use crate::error::{ErrorResponse, RelayError};

/// `POST /messages` — Queue a message for broadcast.
///
/// Success means the message was queued; it says nothing about whether any
/// subscriber received it.
///
/// # Errors
///
/// Returns [`RelayError::InvalidRequest`] on a malformed body or blank
/// text, and [`RelayError::QueueFull`] / [`RelayError::QueueClosed`] when
/// the broadcast queue cannot take the message.
#[utoipa::path(
    post,
    path = "/api/v1/messages",
    tag = "Messages",
    summary = "Broadcast a message",
    description = "Queues a message for delivery to every connected WebSocket subscriber. The text may be given as `content` or `message`; `type` is an optional tag.",
    request_body = SubmitMessageRequest,
    responses(
        (status = 200, description = "Message queued for broadcast"),
        (status = 400, description = "Malformed body or empty text", body = ErrorResponse),
        (status = 503, description = "Broadcast queue full or shut down", body = ErrorResponse),
    )
)]
pub async fn submit_message(
    State(state): State<AppState>,
    payload: Result<Json<SubmitMessageRequest>, JsonRejection>,
) -> Result<StatusCode, RelayError> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::warn!(error = %rejection.body_text(), "rejected submission body");
        RelayError::InvalidRequest(rejection.body_text())
    })?;

    let message = request
        .into_message()
        .inspect_err(|e| tracing::warn!(error = %e, "rejected submission"))?;

    tracing::debug!(kind = ?message.kind(), len = message.content().len(), "message submitted");
    state
        .broadcaster
        .submit(message)
        .await
        .inspect_err(|e| tracing::warn!(error = %e, "could not queue submission"))?;

    Ok(StatusCode::OK)
}

/// Submission routes mounted under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new().route("/messages", post(submit_message))
}

/// Root-level alias kept for producers that post to `/post`.
pub fn legacy_routes() -> Router<AppState> {
    Router::new().route("/post", post(submit_message))
}
