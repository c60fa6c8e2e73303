//! Relay error types with HTTP status code mapping.
//!
//! [`RelayError`] is the central error type for the relay. Admission and
//! queue errors are returned to HTTP callers; connection-level errors stay
//! inside the broadcast engine and liveness prober, where they only trigger
//! removal of the failing subscriber.

use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::ConnectionId;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 1001,
///     "message": "invalid request: content must not be empty"
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see [`RelayError`] code ranges).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Relay error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category    | HTTP Status                     |
/// |-----------|-------------|---------------------------------|
/// | 1000–1999 | Validation  | 400 Bad Request                 |
/// | 3000–3999 | Queue       | 503 Service Unavailable         |
/// | 5000–5999 | Connection  | never sent to producers         |
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Request body could not be decoded or failed validation.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The broadcast queue stayed full for the whole submit wait.
    #[error("broadcast queue is full; retry later")]
    QueueFull,

    /// The broadcast engine has shut down and accepts no more messages.
    #[error("broadcast queue is closed")]
    QueueClosed,

    /// Write attempted on a connection that has already been closed.
    #[error("connection {0} is closed")]
    ConnectionClosed(ConnectionId),

    /// A subscriber write did not complete within the write deadline.
    #[error("write timed out after {0:?}")]
    WriteTimeout(Duration),

    /// The underlying WebSocket transport reported an error.
    #[error("transport error: {0}")]
    Transport(#[from] axum::Error),
}

impl RelayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::QueueFull => 3001,
            Self::QueueClosed => 3002,
            Self::ConnectionClosed(_) => 5001,
            Self::WriteTimeout(_) => 5002,
            Self::Transport(_) => 5003,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::QueueFull | Self::QueueClosed => StatusCode::SERVICE_UNAVAILABLE,
            Self::ConnectionClosed(_) | Self::WriteTimeout(_) | Self::Transport(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_client_errors() {
        let err = RelayError::InvalidRequest("content must not be empty".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), 1001);
    }

    #[test]
    fn queue_errors_are_service_unavailable() {
        assert_eq!(
            RelayError::QueueFull.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            RelayError::QueueClosed.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn connection_errors_use_the_5000_range() {
        let codes = [
            RelayError::ConnectionClosed(ConnectionId::new()).error_code(),
            RelayError::WriteTimeout(Duration::from_millis(5)).error_code(),
            RelayError::Transport(axum::Error::new("broken pipe")).error_code(),
        ];
        assert_eq!(codes, [5001, 5002, 5003]);
    }

    #[test]
    fn into_response_uses_mapped_status() {
        let response = RelayError::QueueFull.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
