//! OpenAPI document for the REST surface.
//!
//! The WebSocket endpoint itself is not a REST path; its frame payload is
//! published as the `OutboundMessage` schema.

use utoipa::OpenApi;

use crate::api::dto::SubmitMessageRequest;
use crate::api::handlers::{messages, system};
use crate::domain::OutboundMessage;
use crate::error::{ErrorBody, ErrorResponse};

/// Aggregated OpenAPI specification, served by Swagger UI when the
/// `swagger-ui` feature is enabled.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "ws-relay",
        description = "Submit messages over HTTP and receive them on every connected WebSocket subscriber"
    ),
    paths(
        messages::submit_message,
        system::status_page,
        system::health_handler,
    ),
    components(schemas(
        SubmitMessageRequest,
        OutboundMessage,
        ErrorResponse,
        ErrorBody,
        system::HealthResponse,
    )),
    tags(
        (name = "Messages", description = "Broadcast submission"),
        (name = "System", description = "Status and health"),
    )
)]
pub struct ApiDoc;
