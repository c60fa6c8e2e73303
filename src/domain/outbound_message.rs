//! Messages queued for broadcast.

use serde::Serialize;
use utoipa::ToSchema;

/// An immutable message fanned out to every live subscriber.
///
/// Serialized once per broadcast pass into the wire frame
/// `{"content": "...", "type": "..."}`; `type` is omitted when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct OutboundMessage {
    content: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
}

impl OutboundMessage {
    /// Creates a message. Callers validate `content` beforehand.
    #[must_use]
    pub fn new(content: impl Into<String>, kind: Option<String>) -> Self {
        Self {
            content: content.into(),
            kind,
        }
    }

    /// Returns the message text.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns the optional type/category tag.
    #[must_use]
    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    /// Encodes the wire frame payload.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if serialization fails.
    pub fn to_wire(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
