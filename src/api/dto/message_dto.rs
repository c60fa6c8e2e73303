//! Message submission DTOs.

use serde::Deserialize;
use utoipa::ToSchema;

use crate::domain::OutboundMessage;
use crate::error::RelayError;

/// Request body for `POST /api/v1/messages` and `POST /post`.
///
/// The text field is accepted as either `content` or `message`. The same
/// shape is accepted for text frames sent by subscribers over `/ws`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SubmitMessageRequest {
    /// Message text. Must not be empty or whitespace-only.
    #[serde(default, alias = "message")]
    pub content: String,
    /// Optional type/category tag forwarded to subscribers.
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl SubmitMessageRequest {
    /// Validates the request and converts it into a queueable message.
    ///
    /// An empty `type` is treated as absent.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::InvalidRequest`] if the text is missing or
    /// blank.
    pub fn into_message(self) -> Result<OutboundMessage, RelayError> {
        if self.content.trim().is_empty() {
            return Err(RelayError::InvalidRequest(
                "content must not be empty".to_string(),
            ));
        }
        let kind = self.kind.filter(|k| !k.is_empty());
        Ok(OutboundMessage::new(self.content, kind))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<OutboundMessage, RelayError> {
        serde_json::from_str::<SubmitMessageRequest>(json)
            .map_err(|e| RelayError::InvalidRequest(e.to_string()))
            .and_then(SubmitMessageRequest::into_message)
    }

    #[test]
    fn accepts_message_field() {
        let Ok(msg) = parse(r#"{"message":"hi"}"#) else {
            panic!("expected valid message");
        };
        assert_eq!(msg.content(), "hi");
        assert_eq!(msg.kind(), None);
    }

    #[test]
    fn accepts_content_and_type() {
        let Ok(msg) = parse(r#"{"content":"build green","type":"ci"}"#) else {
            panic!("expected valid message");
        };
        assert_eq!(msg.content(), "build green");
        assert_eq!(msg.kind(), Some("ci"));
    }

    #[test]
    fn empty_type_is_dropped() {
        let Ok(msg) = parse(r#"{"content":"x","type":""}"#) else {
            panic!("expected valid message");
        };
        assert_eq!(msg.kind(), None);
    }

    #[test]
    fn rejects_missing_text() {
        assert!(matches!(
            parse(r#"{"type":"info"}"#),
            Err(RelayError::InvalidRequest(_))
        ));
    }

    #[test]
    fn rejects_blank_text() {
        assert!(parse(r#"{"message":"   "}"#).is_err());
        assert!(parse(r#"{"content":""}"#).is_err());
    }

    #[test]
    fn rejects_non_object_and_wrong_types() {
        assert!(parse("[1,2,3]").is_err());
        assert!(parse(r#"{"content":42}"#).is_err());
    }
}
