//! Shapes a finished turn into the payload returned to clients.

use serde::Serialize;

use super::turn::TurnOutcome;

/// `POST /api/chat` success body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub assistant_response: Option<String>,
    pub image_base64: Option<String>,
    pub conversation_id: String,
}

/// Build the client reply.
///
/// The image is only returned when this turn produced one. Blank text maps
/// to `null` so clients can tell "no text" from "empty string".
pub fn assemble(outcome: TurnOutcome) -> ChatReply {
    let text = if outcome.text.trim().is_empty() {
        None
    } else {
        Some(outcome.text)
    };

    ChatReply {
        assistant_response: text,
        image_base64: outcome.image.map(|img| img.into_base64()),
        conversation_id: outcome.conversation_id,
    }
}
