//! `POST /api/chat`: run one turn and return text plus an optional image.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;

use crate::runtime::session_lock::SessionBusy;
use crate::runtime::{assemble, run_turn, TurnError, TurnInput};
use crate::state::AppState;

/// Longest accepted client-supplied conversation id.
const MAX_CONVERSATION_ID_LEN: usize = 128;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Request shape
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatBody {
    /// User message text.
    #[serde(default)]
    pub message: Option<String>,
    /// Conversation to continue. Absent = the configured default.
    #[serde(default)]
    pub conversation_id: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Handler
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn chat(
    State(state): State<AppState>,
    body: Result<Json<ChatBody>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "invalid chat body");
            return bad_request("Request body must be JSON with a 'message' field");
        }
    };

    let message = match body.message {
        Some(m) if !m.trim().is_empty() => m,
        _ => return bad_request("Message is required"),
    };

    if let Some(id) = body.conversation_id.as_deref() {
        if !valid_conversation_id(id) {
            return bad_request(
                "conversationId must be 1-128 characters of letters, digits, '-' or '_'",
            );
        }
    }

    // Pre-flight: reject early with 503 if no model provider is available.
    if let Err(resp) = require_llm_provider(&state) {
        return resp.into_response();
    }

    let conversation_id = state.conversation_id(body.conversation_id.as_deref());

    let _permit = match state.session_locks.acquire(&conversation_id).await {
        Ok(p) => p,
        Err(SessionBusy) => {
            return (
                StatusCode::TOO_MANY_REQUESTS,
                Json(serde_json::json!({ "error": SessionBusy.to_string() })),
            )
                .into_response();
        }
    };

    let input = TurnInput {
        conversation_id,
        message,
    };

    match run_turn(&state, input).await {
        Ok(outcome) => Json(assemble(outcome)).into_response(),
        Err(TurnError::EmptyMessage) => bad_request("Message is required"),
        Err(TurnError::NoProvider) => match require_llm_provider(&state) {
            Err(resp) => resp.into_response(),
            Ok(()) => StatusCode::SERVICE_UNAVAILABLE.into_response(),
        },
        Err(e @ TurnError::Model { .. }) => {
            tracing::error!(error = %e, "chat turn failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "error": "Failed to process chat message",
                    "details": e.to_string(),
                })),
            )
                .into_response()
        }
    }
}

fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "error": message })),
    )
        .into_response()
}

pub(crate) fn valid_conversation_id(id: &str) -> bool {
    let id = id.trim();
    // Blank falls back to the default conversation.
    id.is_empty()
        || (id.len() <= MAX_CONVERSATION_ID_LEN
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'))
}

fn require_llm_provider(state: &AppState) -> Result<(), (StatusCode, Json<serde_json::Value>)> {
    if state.providers.is_ready() {
        return Ok(());
    }

    Err((
        StatusCode::SERVICE_UNAVAILABLE,
        Json(serde_json::json!({
            "error": "no_llm_provider",
            "reason": "No model provider is available. Set OPENAI_API_KEY (or \
                       configure [llm.auth] in config.toml) and restart.",
            "init_errors": state.providers.init_errors(),
        })),
    ))
}
