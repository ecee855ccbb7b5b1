//! Conversation introspection and reset.
//!
//! - `GET  /api/conversations`: list summaries
//! - `GET  /api/conversations/:id`: one summary or 404
//! - `POST /api/conversations/:id/reset`: forget the conversation

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};

use crate::state::AppState;

use super::chat::valid_conversation_id;

/// Path ids must already be in canonical form; there is no default to
/// fall back to.
fn check_path_id(id: &str) -> Result<(), Response> {
    if !id.is_empty() && id.trim() == id && valid_conversation_id(id) {
        return Ok(());
    }
    Err((
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({
            "error": "conversation id must be 1-128 characters of letters, digits, '-' or '_'",
        })),
    )
        .into_response())
}

pub async fn list_conversations(State(state): State<AppState>) -> impl IntoResponse {
    let conversations = state.conversations.list();
    Json(serde_json::json!({
        "count": conversations.len(),
        "conversations": conversations,
    }))
}

pub async fn get_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    if let Err(resp) = check_path_id(&id) {
        return resp;
    }
    match state.conversations.summary(&id) {
        Some(summary) => Json(summary).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "conversation not found" })),
        )
            .into_response(),
    }
}

/// Takes the conversation's run lock first, so a reset issued mid-turn
/// waits for that turn's commit instead of being undone by it.
pub async fn reset_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    if let Err(resp) = check_path_id(&id) {
        return resp;
    }
    let Ok(_permit) = state.session_locks.acquire(&id).await else {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(serde_json::json!({ "error": "conversation is busy" })),
        )
            .into_response();
    };

    let existed = state.conversations.reset(&id, "api reset");
    Json(serde_json::json!({
        "conversationId": id,
        "reset": true,
        "existed": existed,
    }))
    .into_response()
}
