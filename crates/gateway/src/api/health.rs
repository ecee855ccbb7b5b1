use axum::extract::State;
use axum::response::{IntoResponse, Json};

use crate::state::AppState;

/// `GET /api/health`: liveness plus whether chat can run and on what.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let llm = state.providers.llm();
    let images = state.providers.images();

    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "providerReady": state.providers.is_ready(),
        "llmProvider": llm.as_ref().map(|p| p.provider_id().to_owned()),
        "model": llm.as_ref().map(|p| p.default_model().to_owned()),
        "imageProvider": images.as_ref().map(|p| p.provider_id().to_owned()),
        "conversations": state.conversations.len(),
        "uptimeSecs": state.started_at.elapsed().as_secs(),
    }))
}
