use serde::Serialize;

/// Structured trace events emitted across all imagechat crates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    LlmRequest {
        provider: String,
        model: String,
        stage: String,
        duration_ms: u64,
        tool_calls: usize,
        input_tokens: Option<u32>,
        output_tokens: Option<u32>,
    },
    ImageRequest {
        provider: String,
        model: String,
        operation: String,
        duration_ms: u64,
    },
    ToolExecuted {
        conversation_id: String,
        tool_name: String,
        call_id: String,
        is_error: bool,
        produced_image: bool,
        duration_ms: u64,
    },
    ConversationCommitted {
        conversation_id: String,
        turn_id: String,
        has_image: bool,
        turns: u64,
    },
    ConversationReset {
        conversation_id: String,
        reason: String,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "ic_event");
    }
}
