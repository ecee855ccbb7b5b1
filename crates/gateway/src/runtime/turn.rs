//! Turn orchestration: one user message in, text plus optional image out.
//!
//! ```text
//! Init ─► FirstCall ─┬─ no tools ───────────────────────────► Assemble
//!                    └─ tools ─► Executing ─► SecondCall ───► Assemble
//! ```
//!
//! The turn works on its own copy of the conversation state and writes it
//! back exactly once: committed after a successful turn, cleared after a
//! failed model call.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::Instrument;

use ic_domain::error::Error;
use ic_domain::image::ImageData;
use ic_domain::tool::{Message, ToolDefinition};
use ic_domain::trace::TraceEvent;
use ic_providers::{ChatRequest, ChatResponse, LlmProvider, ToolChoice};
use ic_tools::ImageToolExecutor;

use crate::state::AppState;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Input / output
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone)]
pub struct TurnInput {
    pub conversation_id: String,
    pub message: String,
}

/// Result of a completed turn, before it is shaped for the client.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub conversation_id: String,
    /// Text of the final model call (may be empty).
    pub text: String,
    /// Image produced during this turn, if any. A prior image that was
    /// merely carried over is not included.
    pub image: Option<ImageData>,
    /// Continuation id now stored for the conversation.
    pub turn_id: String,
    pub tool_calls: usize,
}

/// Which model call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnStage {
    FirstCall,
    SecondCall,
}

impl std::fmt::Display for TurnStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FirstCall => write!(f, "first call"),
            Self::SecondCall => write!(f, "second call"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    #[error("message must not be empty")]
    EmptyMessage,

    #[error("no model provider is available")]
    NoProvider,

    #[error("model {stage} failed: {source}")]
    Model {
        stage: TurnStage,
        #[source]
        source: Error,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Entry point
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Run one turn for a conversation.
///
/// The caller is expected to hold the conversation's run lock (see
/// [`super::session_lock::SessionLockMap`]) for the duration of the call.
pub async fn run_turn(state: &AppState, input: TurnInput) -> Result<TurnOutcome, TurnError> {
    if input.message.trim().is_empty() {
        return Err(TurnError::EmptyMessage);
    }
    let llm = state.providers.llm().ok_or(TurnError::NoProvider)?;

    let turn_span = tracing::info_span!(
        "turn",
        conversation_id = %input.conversation_id,
        "otel.kind" = "SERVER",
    );

    async {
        tracing::debug!("turn started");
        let started = Instant::now();
        let result = run_turn_inner(state, llm, &input.conversation_id, &input.message).await;

        match &result {
            Ok(outcome) => tracing::info!(
                tool_calls = outcome.tool_calls,
                produced_image = outcome.image.is_some(),
                duration_ms = started.elapsed().as_millis() as u64,
                "turn completed"
            ),
            Err(e) => {
                tracing::warn!(error = %e, "turn failed, resetting conversation");
                state
                    .conversations
                    .reset(&input.conversation_id, "model call failed");
            }
        }
        result
    }
    .instrument(turn_span)
    .await
}

async fn run_turn_inner(
    state: &AppState,
    llm: Arc<dyn LlmProvider>,
    conversation_id: &str,
    message: &str,
) -> Result<TurnOutcome, TurnError> {
    let config = &state.config;
    let snapshot = state.conversations.snapshot(conversation_id);
    let tools = ic_tools::definitions();
    let llm_timeout = Duration::from_millis(config.llm.timeout_ms);

    // ── FirstCall ────────────────────────────────────────────────────
    let first_req = model_request(
        state,
        vec![Message::user(message)],
        &tools,
        snapshot.last_turn_id.clone(),
        ToolChoice::Auto,
    );
    let first = call_model(llm.as_ref(), &first_req, llm_timeout, TurnStage::FirstCall).await?;

    if first.tool_calls.is_empty() {
        state
            .conversations
            .commit(conversation_id, first.response_id.clone(), snapshot.last_image);
        return Ok(TurnOutcome {
            conversation_id: conversation_id.to_owned(),
            text: first.content,
            image: None,
            turn_id: first.response_id,
            tool_calls: 0,
        });
    }

    // ── Executing ────────────────────────────────────────────────────
    let executor = ImageToolExecutor::from_config(llm.clone(), state.providers.images(), config);
    let mut current_image = snapshot.last_image;
    let mut produced_image: Option<ImageData> = None;
    let mut calls = Vec::with_capacity(first.tool_calls.len());
    let mut outputs = Vec::with_capacity(first.tool_calls.len());

    for call in &first.tool_calls {
        let tool_span = tracing::info_span!(
            "tool.call",
            tool_name = %call.tool_name,
            call_id = %call.call_id,
        );
        let started = Instant::now();
        let result = executor
            .run(call, current_image.as_ref())
            .instrument(tool_span)
            .await;

        TraceEvent::ToolExecuted {
            conversation_id: conversation_id.to_owned(),
            tool_name: call.tool_name.clone(),
            call_id: call.call_id.clone(),
            is_error: result.is_error,
            produced_image: result.image.is_some(),
            duration_ms: started.elapsed().as_millis() as u64,
        }
        .emit();

        if let Some(image) = result.image {
            current_image = Some(image.clone());
            produced_image = Some(image);
        }
        calls.push(Message::tool_use(call));
        outputs.push(Message::tool_result(
            call.call_id.clone(),
            result.result_text,
            result.is_error,
        ));
    }

    // ── SecondCall ───────────────────────────────────────────────────
    // Chained from the turn-start continuation id: the first call's own id
    // would already contain these function calls.
    let mut input = Vec::with_capacity(1 + calls.len() + outputs.len());
    input.push(Message::user(message));
    input.extend(calls);
    input.extend(outputs);

    // Tools stay listed so the model can read the calls above, but it must
    // answer in text: an unanswered call would poison the continuation id.
    let second_req = model_request(
        state,
        input,
        &tools,
        snapshot.last_turn_id,
        ToolChoice::Disabled,
    );
    let second = call_model(llm.as_ref(), &second_req, llm_timeout, TurnStage::SecondCall).await?;
    if !second.tool_calls.is_empty() {
        return Err(TurnError::Model {
            stage: TurnStage::SecondCall,
            source: Error::Provider {
                provider: llm.provider_id().to_owned(),
                message: format!(
                    "model requested {} tool call(s) after tool use was disabled",
                    second.tool_calls.len()
                ),
            },
        });
    }

    state
        .conversations
        .commit(conversation_id, second.response_id.clone(), current_image);

    Ok(TurnOutcome {
        conversation_id: conversation_id.to_owned(),
        text: second.content,
        image: produced_image,
        turn_id: second.response_id,
        tool_calls: first.tool_calls.len(),
    })
}

fn model_request(
    state: &AppState,
    input: Vec<Message>,
    tools: &[ToolDefinition],
    previous_response_id: Option<String>,
    tool_choice: ToolChoice,
) -> ChatRequest {
    ChatRequest {
        input,
        tools: tools.to_vec(),
        instructions: Some(state.config.assistant.instructions.clone()),
        previous_response_id,
        max_output_tokens: state.config.llm.max_output_tokens,
        model: None,
        tool_choice: Some(tool_choice),
    }
}

async fn call_model(
    llm: &dyn LlmProvider,
    req: &ChatRequest,
    limit: Duration,
    stage: TurnStage,
) -> Result<ChatResponse, TurnError> {
    let llm_call_span = tracing::info_span!(
        "llm.call",
        "otel.kind" = "CLIENT",
        stage = %stage,
        input_items = req.input.len(),
    );

    let result = match tokio::time::timeout(limit, llm.chat(req))
        .instrument(llm_call_span)
        .await
    {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout(format!(
            "model call exceeded {}ms",
            limit.as_millis()
        ))),
    };
    result.map_err(|source| TurnError::Model { stage, source })
}
