//! OpenAI Responses API adapter.
//!
//! Uses `POST {base_url}/responses`, which supports server-side
//! conversation state through `previous_response_id` and returns a flat
//! `output` list of assistant messages and function calls.

use std::time::{Duration, Instant};

use ic_domain::config::LlmConfig;
use ic_domain::error::{Error, Result};
use ic_domain::tool::{ContentPart, Message, MessageContent, Role, ToolCall, ToolDefinition};
use ic_domain::trace::TraceEvent;
use serde_json::Value;

use crate::traits::{ChatRequest, ChatResponse, LlmProvider, Usage};
use crate::util::{from_reqwest, read_success_body, AuthHeader};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Adapter struct
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct OpenAiResponsesProvider {
    id: String,
    base_url: String,
    auth: AuthHeader,
    default_model: String,
    client: reqwest::Client,
}

impl OpenAiResponsesProvider {
    /// Create a new provider from the `[llm]` config section.
    ///
    /// The API key is resolved eagerly; a missing key is an error here so
    /// the registry can report it at startup.
    pub fn from_config(cfg: &LlmConfig) -> Result<Self> {
        let auth = AuthHeader::from_config(&cfg.auth)?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .build()
            .map_err(from_reqwest)?;

        Ok(Self {
            id: cfg.provider_id.clone(),
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            auth,
            default_model: cfg.model.clone(),
            client,
        })
    }

    fn effective_model(&self, req: &ChatRequest) -> String {
        req.model
            .clone()
            .unwrap_or_else(|| self.default_model.clone())
    }

    fn build_body(&self, req: &ChatRequest) -> Value {
        let input: Vec<Value> = req.input.iter().flat_map(msg_to_input_items).collect();

        let mut body = serde_json::json!({
            "model": self.effective_model(req),
            "input": input,
        });

        if !req.tools.is_empty() {
            let tools: Vec<Value> = req.tools.iter().map(tool_to_openai).collect();
            body["tools"] = Value::Array(tools);
            if let Some(choice) = req.tool_choice {
                body["tool_choice"] = Value::String(choice.as_str().into());
            }
        }
        if let Some(ref instructions) = req.instructions {
            body["instructions"] = Value::String(instructions.clone());
        }
        if let Some(ref prev) = req.previous_response_id {
            body["previous_response_id"] = Value::String(prev.clone());
        }
        if let Some(max) = req.max_output_tokens {
            body["max_output_tokens"] = serde_json::json!(max);
        }
        body
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Input serialization helpers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn role_to_str(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Tool => "tool",
    }
}

/// One internal message can expand to several input items: tool calls and
/// tool outputs are top-level items in this API, not message content.
fn msg_to_input_items(msg: &Message) -> Vec<Value> {
    let parts = match &msg.content {
        MessageContent::Text(text) => {
            return vec![serde_json::json!({
                "role": role_to_str(msg.role),
                "content": text,
            })];
        }
        MessageContent::Parts(parts) => parts,
    };

    let mut items = Vec::new();
    let mut content: Vec<Value> = Vec::new();

    for part in parts {
        match part {
            ContentPart::Text { text } => {
                let kind = if msg.role == Role::Assistant { "output_text" } else { "input_text" };
                content.push(serde_json::json!({ "type": kind, "text": text }));
            }
            ContentPart::Image { image } => {
                content.push(serde_json::json!({
                    "type": "input_image",
                    "image_url": image.data_url(),
                }));
            }
            ContentPart::ToolUse { call_id, name, arguments } => {
                items.push(serde_json::json!({
                    "type": "function_call",
                    "call_id": call_id,
                    "name": name,
                    "arguments": arguments,
                }));
            }
            ContentPart::ToolResult { call_id, content: output, .. } => {
                items.push(serde_json::json!({
                    "type": "function_call_output",
                    "call_id": call_id,
                    "output": output,
                }));
            }
        }
    }

    if !content.is_empty() {
        items.insert(
            0,
            serde_json::json!({
                "role": role_to_str(msg.role),
                "content": content,
            }),
        );
    }
    items
}

fn tool_to_openai(tool: &ToolDefinition) -> Value {
    serde_json::json!({
        "type": "function",
        "name": tool.name,
        "description": tool.description,
        "parameters": tool.parameters,
    })
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Response deserialization helpers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub(crate) fn parse_response(provider: &str, body: &Value) -> Result<ChatResponse> {
    if let Some(status) = body.get("status").and_then(|s| s.as_str()) {
        if status == "failed" {
            let message = body
                .get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .unwrap_or("response failed");
            return Err(Error::Provider {
                provider: provider.to_string(),
                message: message.to_string(),
            });
        }
    }

    let response_id = body
        .get("id")
        .and_then(|v| v.as_str())
        .ok_or_else(|| Error::Provider {
            provider: provider.to_string(),
            message: "no id in response".into(),
        })?
        .to_string();

    let output = body
        .get("output")
        .and_then(|o| o.as_array())
        .ok_or_else(|| Error::Provider {
            provider: provider.to_string(),
            message: "no output in response".into(),
        })?;

    let mut texts: Vec<&str> = Vec::new();
    let mut tool_calls = Vec::new();

    for item in output {
        match item.get("type").and_then(|t| t.as_str()) {
            Some("message") => {
                let parts = item.get("content").and_then(|c| c.as_array());
                for part in parts.into_iter().flatten() {
                    if part.get("type").and_then(|t| t.as_str()) == Some("output_text") {
                        if let Some(text) = part.get("text").and_then(|t| t.as_str()) {
                            texts.push(text);
                        }
                    }
                }
            }
            Some("function_call") => {
                if let Some(call) = parse_function_call(item) {
                    tool_calls.push(call);
                } else {
                    tracing::warn!(provider, item = %item, "skipping function_call without name/call_id");
                }
            }
            // Reasoning summaries and other item kinds carry nothing we use.
            _ => {}
        }
    }

    let model = body
        .get("model")
        .and_then(|v| v.as_str())
        .unwrap_or("unknown")
        .to_string();

    Ok(ChatResponse {
        response_id,
        content: texts.join("\n"),
        tool_calls,
        usage: body.get("usage").and_then(parse_usage),
        model,
    })
}

fn parse_function_call(item: &Value) -> Option<ToolCall> {
    let call_id = item
        .get("call_id")
        .or_else(|| item.get("id"))?
        .as_str()?
        .to_string();
    let tool_name = item.get("name")?.as_str()?.to_string();
    // Arguments stay serialized; some gateways send an object instead of a
    // string, so re-serialize that case.
    let arguments = match item.get("arguments") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };
    Some(ToolCall {
        call_id,
        tool_name,
        arguments,
    })
}

fn parse_usage(v: &Value) -> Option<Usage> {
    let input_tokens = v.get("input_tokens")?.as_u64()? as u32;
    let output_tokens = v.get("output_tokens")?.as_u64()? as u32;
    let total_tokens = v
        .get("total_tokens")
        .and_then(|t| t.as_u64())
        .map(|t| t as u32)
        .unwrap_or(input_tokens + output_tokens);
    Some(Usage {
        input_tokens,
        output_tokens,
        total_tokens,
    })
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Trait implementation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[async_trait::async_trait]
impl LlmProvider for OpenAiResponsesProvider {
    async fn chat(&self, req: &ChatRequest) -> Result<ChatResponse> {
        let url = format!("{}/responses", self.base_url);
        let body = self.build_body(req);
        let model = self.effective_model(req);

        tracing::debug!(
            provider = %self.id,
            url = %url,
            model = %model,
            input_items = req.input.len(),
            continuation = req.previous_response_id.is_some(),
            "responses request"
        );

        let started = Instant::now();
        let resp = self
            .client
            .post(&url)
            .header(&self.auth.name, &self.auth.value)
            .json(&body)
            .send()
            .await
            .map_err(from_reqwest)?;

        let resp_json = read_success_body(&self.id, resp).await?;
        let parsed = parse_response(&self.id, &resp_json)?;

        TraceEvent::LlmRequest {
            provider: self.id.clone(),
            model: parsed.model.clone(),
            stage: if req.tools.is_empty() { "plain".into() } else { "tools".into() },
            duration_ms: started.elapsed().as_millis() as u64,
            tool_calls: parsed.tool_calls.len(),
            input_tokens: parsed.usage.map(|u| u.input_tokens),
            output_tokens: parsed.usage.map(|u| u.output_tokens),
        }
        .emit();

        Ok(parsed)
    }

    fn provider_id(&self) -> &str {
        &self.id
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
