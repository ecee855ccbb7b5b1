//! Scripted providers shared by the gateway integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use ic_domain::config::Config;
use ic_domain::error::{Error, Result};
use ic_domain::image::ImageData;
use ic_domain::tool::{ContentPart, Message, MessageContent, Role, ToolCall};
use ic_gateway::state::AppState;
use ic_providers::{
    ChatRequest, ChatResponse, ImageEditRequest, ImageGenerateRequest, ImageProvider, LlmProvider,
    ProviderRegistry,
};
use parking_lot::Mutex;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Model
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Conversational model that replays a fixed script.
///
/// Requests without tools are vision questions from `analyze_image`; they
/// are answered with `vision_answer` and recorded separately so the script
/// only covers the orchestrator's own calls.
pub struct ScriptedLlm {
    script: Mutex<VecDeque<Result<ChatResponse>>>,
    pub requests: Mutex<Vec<ChatRequest>>,
    pub vision_requests: Mutex<Vec<ChatRequest>>,
    pub vision_answer: String,
    pub delay: Option<Duration>,
}

impl ScriptedLlm {
    pub fn new(script: Vec<Result<ChatResponse>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
            vision_requests: Mutex::new(Vec::new()),
            vision_answer: "A small orange cat.".into(),
            delay: None,
        }
    }

    pub fn push(&self, response: Result<ChatResponse>) {
        self.script.lock().push_back(response);
    }

    pub fn request(&self, index: usize) -> ChatRequest {
        self.requests.lock()[index].clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait::async_trait]
impl LlmProvider for ScriptedLlm {
    async fn chat(&self, req: &ChatRequest) -> Result<ChatResponse> {
        if let Some(d) = self.delay {
            tokio::time::sleep(d).await;
        }
        if req.tools.is_empty() {
            self.vision_requests.lock().push(req.clone());
            return Ok(text("resp_vision", &self.vision_answer));
        }
        self.requests.lock().push(req.clone());
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(Error::Other("script exhausted".into())))
    }

    fn provider_id(&self) -> &str {
        "scripted"
    }

    fn default_model(&self) -> &str {
        "scripted-model"
    }
}

pub fn text(response_id: &str, content: &str) -> ChatResponse {
    ChatResponse {
        response_id: response_id.into(),
        content: content.into(),
        tool_calls: Vec::new(),
        usage: None,
        model: "scripted-model".into(),
    }
}

/// A response that only requests tools: `(call_id, name, arguments)`.
pub fn tools(response_id: &str, calls: &[(&str, &str, &str)]) -> ChatResponse {
    ChatResponse {
        response_id: response_id.into(),
        content: String::new(),
        tool_calls: calls
            .iter()
            .map(|(call_id, name, args)| ToolCall {
                call_id: (*call_id).into(),
                tool_name: (*name).into(),
                arguments: (*args).into(),
            })
            .collect(),
        usage: None,
        model: "scripted-model".into(),
    }
}

pub fn provider_error(message: &str) -> Error {
    Error::Provider {
        provider: "scripted".into(),
        message: message.into(),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Images
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Default)]
pub struct MockImages {
    pub fail: bool,
    pub generated: Mutex<Vec<String>>,
    pub edited: Mutex<Vec<(ImageData, String)>>,
}

#[async_trait::async_trait]
impl ImageProvider for MockImages {
    async fn generate(&self, req: &ImageGenerateRequest) -> Result<ImageData> {
        let n = {
            let mut generated = self.generated.lock();
            generated.push(req.prompt.clone());
            generated.len()
        };
        if self.fail {
            return Err(provider_error("content policy violation"));
        }
        Ok(nth_generated_image(n, &req.prompt))
    }

    async fn edit(&self, req: &ImageEditRequest) -> Result<ImageData> {
        self.edited.lock().push((req.image.clone(), req.prompt.clone()));
        if self.fail {
            return Err(provider_error("content policy violation"));
        }
        Ok(edited_image(&req.prompt))
    }

    fn provider_id(&self) -> &str {
        "mock-images"
    }
}

/// The first image a fresh [`MockImages`] generates for `prompt`.
pub fn generated_image(prompt: &str) -> ImageData {
    nth_generated_image(1, prompt)
}

/// Every generate call yields a distinct image, even for the same prompt.
pub fn nth_generated_image(n: usize, prompt: &str) -> ImageData {
    ImageData::from_bytes(format!("gen#{n}:{prompt}").as_bytes())
}

pub fn edited_image(prompt: &str) -> ImageData {
    ImageData::from_bytes(format!("edit:{prompt}").as_bytes())
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Harness
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub fn app_state(llm: &Arc<ScriptedLlm>, images: &Arc<MockImages>) -> AppState {
    app_state_with(Config::default(), llm, images)
}

pub fn app_state_with(config: Config, llm: &Arc<ScriptedLlm>, images: &Arc<MockImages>) -> AppState {
    let llm: Arc<dyn LlmProvider> = llm.clone();
    let images: Arc<dyn ImageProvider> = images.clone();
    AppState::new(
        Arc::new(config),
        ProviderRegistry::from_parts(Some(llm), Some(images)),
    )
}

/// `(call_id, output, is_error)` for every function call output in a request.
pub fn tool_outputs(req: &ChatRequest) -> Vec<(String, String, bool)> {
    req.input
        .iter()
        .filter(|m| m.role == Role::Tool)
        .flat_map(|m| parts(m))
        .filter_map(|p| match p {
            ContentPart::ToolResult {
                call_id,
                content,
                is_error,
            } => Some((call_id, content, is_error)),
            _ => None,
        })
        .collect()
}

/// First text of a message, whether plain or in parts.
pub fn message_text(message: &Message) -> Option<String> {
    match &message.content {
        MessageContent::Text(text) => Some(text.clone()),
        MessageContent::Parts(parts) => parts.iter().find_map(|p| match p {
            ContentPart::Text { text } => Some(text.clone()),
            _ => None,
        }),
    }
}

/// The image attached to a vision request, if any.
pub fn attached_image(req: &ChatRequest) -> Option<ImageData> {
    req.input.iter().flat_map(|m| parts(m)).find_map(|p| match p {
        ContentPart::Image { image } => Some(image),
        _ => None,
    })
}

fn parts(message: &Message) -> Vec<ContentPart> {
    match &message.content {
        MessageContent::Parts(parts) => parts.clone(),
        MessageContent::Text(_) => Vec::new(),
    }
}
