//! Image tool executor.
//!
//! Runs one [`ImageTool`] against the providers. The outcome is always a
//! [`ToolResult`]; provider errors and timeouts become error text.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use ic_domain::config::Config;
use ic_domain::image::ImageData;
use ic_domain::tool::{Message, ToolCall};
use ic_providers::{ChatRequest, ImageEditRequest, ImageGenerateRequest, ImageProvider, LlmProvider};

use crate::invocation::ImageTool;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Result
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Outcome of a single tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResult {
    /// Text returned to the model as the function call output.
    pub result_text: String,
    /// Image produced by the invocation (generate/edit only).
    pub image: Option<ImageData>,
    pub is_error: bool,
}

impl ToolResult {
    pub fn text(result_text: impl Into<String>) -> Self {
        Self {
            result_text: result_text.into(),
            image: None,
            is_error: false,
        }
    }

    pub fn with_image(result_text: impl Into<String>, image: ImageData) -> Self {
        Self {
            result_text: result_text.into(),
            image: Some(image),
            is_error: false,
        }
    }

    pub fn error(result_text: impl Into<String>) -> Self {
        Self {
            result_text: result_text.into(),
            image: None,
            is_error: true,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Executor
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct ImageToolExecutor {
    llm: Arc<dyn LlmProvider>,
    images: Option<Arc<dyn ImageProvider>>,
    /// Model for `analyze_image`; `None` uses the provider default.
    vision_model: Option<String>,
    image_timeout: Duration,
    vision_timeout: Duration,
}

impl ImageToolExecutor {
    pub fn new(llm: Arc<dyn LlmProvider>, images: Option<Arc<dyn ImageProvider>>) -> Self {
        Self {
            llm,
            images,
            vision_model: None,
            image_timeout: Duration::from_secs(120),
            vision_timeout: Duration::from_secs(60),
        }
    }

    /// Build with models and timeouts taken from `[llm]` and `[images]`.
    pub fn from_config(
        llm: Arc<dyn LlmProvider>,
        images: Option<Arc<dyn ImageProvider>>,
        config: &Config,
    ) -> Self {
        Self::new(llm, images)
            .with_vision_model(config.llm.effective_vision_model())
            .with_timeouts(
                Duration::from_millis(config.images.timeout_ms),
                Duration::from_millis(config.llm.timeout_ms),
            )
    }

    pub fn with_vision_model(mut self, model: impl Into<String>) -> Self {
        self.vision_model = Some(model.into());
        self
    }

    pub fn with_timeouts(mut self, image: Duration, vision: Duration) -> Self {
        self.image_timeout = image;
        self.vision_timeout = vision;
        self
    }

    /// Parse a raw tool call and execute it.
    ///
    /// Unknown names and malformed arguments short-circuit to an error
    /// result without touching any provider.
    pub async fn run(&self, call: &ToolCall, current: Option<&ImageData>) -> ToolResult {
        match ImageTool::parse(&call.tool_name, &call.arguments) {
            Ok(tool) => self.execute(&tool, current).await,
            Err(e) => {
                tracing::warn!(
                    tool = %call.tool_name,
                    call_id = %call.call_id,
                    error = %e,
                    "rejected tool call"
                );
                ToolResult::error(e.to_string())
            }
        }
    }

    /// Execute a parsed invocation against the given current image.
    pub async fn execute(&self, tool: &ImageTool, current: Option<&ImageData>) -> ToolResult {
        tracing::debug!(
            tool = tool.name(),
            has_current_image = current.is_some(),
            "executing image tool"
        );
        match tool {
            ImageTool::Generate { prompt } => self.generate(prompt).await,
            ImageTool::Edit { prompt } => self.edit(prompt, current).await,
            ImageTool::Analyze { question } => self.analyze(question, current).await,
        }
    }

    async fn generate(&self, prompt: &str) -> ToolResult {
        let Some(images) = &self.images else {
            return ToolResult::error("Error generating image: image provider not configured");
        };
        let req = ImageGenerateRequest {
            prompt: prompt.to_string(),
            size: None,
        };
        match bounded(self.image_timeout, images.generate(&req)).await {
            Ok(image) => {
                tracing::debug!(encoded_len = image.encoded_len(), "image generated");
                ToolResult::with_image("Image generated successfully.", image)
            }
            Err(reason) => ToolResult::error(format!("Error generating image: {reason}")),
        }
    }

    async fn edit(&self, prompt: &str, current: Option<&ImageData>) -> ToolResult {
        let Some(source) = current else {
            return ToolResult::error("Error: No image available to edit.");
        };
        let Some(images) = &self.images else {
            return ToolResult::error("Error editing image: image provider not configured");
        };
        let req = ImageEditRequest {
            image: source.clone(),
            prompt: prompt.to_string(),
            size: None,
        };
        match bounded(self.image_timeout, images.edit(&req)).await {
            Ok(image) => {
                tracing::debug!(encoded_len = image.encoded_len(), "image edited");
                ToolResult::with_image("Image edited successfully.", image)
            }
            Err(reason) => ToolResult::error(format!("Error editing image: {reason}")),
        }
    }

    async fn analyze(&self, question: &str, current: Option<&ImageData>) -> ToolResult {
        let Some(image) = current else {
            return ToolResult::error("Error: No image available to analyze.");
        };
        let req = ChatRequest {
            input: vec![Message::user_with_image(question, image.clone())],
            model: self.vision_model.clone(),
            ..Default::default()
        };
        match bounded(self.vision_timeout, self.llm.chat(&req)).await {
            Ok(resp) if resp.content.trim().is_empty() => {
                ToolResult::error("Error analyzing image: model returned no answer")
            }
            Ok(resp) => ToolResult::text(resp.content),
            Err(reason) => ToolResult::error(format!("Error analyzing image: {reason}")),
        }
    }
}

/// Await a provider call with a deadline, flattening both failure kinds
/// into a reason string.
async fn bounded<T, F>(limit: Duration, fut: F) -> Result<T, String>
where
    F: Future<Output = ic_domain::error::Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err(format!("timed out after {}ms", limit.as_millis())),
    }
}
