use ic_domain::error::Result;
use ic_domain::image::ImageData;
use ic_domain::tool::{Message, ToolCall, ToolDefinition};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Chat request / response types
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A provider-agnostic model request.
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    /// Input items for this call (user text, tool calls, tool results).
    pub input: Vec<Message>,
    /// Tool definitions the model may invoke.
    pub tools: Vec<ToolDefinition>,
    /// System-level instructions. Not carried over by continuation ids, so
    /// they are sent on every call.
    pub instructions: Option<String>,
    /// Continuation id of an earlier response whose context this call
    /// resumes.
    pub previous_response_id: Option<String>,
    /// Maximum tokens in the response. `None` lets the provider choose.
    pub max_output_tokens: Option<u32>,
    /// Model identifier override. When `None`, the provider uses its default.
    pub model: Option<String>,
    /// Whether the model may call the offered tools. `None` leaves it to
    /// the provider (tools allowed).
    pub tool_choice: Option<ToolChoice>,
}

/// Tool-use policy for one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolChoice {
    /// The model decides.
    Auto,
    /// Tools stay visible for context but must not be called.
    Disabled,
}

impl ToolChoice {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Disabled => "none",
        }
    }
}

/// A provider-agnostic model response.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    /// Opaque id of this response, usable as a continuation id.
    pub response_id: String,
    /// Concatenated assistant text (empty when the model only called tools).
    pub content: String,
    /// Tool calls in the order the model emitted them.
    pub tool_calls: Vec<ToolCall>,
    pub usage: Option<Usage>,
    /// The model that actually produced the response.
    pub model: String,
}

/// Token usage for a single call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub total_tokens: u32,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Image request types
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Create a new image from a text prompt.
#[derive(Debug, Clone)]
pub struct ImageGenerateRequest {
    pub prompt: String,
    /// Target resolution, e.g. `1024x1024`. `None` uses the configured size.
    pub size: Option<String>,
}

/// Modify an existing image according to an instruction.
#[derive(Debug, Clone)]
pub struct ImageEditRequest {
    pub image: ImageData,
    pub prompt: String,
    pub size: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Provider traits
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Conversational model adapter.
///
/// Implementations translate between the internal request types and the
/// vendor's wire format. Vision questions go through the same call with
/// an image part in the user message.
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send a request and wait for the full response.
    async fn chat(&self, req: &ChatRequest) -> Result<ChatResponse>;

    /// A unique identifier for this provider instance.
    fn provider_id(&self) -> &str;

    /// The model used when a request does not override it.
    fn default_model(&self) -> &str;
}

/// Image generation and editing adapter.
#[async_trait::async_trait]
pub trait ImageProvider: Send + Sync {
    async fn generate(&self, req: &ImageGenerateRequest) -> Result<ImageData>;

    async fn edit(&self, req: &ImageEditRequest) -> Result<ImageData>;

    fn provider_id(&self) -> &str;
}
