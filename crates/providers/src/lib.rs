pub mod openai_images;
pub mod openai_responses;
pub mod registry;
pub mod traits;
pub(crate) mod util;

// Re-exports for convenience.
pub use openai_images::OpenAiImageProvider;
pub use openai_responses::OpenAiResponsesProvider;
pub use registry::ProviderRegistry;
pub use traits::{
    ChatRequest, ChatResponse, ImageEditRequest, ImageGenerateRequest, ImageProvider,
    LlmProvider, ToolChoice, Usage,
};
