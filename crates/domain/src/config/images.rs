use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Image generation / editing
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Settings for the image endpoints. Base URL and credentials are shared
/// with [`super::LlmConfig`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImagesConfig {
    #[serde(default = "d_model")]
    pub model: String,
    /// Target resolution passed as `size` to generation and edit calls.
    #[serde(default = "d_size")]
    pub size: String,
    /// Upper bound for a single generation or edit call.
    #[serde(default = "d_120000")]
    pub timeout_ms: u64,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            model: d_model(),
            size: d_size(),
            timeout_ms: d_120000(),
        }
    }
}

fn d_model() -> String {
    "gpt-image-1".into()
}
fn d_size() -> String {
    "1024x1024".into()
}
fn d_120000() -> u64 {
    120_000
}
