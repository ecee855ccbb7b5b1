use serde::{Deserialize, Serialize};

/// Base instructions sent with every model call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    #[serde(default = "d_instructions")]
    pub instructions: String,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            instructions: d_instructions(),
        }
    }
}

fn d_instructions() -> String {
    "You are a helpful assistant that can create, edit and describe images. \
     Use generate_image when the user asks for a new picture, edit_image to \
     change the most recent picture, and analyze_image to answer questions \
     about it. After using a tool, briefly tell the user what happened."
        .into()
}
