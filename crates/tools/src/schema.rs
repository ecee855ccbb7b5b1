//! Tool definitions sent to the model on every call.

use ic_domain::tool::ToolDefinition;

pub const GENERATE_IMAGE: &str = "generate_image";
pub const EDIT_IMAGE: &str = "edit_image";
pub const ANALYZE_IMAGE: &str = "analyze_image";

/// Build the three image tool definitions.
pub fn definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: GENERATE_IMAGE.into(),
            description: "Generate a new image from a text description. Replaces the \
                          current image."
                .into(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "prompt": { "type": "string", "description": "Description of the image to create" }
                },
                "required": ["prompt"]
            }),
        },
        ToolDefinition {
            name: EDIT_IMAGE.into(),
            description: "Edit the most recent image according to an instruction.".into(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "prompt": { "type": "string", "description": "What to change in the current image" }
                },
                "required": ["prompt"]
            }),
        },
        ToolDefinition {
            name: ANALYZE_IMAGE.into(),
            description: "Answer a question about the most recent image.".into(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "question": { "type": "string", "description": "Question about the current image" }
                },
                "required": ["question"]
            }),
        },
    ]
}
