//! Typed tool invocations parsed from raw model tool calls.

use serde::Deserialize;

use crate::schema::{ANALYZE_IMAGE, EDIT_IMAGE, GENERATE_IMAGE};

/// A validated tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageTool {
    Generate { prompt: String },
    Edit { prompt: String },
    Analyze { question: String },
}

/// Why a raw tool call could not become an [`ImageTool`].
///
/// The `Display` text is what the model sees as the tool output.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvocationError {
    #[error("Error: unknown tool '{0}'.")]
    UnknownTool(String),

    #[error("Error: invalid arguments for {name}: {reason}")]
    InvalidArguments { name: String, reason: String },
}

#[derive(Deserialize)]
struct PromptArgs {
    prompt: String,
}

#[derive(Deserialize)]
struct QuestionArgs {
    question: String,
}

impl ImageTool {
    /// Parse a tool name plus its serialized JSON arguments.
    ///
    /// Extra keys are ignored. A missing, non-string or blank required
    /// argument is an [`InvocationError::InvalidArguments`].
    pub fn parse(name: &str, arguments: &str) -> Result<Self, InvocationError> {
        match name {
            GENERATE_IMAGE => {
                let args: PromptArgs = decode(name, arguments)?;
                Ok(Self::Generate {
                    prompt: non_blank(name, "prompt", args.prompt)?,
                })
            }
            EDIT_IMAGE => {
                let args: PromptArgs = decode(name, arguments)?;
                Ok(Self::Edit {
                    prompt: non_blank(name, "prompt", args.prompt)?,
                })
            }
            ANALYZE_IMAGE => {
                let args: QuestionArgs = decode(name, arguments)?;
                Ok(Self::Analyze {
                    question: non_blank(name, "question", args.question)?,
                })
            }
            other => Err(InvocationError::UnknownTool(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Generate { .. } => GENERATE_IMAGE,
            Self::Edit { .. } => EDIT_IMAGE,
            Self::Analyze { .. } => ANALYZE_IMAGE,
        }
    }
}

fn decode<T: for<'de> Deserialize<'de>>(name: &str, arguments: &str) -> Result<T, InvocationError> {
    serde_json::from_str(arguments).map_err(|e| InvocationError::InvalidArguments {
        name: name.to_string(),
        reason: e.to_string(),
    })
}

fn non_blank(name: &str, field: &str, value: String) -> Result<String, InvocationError> {
    if value.trim().is_empty() {
        return Err(InvocationError::InvalidArguments {
            name: name.to_string(),
            reason: format!("'{field}' must not be empty"),
        });
    }
    Ok(value)
}
