//! `imagechat run`: one-shot turn.
//!
//! Sends a single message, prints the reply and exits. Useful for
//! scripting and quick checks of provider credentials.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;

use ic_domain::config::Config;

use crate::bootstrap;
use crate::runtime::{assemble, run_turn, TurnInput};

pub async fn run(
    config: Arc<Config>,
    message: String,
    conversation: Option<String>,
    json_output: bool,
    save_image: Option<PathBuf>,
) -> anyhow::Result<()> {
    // 1. Boot the runtime (no background tasks for a one-shot).
    let state = bootstrap::build_app_state(config)?;

    // 2. Run the turn.
    let input = TurnInput {
        conversation_id: state.conversation_id(conversation.as_deref()),
        message,
    };
    let reply = assemble(run_turn(&state, input).await.context("turn failed")?);

    // 3. Save the image before printing so the JSON/plain output can say so.
    let saved = match (&save_image, &reply.image_base64) {
        (Some(path), Some(b64)) => {
            super::write_image(path, b64)?;
            Some(path)
        }
        _ => None,
    };

    // 4. Print.
    if json_output {
        let json = serde_json::to_string_pretty(&reply).context("serializing reply")?;
        println!("{json}");
        return Ok(());
    }

    if let Some(text) = &reply.assistant_response {
        println!("{text}");
    }
    match (saved, &reply.image_base64) {
        (Some(path), _) => eprintln!("[image saved to {}]", path.display()),
        (None, Some(b64)) => eprintln!(
            "[image returned: {} base64 chars; pass --save-image <path> to write it]",
            b64.len()
        ),
        (None, None) => {}
    }

    Ok(())
}
