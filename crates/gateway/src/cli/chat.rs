//! `imagechat chat`: interactive REPL.
//!
//! Each line is one turn. Replies are printed to stdout; images are kept in
//! the conversation and can be written out with `/save`.

use std::path::Path;
use std::sync::Arc;

use ic_domain::config::Config;

use crate::bootstrap;
use crate::runtime::{assemble, run_turn, TurnInput};
use crate::state::AppState;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Public entry point
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn chat(config: Arc<Config>, conversation: Option<String>) -> anyhow::Result<()> {
    // 1. Boot the runtime.
    let state = bootstrap::build_app_state(config)?;
    let mut conversation_id = state.conversation_id(conversation.as_deref());

    // 2. Initialize rustyline editor with persistent history.
    let history_path = dirs::home_dir()
        .unwrap_or_default()
        .join(".imagechat")
        .join("chat_history.txt");
    if let Some(parent) = history_path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let mut rl = rustyline::DefaultEditor::new()?;
    let _ = rl.load_history(&history_path);

    // 3. Welcome message on stderr (keep stdout clean for replies).
    eprintln!("imagechat interactive chat");
    eprintln!("Conversation: {conversation_id}  |  Type /help for commands, Ctrl+D to exit");
    eprintln!();

    // 4. REPL loop.
    loop {
        match rl.readline("you> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                rl.add_history_entry(&line).ok();

                if trimmed.starts_with('/') {
                    if handle_slash_command(&state, trimmed, &mut conversation_id) {
                        break;
                    }
                    continue;
                }

                if let Err(e) = send_message(&state, &conversation_id, trimmed).await {
                    eprintln!("\x1B[31merror: {e}\x1B[0m");
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                eprintln!("(Use Ctrl+D or /exit to quit)");
            }
            Err(rustyline::error::ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("\x1B[31mreadline error: {e}\x1B[0m");
                break;
            }
        }
    }

    rl.save_history(&history_path).ok();
    eprintln!("Goodbye!");
    Ok(())
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Slash command handling
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Process a slash command. Returns `true` if the REPL should exit.
fn handle_slash_command(state: &AppState, input: &str, conversation_id: &mut String) -> bool {
    let (cmd, arg) = match input.split_once(' ') {
        Some((cmd, arg)) => (cmd, Some(arg.trim()).filter(|a| !a.is_empty())),
        None => (input, None),
    };

    match cmd {
        "/exit" | "/quit" => return true,

        "/reset" => {
            state.conversations.reset(conversation_id, "cli reset");
            eprintln!("Conversation '{conversation_id}' cleared.");
        }

        "/save" => match arg {
            Some(path) => save_current_image(state, conversation_id, Path::new(path)),
            None => eprintln!("Usage: /save <path>"),
        },

        "/conversation" => match arg {
            Some(id) => {
                *conversation_id = id.to_string();
                eprintln!("Switched to conversation: {conversation_id}");
            }
            None => eprintln!("Current conversation: {conversation_id}"),
        },

        "/help" => {
            eprintln!("Commands:");
            eprintln!("  /save <path>         Write the current image to a file");
            eprintln!("  /reset               Forget this conversation (image and context)");
            eprintln!("  /conversation <id>   Switch to another conversation");
            eprintln!("  /exit, /quit         Exit the chat");
            eprintln!("  /help                Show this help");
        }

        other => eprintln!("Unknown command: {other}  (type /help for a list)"),
    }

    false
}

fn save_current_image(state: &AppState, conversation_id: &str, path: &Path) {
    let Some(image) = state.conversations.snapshot(conversation_id).last_image else {
        eprintln!("No image in this conversation yet.");
        return;
    };
    match super::write_image(path, image.as_base64()) {
        Ok(()) => eprintln!("Image saved to {}", path.display()),
        Err(e) => eprintln!("\x1B[31merror: {e:#}\x1B[0m"),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Message sending
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

async fn send_message(state: &AppState, conversation_id: &str, message: &str) -> anyhow::Result<()> {
    let input = TurnInput {
        conversation_id: conversation_id.to_string(),
        message: message.to_string(),
    };
    let reply = assemble(run_turn(state, input).await?);

    if let Some(text) = &reply.assistant_response {
        println!("{text}");
    }
    if reply.image_base64.is_some() {
        eprintln!("\x1B[2m[new image; /save <path> to write it]\x1B[0m");
    }
    println!();
    Ok(())
}
