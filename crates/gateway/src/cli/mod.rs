pub mod chat;
pub mod config;
pub mod run;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};

use ic_domain::config::Config;
use ic_domain::image::ImageData;

/// imagechat: a chat service whose assistant can create, edit and describe images.
#[derive(Debug, Parser)]
#[command(name = "imagechat", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the HTTP server (default when no subcommand is given).
    Serve,
    /// Send a single message and print the reply.
    Run {
        /// The message to send.
        message: String,
        /// Conversation id (defaults to `sessions.default_conversation`).
        #[arg(long)]
        conversation: Option<String>,
        /// Print the reply as JSON (same shape as `POST /api/chat`).
        #[arg(long)]
        json: bool,
        /// Write a produced image to this path.
        #[arg(long)]
        save_image: Option<PathBuf>,
    },
    /// Interactive chat in the terminal.
    Chat {
        /// Conversation id to start in.
        #[arg(long)]
        conversation: Option<String>,
    },
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Print version information.
    Version,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

// ── Config loading helper ─────────────────────────────────────────────

/// Load the configuration from the path in `IC_CONFIG` (or `config.toml`
/// by default) and apply environment overrides. Returns the parsed
/// [`Config`] and the path that was used.
///
/// A missing file is not an error; defaults apply.
pub fn load_config() -> anyhow::Result<(Config, String)> {
    let config_path = std::env::var("IC_CONFIG").unwrap_or_else(|_| "config.toml".into());

    let mut config = if Path::new(&config_path).exists() {
        let raw = std::fs::read_to_string(&config_path)
            .with_context(|| format!("reading {config_path}"))?;
        toml::from_str(&raw).with_context(|| format!("parsing {config_path}"))?
    } else {
        Config::default()
    };
    config.apply_env_overrides();

    Ok((config, config_path))
}

/// Decode a base64 image and write it to `path`.
pub(crate) fn write_image(path: &Path, image_base64: &str) -> anyhow::Result<()> {
    let bytes = ImageData::from_base64(image_base64)
        .decode()
        .context("decoding image")?;
    std::fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))
}
