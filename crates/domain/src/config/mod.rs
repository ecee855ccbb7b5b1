mod assistant;
mod images;
mod llm;
mod observability;
mod server;
mod sessions;

pub use assistant::*;
pub use images::*;
pub use llm::*;
pub use observability::*;
pub use server::*;
pub use sessions::*;

use serde::{Deserialize, Serialize};
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub images: ImagesConfig,
    #[serde(default)]
    pub assistant: AssistantConfig,
    #[serde(default)]
    pub sessions: SessionsConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Environment overrides
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

impl Config {
    /// Apply environment overrides on top of the file config.
    ///
    /// | env var            | field                 |
    /// |--------------------|-----------------------|
    /// | `PORT`             | `server.port`         |
    /// | `IC_HOST`          | `server.host`         |
    /// | `OPENAI_BASE_URL`  | `llm.base_url`        |
    /// | `IC_MODEL`         | `llm.model`           |
    /// | `IC_IMAGE_MODEL`   | `images.model`        |
    /// | `IC_INSTRUCTIONS`  | `assistant.instructions` |
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|name| std::env::var(name).ok());
    }

    /// Same as [`Config::apply_env_overrides`] with an injectable lookup.
    /// Empty values are ignored.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(port) = get("PORT") {
            match port.trim().parse::<u16>() {
                Ok(p) => self.server.port = p,
                Err(_) => tracing::warn!(value = %port, "ignoring invalid PORT"),
            }
        }
        if let Some(host) = get("IC_HOST") {
            self.server.host = host;
        }
        if let Some(url) = get("OPENAI_BASE_URL") {
            self.llm.base_url = url;
        }
        if let Some(model) = get("IC_MODEL") {
            self.llm.model = model;
        }
        if let Some(model) = get("IC_IMAGE_MODEL") {
            self.images.model = model;
        }
        if let Some(instructions) = get("IC_INSTRUCTIONS") {
            self.assistant.instructions = instructions;
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl Config {
    /// Validate the configuration and return a list of issues.
    ///
    /// Returns an empty vec when everything looks good.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let mut error = |field: &str, message: &str| {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: field.into(),
                message: message.into(),
            })
        };

        if self.server.port == 0 {
            error("server.port", "port must be greater than 0");
        }
        if self.server.host.is_empty() {
            error("server.host", "host must not be empty");
        }
        if self.llm.base_url.is_empty() {
            error("llm.base_url", "base_url must not be empty");
        }
        if self.llm.model.is_empty() {
            error("llm.model", "model must not be empty");
        }
        if self.llm.timeout_ms == 0 {
            error("llm.timeout_ms", "timeout must be greater than 0");
        }
        if self.images.model.is_empty() {
            error("images.model", "model must not be empty");
        }
        if self.images.timeout_ms == 0 {
            error("images.timeout_ms", "timeout must be greater than 0");
        }
        if !is_valid_size(&self.images.size) {
            error("images.size", "size must look like <width>x<height> or \"auto\"");
        }
        if self.sessions.idle_ttl_minutes > MAX_IDLE_TTL_MINUTES {
            error(
                "sessions.idle_ttl_minutes",
                "idle TTL must be at most 525600 minutes (one year); use 0 to keep conversations forever",
            );
        }
        if self.sessions.default_conversation.trim().is_empty() {
            error("sessions.default_conversation", "default conversation id must not be empty");
        }
        if !(0.0..=1.0).contains(&self.observability.sample_rate) {
            error("observability.sample_rate", "sample_rate must be within 0.0..=1.0");
        }

        if let Some(rl) = &self.server.rate_limit {
            if rl.requests_per_second == 0 || rl.burst_size == 0 {
                error(
                    "server.rate_limit",
                    "requests_per_second and burst_size must be > 0",
                );
            }
        }

        if self.assistant.instructions.trim().is_empty() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "assistant.instructions".into(),
                message: "no base instructions; the model will not know about its image tools".into(),
            });
        }

        // CORS: warn if wildcard is used.
        if self.server.cors.allowed_origins.len() == 1
            && self.server.cors.allowed_origins[0] == "*"
        {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "server.cors.allowed_origins".into(),
                message: "wildcard \"*\" allows all origins (not recommended for production)".into(),
            });
        }

        errors
    }
}

/// Longest accepted `sessions.idle_ttl_minutes` (one year).
pub const MAX_IDLE_TTL_MINUTES: u64 = 60 * 24 * 365;

fn is_valid_size(size: &str) -> bool {
    if size == "auto" {
        return true;
    }
    match size.split_once('x') {
        Some((w, h)) => w.parse::<u32>().map_or(false, |w| w > 0) && h.parse::<u32>().map_or(false, |h| h > 0),
        None => false,
    }
}
