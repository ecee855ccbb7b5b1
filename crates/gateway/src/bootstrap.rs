//! AppState construction and background-task spawning extracted from `main.rs`.
//!
//! `serve`, `run` and `chat` share [`build_app_state`] so the CLI commands
//! boot the same runtime without an HTTP listener.

use std::sync::Arc;

use anyhow::Context;
use sha2::{Digest, Sha256};

use ic_domain::config::{Config, ConfigSeverity};
use ic_providers::ProviderRegistry;

use crate::state::AppState;

/// Validate config, initialize the providers and return a fully-wired
/// [`AppState`].
pub fn build_app_state(config: Arc<Config>) -> anyhow::Result<AppState> {
    // ── Config validation ────────────────────────────────────────────
    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            ConfigSeverity::Warning => tracing::warn!("config: {issue}"),
            ConfigSeverity::Error => tracing::error!("config: {issue}"),
        }
    }
    if issues.iter().any(|i| i.severity == ConfigSeverity::Error) {
        anyhow::bail!(
            "config validation failed with {} error(s)",
            issues
                .iter()
                .filter(|i| i.severity == ConfigSeverity::Error)
                .count()
        );
    }

    // ── Providers ────────────────────────────────────────────────────
    let providers =
        ProviderRegistry::from_config(&config).context("initializing model providers")?;
    if providers.is_ready() {
        tracing::info!(
            model = %config.llm.model,
            image_model = %config.images.model,
            "provider registry ready"
        );
    } else {
        tracing::info!("no model provider initialized; configure an API key to enable chat");
    }

    let mut state = AppState::new(config.clone(), providers);

    // ── API token (read once, hash for constant-time comparison) ────
    let env_var = &config.server.api_token_env;
    state.api_token_hash = match std::env::var(env_var).ok().filter(|t| !t.is_empty()) {
        Some(token) => {
            tracing::info!(source = %format!("env:{env_var}"), "API bearer-token auth enabled");
            Some(Sha256::digest(token.as_bytes()).to_vec())
        }
        None => {
            tracing::warn!("API bearer-token auth DISABLED: set the {env_var} env var to enable it");
            None
        }
    };

    Ok(state)
}

/// Spawn the long-running background tasks (idle conversation sweep and
/// lock pruning).
///
/// Call this **after** [`build_app_state`] when running the HTTP server.
/// CLI one-shot commands skip it.
pub fn spawn_background_tasks(state: &AppState) {
    let max_idle = idle_ttl(state.config.sessions.idle_ttl_minutes);
    let conversations = state.conversations.clone();
    let session_locks = state.session_locks.clone();

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(60));
        loop {
            interval.tick().await;
            if let Some(max_idle) = max_idle {
                let pruned = conversations.prune_idle(max_idle, chrono::Utc::now());
                if pruned > 0 {
                    tracing::info!(pruned, "dropped idle conversations");
                }
            }
            session_locks.prune_idle();
            tracing::debug!(
                conversations = conversations.len(),
                locks = session_locks.session_count(),
                "sweep finished"
            );
        }
    });
}

/// Idle TTL as a duration; `None` when pruning is off or the value does
/// not fit (startup validation rejects such values).
fn idle_ttl(minutes: u64) -> Option<chrono::Duration> {
    if minutes == 0 {
        return None;
    }
    i64::try_from(minutes)
        .ok()
        .and_then(chrono::Duration::try_minutes)
}
