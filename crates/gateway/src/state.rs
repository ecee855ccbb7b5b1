use std::sync::Arc;
use std::time::Instant;

use ic_domain::config::Config;
use ic_providers::ProviderRegistry;
use ic_sessions::ConversationStore;

use crate::runtime::session_lock::SessionLockMap;

/// Shared application state passed to all API handlers and CLI commands.
#[derive(Clone)]
pub struct AppState {
    // ── Core services ─────────────────────────────────────────────────
    pub config: Arc<Config>,
    pub providers: Arc<ProviderRegistry>,

    // ── Conversations ─────────────────────────────────────────────────
    pub conversations: Arc<ConversationStore>,
    pub session_locks: Arc<SessionLockMap>,

    // ── Security (startup-computed) ───────────────────────────────────
    /// SHA-256 hash of the API bearer token (read once at startup).
    /// `None` = dev mode (no auth enforced).
    pub api_token_hash: Option<Vec<u8>>,

    pub started_at: Instant,
}

impl AppState {
    /// State with empty stores and auth disabled.
    pub fn new(config: Arc<Config>, providers: ProviderRegistry) -> Self {
        Self {
            config,
            providers: Arc::new(providers),
            conversations: Arc::new(ConversationStore::new()),
            session_locks: Arc::new(SessionLockMap::new()),
            api_token_hash: None,
            started_at: Instant::now(),
        }
    }

    /// Resolve the conversation id for a request: the client's id when it
    /// sent a non-blank one, otherwise the configured default.
    pub fn conversation_id(&self, requested: Option<&str>) -> String {
        requested
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_owned)
            .unwrap_or_else(|| self.config.sessions.default_conversation.clone())
    }
}
