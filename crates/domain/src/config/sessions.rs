use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Conversations
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// How conversation state is keyed and expired.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionsConfig {
    /// Conversation id used when a request does not name one.
    #[serde(default = "d_default_conversation")]
    pub default_conversation: String,

    /// Conversations untouched for this many minutes are dropped by the
    /// background sweeper. `0` keeps them for the life of the process.
    #[serde(default = "d_60")]
    pub idle_ttl_minutes: u64,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            default_conversation: d_default_conversation(),
            idle_ttl_minutes: d_60(),
        }
    }
}

fn d_default_conversation() -> String {
    "default".into()
}
fn d_60() -> u64 {
    60
}
