//! In-memory conversation store.
//!
//! Holds one [`ConversationState`] per conversation id. Nothing is persisted;
//! state lives for the life of the process or until the idle sweeper drops it.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use serde::Serialize;

use ic_domain::image::ImageData;
use ic_domain::trace::TraceEvent;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Conversation state
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// State carried between turns of one conversation.
#[derive(Debug, Clone)]
pub struct ConversationState {
    /// Continuation id of the last fully resolved model turn.
    pub last_turn_id: Option<String>,
    /// The most recently produced image, if any.
    pub last_image: Option<ImageData>,
    pub updated_at: DateTime<Utc>,
    /// Number of committed turns.
    pub turns: u64,
}

impl Default for ConversationState {
    fn default() -> Self {
        Self {
            last_turn_id: None,
            last_image: None,
            updated_at: Utc::now(),
            turns: 0,
        }
    }
}

/// Client-facing view of a conversation (no image payload).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub conversation_id: String,
    pub last_turn_id: Option<String>,
    pub has_image: bool,
    pub turns: u64,
    pub updated_at: DateTime<Utc>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Store
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Default)]
pub struct ConversationStore {
    conversations: RwLock<HashMap<String, ConversationState>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a conversation by id.
    pub fn get(&self, conversation_id: &str) -> Option<ConversationState> {
        self.conversations.read().get(conversation_id).cloned()
    }

    /// The state a new turn starts from. Unknown ids start empty.
    pub fn snapshot(&self, conversation_id: &str) -> ConversationState {
        self.get(conversation_id).unwrap_or_default()
    }

    /// Record a completed turn.
    ///
    /// `current_image` is the turn's final image: the previous one if no
    /// tool replaced it, otherwise the newest.
    pub fn commit(
        &self,
        conversation_id: &str,
        turn_id: String,
        current_image: Option<ImageData>,
    ) -> ConversationState {
        let mut conversations = self.conversations.write();
        let entry = conversations
            .entry(conversation_id.to_owned())
            .or_default();

        entry.last_turn_id = Some(turn_id.clone());
        entry.last_image = current_image;
        entry.updated_at = Utc::now();
        entry.turns += 1;

        TraceEvent::ConversationCommitted {
            conversation_id: conversation_id.to_owned(),
            turn_id,
            has_image: entry.last_image.is_some(),
            turns: entry.turns,
        }
        .emit();

        entry.clone()
    }

    /// Drop all state for a conversation. Returns whether it existed.
    pub fn reset(&self, conversation_id: &str, reason: &str) -> bool {
        let existed = self.conversations.write().remove(conversation_id).is_some();

        TraceEvent::ConversationReset {
            conversation_id: conversation_id.to_owned(),
            reason: reason.to_owned(),
        }
        .emit();

        existed
    }

    pub fn summary(&self, conversation_id: &str) -> Option<ConversationSummary> {
        let conversations = self.conversations.read();
        conversations
            .get(conversation_id)
            .map(|state| summarize(conversation_id, state))
    }

    /// List all conversations, most recently updated first.
    pub fn list(&self) -> Vec<ConversationSummary> {
        let conversations = self.conversations.read();
        let mut out: Vec<ConversationSummary> = conversations
            .iter()
            .map(|(id, state)| summarize(id, state))
            .collect();
        out.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        out
    }

    /// Remove conversations untouched for longer than `max_idle`.
    /// Returns how many were dropped.
    pub fn prune_idle(&self, max_idle: Duration, now: DateTime<Utc>) -> usize {
        let mut conversations = self.conversations.write();
        let before = conversations.len();
        conversations.retain(|_, state| now.signed_duration_since(state.updated_at) <= max_idle);
        let pruned = before - conversations.len();
        if pruned > 0 {
            tracing::debug!(pruned, remaining = conversations.len(), "pruned idle conversations");
        }
        pruned
    }

    pub fn len(&self) -> usize {
        self.conversations.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.read().is_empty()
    }
}

fn summarize(conversation_id: &str, state: &ConversationState) -> ConversationSummary {
    ConversationSummary {
        conversation_id: conversation_id.to_owned(),
        last_turn_id: state.last_turn_id.clone(),
        has_image: state.last_image.is_some(),
        turns: state.turns,
        updated_at: state.updated_at,
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
