//! Conversation state for imagechat.
//!
//! Each conversation id maps to the continuation id of its last resolved
//! model turn and the most recent image. Turns read a snapshot, work on
//! their own copy, and write back once when they finish.

pub mod store;

pub use store::{ConversationState, ConversationStore, ConversationSummary};
