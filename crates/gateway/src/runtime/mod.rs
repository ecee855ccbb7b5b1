//! Core runtime: the turn orchestrator, reply assembly and per-conversation
//! locking.
//!
//! Entry point: [`run_turn`] takes a conversation id plus a user message and
//! returns a [`TurnOutcome`], which [`assemble`] turns into a [`ChatReply`].

pub mod assemble;
pub mod session_lock;
pub mod turn;

pub use assemble::{assemble, ChatReply};
pub use session_lock::{SessionBusy, SessionLockMap};
pub use turn::{run_turn, TurnError, TurnInput, TurnOutcome, TurnStage};
