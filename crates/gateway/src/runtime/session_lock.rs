//! Per-conversation concurrency control.
//!
//! Only one turn runs per conversation at a time. A second request arriving
//! while a turn is in flight waits for it; a third is rejected as busy.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Run slot plus a single queue slot for one conversation.
struct Slot {
    run: Arc<Semaphore>,
    queue: Arc<Semaphore>,
}

impl Slot {
    fn new() -> Self {
        Self {
            run: Arc::new(Semaphore::new(1)),
            queue: Arc::new(Semaphore::new(1)),
        }
    }

    fn is_idle(&self) -> bool {
        self.run.available_permits() == 1 && self.queue.available_permits() == 1
    }
}

/// Manages per-conversation run locks.
///
/// Each conversation id maps to a `Semaphore(1)` run slot. Holding the
/// permit gives exclusive access for one turn; it releases on drop.
pub struct SessionLockMap {
    locks: Mutex<HashMap<String, Slot>>,
}

impl Default for SessionLockMap {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionLockMap {
    pub fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Acquire the run lock for a conversation.
    ///
    /// Returns immediately when the conversation is idle. When a turn is
    /// running, waits for it (queue depth = 1). Returns [`SessionBusy`] if
    /// another request is already waiting.
    pub async fn acquire(&self, conversation_id: &str) -> Result<OwnedSemaphorePermit, SessionBusy> {
        // Permits are taken under the map lock so `prune_idle` never drops a
        // slot between lookup and acquisition.
        let (run, _queued) = {
            let mut locks = self.locks.lock();
            let slot = locks
                .entry(conversation_id.to_owned())
                .or_insert_with(Slot::new);

            if let Ok(permit) = slot.run.clone().try_acquire_owned() {
                return Ok(permit);
            }
            // Hold the queue slot while waiting; dropping the future releases it.
            let queued = slot.queue.clone().try_acquire_owned().map_err(|_| SessionBusy)?;
            (slot.run.clone(), queued)
        };

        run.acquire_owned().await.map_err(|_| SessionBusy)
    }

    /// Number of tracked conversations (for monitoring).
    pub fn session_count(&self) -> usize {
        self.locks.lock().len()
    }

    /// Remove locks for conversations with no running or waiting turn.
    pub fn prune_idle(&self) {
        let mut locks = self.locks.lock();
        locks.retain(|_, slot| !slot.is_idle());
    }
}

/// Error returned when a conversation is busy (turn in progress + one queued).
#[derive(Debug)]
pub struct SessionBusy;

impl std::fmt::Display for SessionBusy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conversation is busy: a turn is already in progress")
    }
}

impl std::error::Error for SessionBusy {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn sequential_access() {
        let map = SessionLockMap::new();

        let permit1 = map.acquire("c1").await.unwrap();
        drop(permit1);

        let permit2 = map.acquire("c1").await.unwrap();
        drop(permit2);
    }

    #[tokio::test]
    async fn different_conversations_concurrent() {
        let map = SessionLockMap::new();

        let p1 = map.acquire("c1").await.unwrap();
        let p2 = map.acquire("c2").await.unwrap();
        assert_eq!(map.session_count(), 2);

        drop(p1);
        drop(p2);
    }

    #[tokio::test]
    async fn same_conversation_waits() {
        let map = Arc::new(SessionLockMap::new());
        let map2 = map.clone();

        let p1 = map.acquire("c1").await.unwrap();

        let handle = tokio::spawn(async move {
            let _p2 = map2.acquire("c1").await.unwrap();
            42
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!handle.is_finished());

        drop(p1);
        assert_eq!(handle.await.unwrap(), 42);
    }

    #[tokio::test]
    async fn third_request_is_rejected() {
        let map = Arc::new(SessionLockMap::new());
        let map2 = map.clone();

        let p1 = map.acquire("c1").await.unwrap();
        let waiter = tokio::spawn(async move { map2.acquire("c1").await.map(|_| ()) });
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(map.acquire("c1").await.is_err());

        drop(p1);
        assert!(waiter.await.unwrap().is_ok());
        // Queue slot is free again.
        assert!(map.acquire("c1").await.is_ok());
    }

    #[tokio::test]
    async fn prune_keeps_slot_with_queued_waiter() {
        let map = Arc::new(SessionLockMap::new());
        let map2 = map.clone();

        let running = map.acquire("c1").await.unwrap();
        let waiter = tokio::spawn(async move { map2.acquire("c1").await.map(|_| ()) });
        tokio::time::sleep(Duration::from_millis(50)).await;

        map.prune_idle();
        assert_eq!(map.session_count(), 1);
        // Still the same slot: the queue is full, so a third request is busy.
        assert!(map.acquire("c1").await.is_err());

        drop(running);
        assert!(waiter.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn prune_keeps_held_locks() {
        let map = SessionLockMap::new();
        let held = map.acquire("busy").await.unwrap();
        drop(map.acquire("idle").await.unwrap());

        map.prune_idle();
        assert_eq!(map.session_count(), 1);
        drop(held);
        map.prune_idle();
        assert_eq!(map.session_count(), 0);
    }
}
