//! Per-session advisory locks.
//!
//! Requests for different sessions never contend. Requests for the same
//! session take turns, either only while persisting their turns or for the
//! whole pipeline run.

use docweave_core::conversation::SessionId;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// How much of a request runs under its session lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SerializeMode {
    /// Only the two log appends. History may be read before a racing
    /// request has persisted.
    #[default]
    PersistOnly,
    /// History load through persistence. Turns land in causal order.
    WholePipeline,
}

#[derive(Debug, Default)]
pub struct SessionLocks {
    locks: Mutex<HashMap<SessionId, Arc<Mutex<()>>>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `session`.
    pub async fn acquire(&self, session: &SessionId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            // Drop entries nobody holds or waits on.
            locks.retain(|id, l| id == session || Arc::strong_count(l) > 1);
            locks.entry(session.clone()).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Number of sessions currently tracked.
    pub async fn tracked(&self) -> usize {
        self.locks.lock().await.len()
    }
}
