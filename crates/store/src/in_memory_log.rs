//! Process-local conversation log. Contents vanish on restart.

use async_trait::async_trait;
use docweave_core::conversation::{ConversationLog, SessionId, Turn};
use docweave_core::error::LogError;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default, Clone)]
pub struct InMemoryConversationLog {
    sessions: Arc<RwLock<HashMap<SessionId, Vec<Turn>>>>,
}

impl InMemoryConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sessions with at least one turn.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl ConversationLog for InMemoryConversationLog {
    fn name(&self) -> &str {
        "memory"
    }

    async fn read(&self, session: &SessionId) -> Result<Vec<Turn>, LogError> {
        Ok(self
            .sessions
            .read()
            .await
            .get(session)
            .cloned()
            .unwrap_or_default())
    }

    async fn append(&self, session: &SessionId, turn: Turn) -> Result<(), LogError> {
        self.sessions
            .write()
            .await
            .entry(session.clone())
            .or_default()
            .push(turn);
        Ok(())
    }

    async fn clear(&self, session: &SessionId) -> Result<(), LogError> {
        self.sessions.write().await.remove(session);
        Ok(())
    }
}
