//! Conversation turns and the append-only conversation log.
//!
//! A session's history is an ordered sequence of immutable turns. The log is
//! owned by the session id; the pipeline only ever reads and appends. Clearing
//! is an explicit external operation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::LogError;

/// Caller-defined conversation identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// The role of a turn's author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Uppercase tag used when rendering history lines.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Assistant => "ASSISTANT",
        }
    }
}

/// A single immutable conversation turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Render as `"<ROLE>: <content>"`.
    pub fn render(&self) -> String {
        format!("{}: {}", self.role.tag(), self.content)
    }
}

/// The ConversationLog capability.
///
/// Implementations: in-memory (tests), JSONL file, SQLite.
#[async_trait]
pub trait ConversationLog: Send + Sync {
    /// The backend name (e.g., "memory", "file", "sqlite").
    fn name(&self) -> &str;

    /// Full history of a session, oldest first. Unknown sessions are empty.
    async fn read(&self, session: &SessionId) -> std::result::Result<Vec<Turn>, LogError>;

    /// Atomically append one turn.
    async fn append(&self, session: &SessionId, turn: Turn) -> std::result::Result<(), LogError>;

    /// Delete all turns of a session.
    async fn clear(&self, session: &SessionId) -> std::result::Result<(), LogError>;
}
