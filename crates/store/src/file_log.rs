//! File-backed conversation log using JSON lines.
//!
//! Each line is one `{session, turn}` record. Records are loaded into memory
//! when the log is opened; appends go straight to the end of the file, while
//! `clear` rewrites it without the cleared session.
//!
//! The location comes from `storage.history_path` in the config.

use async_trait::async_trait;
use docweave_core::conversation::{ConversationLog, SessionId, Turn};
use docweave_core::error::LogError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::{debug, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Record {
    session: SessionId,
    turn: Turn,
}

/// A persistent conversation log stored as JSONL.
pub struct FileConversationLog {
    path: PathBuf,
    records: Arc<RwLock<Vec<Record>>>,
}

impl FileConversationLog {
    /// Open the log at `path`. A missing file starts an empty log; the file
    /// is created on first append.
    pub async fn open(path: PathBuf) -> Result<Self, LogError> {
        let records = Self::load_from_disk(&path).await?;
        debug!(path = %path.display(), records = records.len(), "Conversation log loaded");
        Ok(Self {
            path,
            records: Arc::new(RwLock::new(records)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load_from_disk(path: &Path) -> Result<Vec<Record>, LogError> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(LogError::Storage(format!(
                    "Failed to read {}: {e}",
                    path.display()
                )));
            }
        };

        Ok(content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str::<Record>(line) {
                Ok(r) => Some(r),
                Err(e) => {
                    warn!(error = %e, "Skipping corrupted history line");
                    None
                }
            })
            .collect())
    }

    async fn ensure_parent(&self) -> Result<(), LogError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                LogError::Storage(format!("Failed to create history directory: {e}"))
            })?;
        }
        Ok(())
    }

    fn encode(record: &Record) -> Result<String, LogError> {
        let mut line = serde_json::to_string(record)
            .map_err(|e| LogError::Storage(format!("Failed to serialize turn: {e}")))?;
        line.push('\n');
        Ok(line)
    }
}

#[async_trait]
impl ConversationLog for FileConversationLog {
    fn name(&self) -> &str {
        "file"
    }

    async fn read(&self, session: &SessionId) -> Result<Vec<Turn>, LogError> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|r| r.session == *session)
            .map(|r| r.turn.clone())
            .collect())
    }

    async fn append(&self, session: &SessionId, turn: Turn) -> Result<(), LogError> {
        let record = Record {
            session: session.clone(),
            turn,
        };
        let line = Self::encode(&record)?;

        // Holding the write lock across the file write keeps disk order
        // identical to memory order.
        let mut records = self.records.write().await;
        self.ensure_parent().await?;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| LogError::Storage(format!("Failed to open history file: {e}")))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| LogError::Storage(format!("Failed to append turn: {e}")))?;
        file.flush()
            .await
            .map_err(|e| LogError::Storage(format!("Failed to flush history file: {e}")))?;

        records.push(record);
        Ok(())
    }

    async fn clear(&self, session: &SessionId) -> Result<(), LogError> {
        let mut records = self.records.write().await;
        let before = records.len();
        let kept: Vec<Record> = records
            .iter()
            .filter(|r| r.session != *session)
            .cloned()
            .collect();
        if kept.len() == before {
            return Ok(());
        }

        let mut content = String::new();
        for record in &kept {
            content.push_str(&Self::encode(record)?);
        }
        self.ensure_parent().await?;
        tokio::fs::write(&self.path, content)
            .await
            .map_err(|e| LogError::Storage(format!("Failed to rewrite history file: {e}")))?;

        debug!(session = %session, removed = before - kept.len(), "Session history cleared");
        *records = kept;
        Ok(())
    }
}
