//! SQLite conversation log.
//!
//! One `turns` table keyed by an autoincrement id; reading a session orders
//! by that id, so append order is the read order regardless of timestamps.

use async_trait::async_trait;
use chrono::Utc;
use docweave_core::conversation::{ConversationLog, Role, SessionId, Turn};
use docweave_core::error::LogError;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};

pub struct SqliteConversationLog {
    pool: SqlitePool,
}

impl SqliteConversationLog {
    /// Open (or create) the database at `path`, e.g. `sqlite://history.db`
    /// or a bare file path.
    pub async fn new(path: &str) -> Result<Self, LogError> {
        let options = SqliteConnectOptions::from_str(path)
            .map_err(|e| LogError::Storage(format!("Invalid SQLite path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| LogError::Storage(format!("Failed to open SQLite: {e}")))?;

        let log = Self { pool };
        log.run_migrations().await?;
        info!("SQLite conversation log initialized at {path}");
        Ok(log)
    }

    async fn run_migrations(&self) -> Result<(), LogError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS turns (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id  TEXT NOT NULL,
                role        TEXT NOT NULL,
                content     TEXT NOT NULL,
                timestamp   TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| LogError::MigrationFailed(format!("turns table: {e}")))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_turns_session ON turns(session_id, id)")
            .execute(&self.pool)
            .await
            .map_err(|e| LogError::MigrationFailed(format!("session index: {e}")))?;

        debug!("SQLite conversation log migrations complete");
        Ok(())
    }

    fn row_to_turn(row: &sqlx::sqlite::SqliteRow) -> Result<Turn, LogError> {
        let role: String = row
            .try_get("role")
            .map_err(|e| LogError::QueryFailed(format!("role column: {e}")))?;
        let content: String = row
            .try_get("content")
            .map_err(|e| LogError::QueryFailed(format!("content column: {e}")))?;
        let timestamp: String = row
            .try_get("timestamp")
            .map_err(|e| LogError::QueryFailed(format!("timestamp column: {e}")))?;

        let role = match role.as_str() {
            "user" => Role::User,
            "assistant" => Role::Assistant,
            other => return Err(LogError::QueryFailed(format!("unknown role '{other}'"))),
        };

        let timestamp = chrono::DateTime::parse_from_rfc3339(&timestamp)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        Ok(Turn {
            role,
            content,
            timestamp,
        })
    }
}

fn role_column(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "assistant",
    }
}

#[async_trait]
impl ConversationLog for SqliteConversationLog {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn read(&self, session: &SessionId) -> Result<Vec<Turn>, LogError> {
        let rows = sqlx::query(
            "SELECT role, content, timestamp FROM turns WHERE session_id = ?1 ORDER BY id ASC",
        )
        .bind(session.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| LogError::QueryFailed(format!("read session: {e}")))?;

        rows.iter().map(Self::row_to_turn).collect()
    }

    async fn append(&self, session: &SessionId, turn: Turn) -> Result<(), LogError> {
        sqlx::query(
            "INSERT INTO turns (session_id, role, content, timestamp) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(session.as_str())
        .bind(role_column(turn.role))
        .bind(&turn.content)
        .bind(turn.timestamp.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| LogError::Storage(format!("append turn: {e}")))?;
        Ok(())
    }

    async fn clear(&self, session: &SessionId) -> Result<(), LogError> {
        let result = sqlx::query("DELETE FROM turns WHERE session_id = ?1")
            .bind(session.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| LogError::Storage(format!("clear session: {e}")))?;
        debug!(session = %session, removed = result.rows_affected(), "Session history cleared");
        Ok(())
    }
}
