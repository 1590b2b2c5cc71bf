//! Error types for the DocWeave domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each capability has its own error type; the pipeline maps them onto the
//! stable [`ErrorKind`] that callers see on a failed generation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable, machine-readable failure kind surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// The document store or conversation log could not be read.
    RetrievalError,
    /// The generation or summarization capability failed or timed out.
    GenerationError,
    /// The request itself was malformed (e.g. multimodal without an image).
    InvalidRequest,
    /// The caller cancelled the request before it completed.
    Cancelled,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::RetrievalError => "RETRIEVAL_ERROR",
            Self::GenerationError => "GENERATION_ERROR",
            Self::InvalidRequest => "INVALID_REQUEST",
            Self::Cancelled => "CANCELLED",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Error)]
pub enum RetrievalError {
    #[error("Document store unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed query: {0}")]
    MalformedQuery(String),

    #[error("Query embedding failed: {0}")]
    Embedding(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Generation timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Unsupported generation mode: {0}")]
    UnsupportedMode(String),

    #[error("Provider returned no content")]
    EmptyResponse,
}

#[derive(Debug, Clone, Error)]
pub enum LogError {
    #[error("Conversation log storage error: {0}")]
    Storage(String),

    #[error("Conversation log query failed: {0}")]
    QueryFailed(String),

    #[error("Conversation log migration failed: {0}")]
    MigrationFailed(String),
}

#[derive(Debug, Clone, Error)]
pub enum SummaryError {
    #[error("Summarization failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("Nothing to summarize")]
    Empty,
}

/// Raised when a partition policy or generation profile is inconsistent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("Label '{0}' is declared more than once")]
    DuplicateLabel(String),

    #[error("Always-included label '{0}' is not placed in any section")]
    UnplacedLabel(String),

    #[error("Label '{0}' is placed in more than one section")]
    LabelInMultipleSections(String),

    #[error("Section '{header}' references label '{label}', which is not always-included")]
    NotAlwaysIncluded { header: String, label: String },

    #[error("Policy declares more than one ranked section")]
    MultipleRankedSections,

    #[error("Ranked retrieval requires top_k >= 1")]
    ZeroTopK,

    #[error("Invalid profile: {0}")]
    InvalidProfile(String),
}
