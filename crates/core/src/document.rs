//! Document store trait - the corpus of embedded documentation chunks.
//!
//! The store holds chunks tagged with a provenance [`Label`] and supports:
//! - Exact-match retrieval of a whole partition by label
//! - Semantic nearest-neighbour search with label exclusion filters
//! - An unranked listing used by the full-dump retrieval strategy

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RetrievalError;
use crate::label::Label;

/// An immutable unit of ingested documentation text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Stable chunk ID
    pub id: String,

    /// The text content
    pub content: String,

    /// Which documentation set this chunk came from
    pub label: Label,

    /// Embedding vector, owned by the store once submitted
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embedding: Vec<f32>,
}

impl Chunk {
    /// Create a chunk without an embedding (the store fills it in on insert).
    pub fn new(label: Label, content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            content: content.into(),
            label,
            embedding: Vec::new(),
        }
    }
}

/// The DocumentStore capability.
///
/// Implementations must return chunks in a stable order: `get_by_label` and
/// `list` in insertion order, `search` by ascending distance with ties broken
/// by insertion order. The pipeline relies on this for reproducible prompts.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// A human-readable backend name (e.g., "memory", "jsonl").
    fn name(&self) -> &str;

    /// Whether a corpus has been built. An uninitialized store short-circuits
    /// generation with an instructional "no corpus" outcome.
    async fn is_ready(&self) -> std::result::Result<bool, RetrievalError> {
        Ok(self.len().await? > 0)
    }

    /// Every chunk whose label equals `label`, in insertion order.
    async fn get_by_label(&self, label: &Label) -> std::result::Result<Vec<Chunk>, RetrievalError>;

    /// Up to `k` chunks closest to `query`, closest first, skipping any chunk
    /// whose label is in `exclude`.
    async fn search(
        &self,
        query: &str,
        k: usize,
        exclude: &[Label],
    ) -> std::result::Result<Vec<Chunk>, RetrievalError>;

    /// Every chunk not in `exclude`, in insertion order.
    async fn list(&self, exclude: &[Label]) -> std::result::Result<Vec<Chunk>, RetrievalError>;

    /// Total number of chunks.
    async fn len(&self) -> std::result::Result<usize, RetrievalError>;
}

/// The Embedder capability - turns text into vectors for the store.
#[async_trait]
pub trait Embedder: Send + Sync {
    fn name(&self) -> &str;

    /// Embed a batch of texts, one vector per input, in input order.
    async fn embed(&self, texts: &[String]) -> std::result::Result<Vec<Vec<f32>>, RetrievalError>;
}
