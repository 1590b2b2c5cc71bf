//! In-memory document store with JSONL snapshots.
//!
//! Chunks live in a `Vec` in insertion order, so label reads and listings
//! are naturally ordered and similarity ties resolve deterministically.
//! Search is brute-force cosine over all eligible chunks, which is plenty
//! for a few thousand documentation chunks.
//!
//! Snapshot format: the first line is a [`SnapshotHeader`], every following
//! line one JSON-encoded [`Chunk`] including its embedding.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use docweave_core::document::{Chunk, DocumentStore, Embedder};
use docweave_core::error::RetrievalError;
use docweave_core::label::Label;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::vector;

const EMBED_BATCH: usize = 64;

/// First line of a corpus snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotHeader {
    /// Name of the embedder the corpus was built with
    pub embedder: String,
    /// Number of chunks that follow
    pub chunks: usize,
    pub created_at: DateTime<Utc>,
}

/// The reference [`DocumentStore`].
pub struct InMemoryCorpus {
    chunks: Arc<RwLock<Vec<Chunk>>>,
    embedder: Arc<dyn Embedder>,
}

impl InMemoryCorpus {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            chunks: Arc::new(RwLock::new(Vec::new())),
            embedder,
        }
    }

    /// Add chunks, embedding any that arrive without a vector.
    ///
    /// Returns the number of chunks added. Insertion order is preserved.
    pub async fn add(&self, mut chunks: Vec<Chunk>) -> Result<usize, RetrievalError> {
        let missing: Vec<usize> = chunks
            .iter()
            .enumerate()
            .filter(|(_, c)| c.embedding.is_empty())
            .map(|(i, _)| i)
            .collect();

        for batch in missing.chunks(EMBED_BATCH) {
            let texts: Vec<String> = batch.iter().map(|&i| chunks[i].content.clone()).collect();
            let vectors = self.embedder.embed(&texts).await?;
            if vectors.len() != texts.len() {
                return Err(RetrievalError::Embedding(format!(
                    "embedder '{}' returned {} vectors for {} texts",
                    self.embedder.name(),
                    vectors.len(),
                    texts.len()
                )));
            }
            for (&i, v) in batch.iter().zip(vectors) {
                chunks[i].embedding = v;
            }
        }

        let added = chunks.len();
        self.chunks.write().await.extend(chunks);
        debug!(added, "Chunks added to corpus");
        Ok(added)
    }

    /// Load a snapshot written by [`InMemoryCorpus::save`].
    ///
    /// Corrupted chunk lines are skipped with a warning; a missing or
    /// unreadable file is an error.
    pub async fn load(path: &Path, embedder: Arc<dyn Embedder>) -> Result<Self, RetrievalError> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            RetrievalError::Unavailable(format!("cannot read corpus {}: {e}", path.display()))
        })?;

        let mut lines = content.lines().filter(|l| !l.trim().is_empty());
        let header: SnapshotHeader = match lines.next() {
            Some(line) => serde_json::from_str(line).map_err(|e| {
                RetrievalError::Storage(format!("invalid corpus header: {e}"))
            })?,
            None => {
                return Err(RetrievalError::Storage(format!(
                    "corpus snapshot {} is empty",
                    path.display()
                )));
            }
        };

        if header.embedder != embedder.name() {
            warn!(
                built_with = %header.embedder,
                using = %embedder.name(),
                "Corpus was built with a different embedder; rankings may be meaningless"
            );
        }

        let chunks: Vec<Chunk> = lines
            .filter_map(|line| match serde_json::from_str::<Chunk>(line) {
                Ok(chunk) => Some(chunk),
                Err(e) => {
                    warn!(error = %e, "Skipping corrupted corpus line");
                    None
                }
            })
            .collect();

        if chunks.len() != header.chunks {
            warn!(expected = header.chunks, found = chunks.len(), "Corpus chunk count mismatch");
        }

        info!(path = %path.display(), chunks = chunks.len(), "Corpus loaded");
        Ok(Self {
            chunks: Arc::new(RwLock::new(chunks)),
            embedder,
        })
    }

    /// Write the whole corpus to `path` as a JSONL snapshot.
    pub async fn save(&self, path: &Path) -> Result<(), RetrievalError> {
        let chunks = self.chunks.read().await;

        let header = SnapshotHeader {
            embedder: self.embedder.name().to_string(),
            chunks: chunks.len(),
            created_at: Utc::now(),
        };

        let mut content = serde_json::to_string(&header)
            .map_err(|e| RetrievalError::Storage(format!("serialize header: {e}")))?;
        content.push('\n');
        for chunk in chunks.iter() {
            let line = serde_json::to_string(chunk)
                .map_err(|e| RetrievalError::Storage(format!("serialize chunk: {e}")))?;
            content.push_str(&line);
            content.push('\n');
        }
        drop(chunks);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                RetrievalError::Storage(format!("create corpus directory: {e}"))
            })?;
        }
        tokio::fs::write(path, content)
            .await
            .map_err(|e| RetrievalError::Storage(format!("write corpus: {e}")))?;

        info!(path = %path.display(), "Corpus snapshot saved");
        Ok(())
    }

    /// Chunk counts per label, in first-seen order.
    pub async fn label_counts(&self) -> Vec<(Label, usize)> {
        let chunks = self.chunks.read().await;
        let mut counts: Vec<(Label, usize)> = Vec::new();
        for chunk in chunks.iter() {
            match counts.iter_mut().find(|(l, _)| *l == chunk.label) {
                Some((_, n)) => *n += 1,
                None => counts.push((chunk.label.clone(), 1)),
            }
        }
        counts
    }
}

#[async_trait]
impl DocumentStore for InMemoryCorpus {
    fn name(&self) -> &str {
        "memory"
    }

    async fn get_by_label(&self, label: &Label) -> Result<Vec<Chunk>, RetrievalError> {
        let chunks = self.chunks.read().await;
        Ok(chunks.iter().filter(|c| c.label == *label).cloned().collect())
    }

    async fn search(
        &self,
        query: &str,
        k: usize,
        exclude: &[Label],
    ) -> Result<Vec<Chunk>, RetrievalError> {
        if k == 0 {
            return Ok(Vec::new());
        }
        if query.trim().is_empty() {
            return Err(RetrievalError::MalformedQuery(
                "similarity search needs a non-empty query".into(),
            ));
        }

        let query_embedding = self
            .embedder
            .embed(&[query.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RetrievalError::Embedding("embedder returned no vector".into()))?;

        let chunks = self.chunks.read().await;
        let eligible = chunks.iter().filter(|c| !exclude.contains(&c.label));
        let ranked = vector::rank_by_similarity(eligible, &query_embedding, k);
        debug!(k, returned = ranked.len(), excluded = exclude.len(), "Corpus search");
        Ok(ranked)
    }

    async fn list(&self, exclude: &[Label]) -> Result<Vec<Chunk>, RetrievalError> {
        let chunks = self.chunks.read().await;
        Ok(chunks
            .iter()
            .filter(|c| !exclude.contains(&c.label))
            .cloned()
            .collect())
    }

    async fn len(&self) -> Result<usize, RetrievalError> {
        Ok(self.chunks.read().await.len())
    }
}
