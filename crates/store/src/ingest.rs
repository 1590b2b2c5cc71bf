//! Corpus ingestion from scraped documentation files.
//!
//! Each `*.txt` file in the data directory becomes one partition. The label
//! is the second `_`-separated part of the file stem, so
//! `Extracted_Tailwind-UI-Kit_doc.txt` yields `Tailwind-UI-Kit` and
//! `Extracted_Axios.txt` yields `Axios`. Files are processed in name order so
//! the store's insertion order is reproducible.

use docweave_core::document::{Chunk, Embedder};
use docweave_core::error::RetrievalError;
use docweave_core::label::Label;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::corpus::InMemoryCorpus;
use crate::splitter::CharacterSplitter;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Data directory not found: {0}")]
    MissingDataDir(PathBuf),

    #[error("Expected {expected} documentation files, found {found}")]
    FileCountMismatch { expected: usize, found: usize },

    #[error("Corpus already exists at {0}; pass --force to rebuild it")]
    AlreadyExists(PathBuf),

    #[error("Invalid chunking settings: {0}")]
    InvalidChunking(String),

    #[error("Cannot derive a label from file name '{0}'")]
    UnlabelledFile(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Retrieval(#[from] RetrievalError),
}

#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub data_dir: PathBuf,
    pub snapshot_path: PathBuf,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    /// Fail unless exactly this many `.txt` files are present
    pub expected_files: Option<usize>,
    /// Overwrite an existing snapshot
    pub force: bool,
}

impl IngestOptions {
    pub fn new(data_dir: impl Into<PathBuf>, snapshot_path: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            snapshot_path: snapshot_path.into(),
            chunk_size: crate::splitter::DEFAULT_CHUNK_SIZE,
            chunk_overlap: crate::splitter::DEFAULT_CHUNK_OVERLAP,
            expected_files: None,
            force: false,
        }
    }
}

/// Summary of an ingestion run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    pub files: usize,
    pub chunks: usize,
    /// Chunks per label, in file order
    pub per_label: Vec<(Label, usize)>,
}

/// Label for a documentation file: the second `_`-separated part of its stem.
pub fn label_from_path(path: &Path) -> Option<Label> {
    let stem = path.file_stem()?.to_str()?;
    let part = stem.split('_').nth(1)?;
    if part.is_empty() {
        None
    } else {
        Some(Label::new(part.to_string()))
    }
}

async fn list_text_files(dir: &Path) -> Result<Vec<PathBuf>, IngestError> {
    let io_err = |source| IngestError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = tokio::fs::read_dir(dir).await.map_err(io_err)?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("txt") && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Build a corpus from `options.data_dir` and save it to
/// `options.snapshot_path`.
pub async fn ingest_dir(
    options: &IngestOptions,
    embedder: Arc<dyn Embedder>,
) -> Result<(InMemoryCorpus, IngestReport), IngestError> {
    if options.snapshot_path.exists() && !options.force {
        return Err(IngestError::AlreadyExists(options.snapshot_path.clone()));
    }
    if !options.data_dir.is_dir() {
        return Err(IngestError::MissingDataDir(options.data_dir.clone()));
    }

    let files = list_text_files(&options.data_dir).await?;
    if let Some(expected) = options.expected_files
        && files.len() != expected
    {
        return Err(IngestError::FileCountMismatch {
            expected,
            found: files.len(),
        });
    }

    let splitter = CharacterSplitter::new(options.chunk_size, options.chunk_overlap)
        .map_err(|e| IngestError::InvalidChunking(e.to_string()))?;
    let corpus = InMemoryCorpus::new(embedder);
    let mut report = IngestReport::default();

    for path in &files {
        let label = label_from_path(path).ok_or_else(|| {
            IngestError::UnlabelledFile(
                path.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            )
        })?;
        if !label.is_known() {
            warn!(label = %label, file = %path.display(), "Ingesting an unrecognised label");
        }

        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| IngestError::Io {
                path: path.clone(),
                source,
            })?;

        let chunks: Vec<Chunk> = splitter
            .split(&text)
            .into_iter()
            .map(|content| Chunk::new(label.clone(), content))
            .collect();
        let added = corpus.add(chunks).await?;

        info!(file = %path.display(), label = %label, chunks = added, "File ingested");
        report.files += 1;
        report.chunks += added;
        match report.per_label.iter_mut().find(|(l, _)| *l == label) {
            Some((_, n)) => *n += added,
            None => report.per_label.push((label, added)),
        }
    }

    corpus.save(&options.snapshot_path).await?;
    info!(
        files = report.files,
        chunks = report.chunks,
        path = %options.snapshot_path.display(),
        "Corpus built"
    );
    Ok((corpus, report))
}
