//! `docweave ingest` - Build the corpus snapshot.

use crate::runtime;
use anyhow::Context;
use docweave_store::{IngestOptions, ingest_dir};
use std::path::{Path, PathBuf};

pub async fn run(config: Option<&Path>, data_dir: Option<PathBuf>, force: bool) -> anyhow::Result<()> {
    let config = runtime::load_config(config)?;

    let options = IngestOptions {
        chunk_size: config.ingest.chunk_size,
        chunk_overlap: config.ingest.chunk_overlap,
        expected_files: config.ingest.expected_files,
        force,
        ..IngestOptions::new(
            data_dir.unwrap_or_else(|| config.ingest.data_dir.clone()),
            config.storage.corpus_path.clone(),
        )
    };

    if let Some(parent) = options.snapshot_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let embedder = runtime::build_embedder(&config)?;
    let (_, report) = ingest_dir(&options, embedder)
        .await
        .context("Ingestion failed")?;

    println!("Corpus built: {} files, {} chunks", report.files, report.chunks);
    for (label, count) in &report.per_label {
        println!("  {label:<24} {count:>6}");
    }
    println!("Saved to {}", options.snapshot_path.display());
    Ok(())
}
