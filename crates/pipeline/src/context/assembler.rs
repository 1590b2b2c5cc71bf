//! Context assembly: turn a partition policy and a query into the labelled
//! sections of a generation prompt.
//!
//! Two kinds of content feed a [`ContextBundle`]:
//!
//! 1. **Always-included partitions**: every chunk of each `AlwaysIncludeAll`
//!    label, fetched in full regardless of the query.
//! 2. **Ranked supplement**: the top-K chunks closest to the query, drawn
//!    only from labels the policy does not name. Under the `FullDump`
//!    strategy this is every remaining chunk in store order instead.
//!
//! # Determinism
//!
//! Assembly reads the store and nothing else. With unchanged store state and
//! an identical query, two calls produce identical bundles.

use docweave_core::document::{Chunk, DocumentStore};
use docweave_core::error::RetrievalError;
use docweave_core::label::Label;
use docweave_core::policy::{CorpusPartitionPolicy, RetrievalStrategy, SectionSource};
use futures::future::try_join_all;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

// ── Types ─────────────────────────────────────────────────────────────────

/// A non-fatal condition noticed while assembling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "label", rename_all = "snake_case")]
pub enum ContextWarning {
    /// An always-included label had no chunks; its section renders empty.
    EmptyPartition(Label),
}

impl std::fmt::Display for ContextWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyPartition(label) => {
                write!(f, "always-included partition '{label}' is empty")
            }
        }
    }
}

/// Everything retrieved for one request, before rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextBundle {
    /// One entry per always-included label, in policy order. Content is the
    /// label's chunks joined by `"\n"`, or `""` for an empty partition.
    pub always_included: Vec<(Label, String)>,

    /// Ranked (or full-dump) chunks, closest first.
    pub ranked_supplement: Vec<Chunk>,

    /// Rendered conversation history, attached by the orchestrator.
    pub history_text: Option<String>,

    pub warnings: Vec<ContextWarning>,
}

impl ContextBundle {
    /// Content of one always-included partition.
    pub fn partition(&self, label: &Label) -> Option<&str> {
        self.always_included
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, content)| content.as_str())
    }

    /// Compose the context block: one `[HEADER]\n<content>` block per policy
    /// section, in policy order, separated by blank lines.
    pub fn render(&self, policy: &CorpusPartitionPolicy) -> String {
        let blocks: Vec<String> = policy
            .sections()
            .iter()
            .map(|section| {
                let body = match &section.source {
                    SectionSource::Partitions { labels } => labels
                        .iter()
                        .map(|l| self.partition(l).unwrap_or_default())
                        .collect::<Vec<_>>()
                        .join("\n"),
                    SectionSource::Ranked => self
                        .ranked_supplement
                        .iter()
                        .map(|c| c.content.as_str())
                        .collect::<Vec<_>>()
                        .join("\n"),
                };
                format!("[{}]\n{}", section.header, body)
            })
            .collect();
        blocks.join("\n\n")
    }
}

// ── Assembler ─────────────────────────────────────────────────────────────

/// Builds [`ContextBundle`]s against a shared document store.
#[derive(Clone)]
pub struct ContextAssembler {
    store: Arc<dyn DocumentStore>,
}

impl ContextAssembler {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Fetch the always-included partitions and the ranked supplement.
    ///
    /// Both reads are independent and run concurrently. Any store error
    /// fails the whole assembly; there is no partial result.
    pub async fn assemble(
        &self,
        policy: &CorpusPartitionPolicy,
        query: &str,
    ) -> Result<ContextBundle, RetrievalError> {
        let (always_included, ranked_supplement) =
            futures::try_join!(self.fetch_partitions(policy), self.fetch_ranked(policy, query))?;

        let warnings: Vec<ContextWarning> = always_included
            .iter()
            .filter(|(_, content)| content.is_empty())
            .map(|(label, _)| {
                warn!(label = %label, store = %self.store.name(), "Always-included partition is empty");
                ContextWarning::EmptyPartition(label.clone())
            })
            .collect();

        debug!(
            partitions = always_included.len(),
            ranked = ranked_supplement.len(),
            warnings = warnings.len(),
            "Context assembled"
        );

        Ok(ContextBundle {
            always_included,
            ranked_supplement,
            history_text: None,
            warnings,
        })
    }

    async fn fetch_partitions(
        &self,
        policy: &CorpusPartitionPolicy,
    ) -> Result<Vec<(Label, String)>, RetrievalError> {
        try_join_all(policy.always_included().map(|label| async move {
            let chunks = self.store.get_by_label(label).await?;
            let content = chunks
                .iter()
                .filter(|c| c.label == *label)
                .map(|c| c.content.as_str())
                .collect::<Vec<_>>()
                .join("\n");
            Ok::<_, RetrievalError>((label.clone(), content))
        }))
        .await
    }

    async fn fetch_ranked(
        &self,
        policy: &CorpusPartitionPolicy,
        query: &str,
    ) -> Result<Vec<Chunk>, RetrievalError> {
        if !policy.has_ranked_section() {
            return Ok(Vec::new());
        }
        let exclude = policy.ranked_exclusions();

        let mut chunks = match policy.strategy() {
            RetrievalStrategy::Ranked => {
                if query.trim().is_empty() {
                    debug!("Blank query, ranked supplement left empty");
                    return Ok(Vec::new());
                }
                let mut hits = self.store.search(query, policy.top_k(), &exclude).await?;
                hits.truncate(policy.top_k());
                hits
            }
            RetrievalStrategy::FullDump => self.store.list(&exclude).await?,
        };

        // A store that ignores the exclusion list must not leak excluded chunks.
        chunks.retain(|c| !exclude.contains(&c.label));
        Ok(chunks)
    }
}
