//! Wiring: turn an [`AppConfig`] into the capabilities the pipeline needs.

use anyhow::Context;
use docweave_config::{AppConfig, EmbeddingProvider, HistoryBackend};
use docweave_core::{ConversationLog, Embedder, GenerationMode, GenerationProfile, Generator};
use docweave_pipeline::{Orchestrator, SerializeMode};
use docweave_providers::{LlmSummarizer, OpenAiCompatGenerator, OpenAiEmbedder};
use docweave_store::{
    FileConversationLog, HashEmbedder, InMemoryConversationLog, InMemoryCorpus,
    SqliteConversationLog,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Profiles shipped with the binary; config-file profiles win by name.
pub const BUNDLED_PROFILES: &str = include_str!("../profiles.toml");

pub fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    let mut config = match path {
        Some(p) => {
            let mut config = AppConfig::load_from(p)
                .with_context(|| format!("Failed to load config from {}", p.display()))?;
            config.apply_env_overrides();
            config
        }
        None => AppConfig::load().context("Failed to load config")?,
    };
    let added = config
        .merge_profiles_toml(BUNDLED_PROFILES)
        .context("Bundled profiles are invalid")?;
    debug!(added, total = config.profiles.len(), "Profiles merged");
    Ok(config)
}

pub fn build_embedder(config: &AppConfig) -> anyhow::Result<Arc<dyn Embedder>> {
    Ok(match config.embedding.provider {
        EmbeddingProvider::Hash => Arc::new(HashEmbedder::new(config.embedding.dimensions)),
        EmbeddingProvider::Openai => Arc::new(
            OpenAiEmbedder::from_config(&config.provider, &config.embedding.model)
                .context("Failed to create embedding client")?,
        ),
    })
}

/// Load the corpus snapshot, or `None` if nothing has been ingested yet.
pub async fn open_corpus(config: &AppConfig) -> anyhow::Result<Option<InMemoryCorpus>> {
    let path = &config.storage.corpus_path;
    if !path.exists() {
        info!(path = %path.display(), "No corpus snapshot found");
        return Ok(None);
    }
    let corpus = InMemoryCorpus::load(path, build_embedder(config)?)
        .await
        .with_context(|| format!("Failed to load corpus from {}", path.display()))?;
    Ok(Some(corpus))
}

pub async fn open_log(config: &AppConfig) -> anyhow::Result<Arc<dyn ConversationLog>> {
    let path = &config.storage.history_path;
    Ok(match config.storage.history_backend {
        HistoryBackend::Memory => Arc::new(InMemoryConversationLog::new()),
        HistoryBackend::File => Arc::new(
            FileConversationLog::open(path.clone())
                .await
                .with_context(|| format!("Failed to open history at {}", path.display()))?,
        ),
        HistoryBackend::Sqlite => {
            let url = format!("sqlite://{}", path.display());
            Arc::new(
                SqliteConversationLog::new(&url)
                    .await
                    .with_context(|| format!("Failed to open history database {url}"))?,
            )
        }
    })
}

/// `mode` is the mode the request will run in, which `--mode` may have
/// switched away from the profile's own.
pub fn build_generator(
    config: &AppConfig,
    profile: &GenerationProfile,
    mode: GenerationMode,
) -> anyhow::Result<Arc<dyn Generator>> {
    let generator = OpenAiCompatGenerator::from_config(&config.provider, profile.model.as_deref())
        .context("Failed to create generation client")?
        .with_vision(mode == GenerationMode::Multimodal);
    info!(profile = %profile.name, model = %generator.model(), ?mode, "Generator ready");
    Ok(Arc::new(generator))
}

pub async fn build_orchestrator(
    config: &AppConfig,
    profile: &GenerationProfile,
    mode: GenerationMode,
) -> anyhow::Result<Orchestrator> {
    let generator = build_generator(config, profile, mode)?;
    let summarizer = Arc::new(LlmSummarizer::new(generator.clone()));
    let log = open_log(config).await?;

    let mut orchestrator = Orchestrator::new(log, generator, summarizer).with_serialize_mode(
        match config.pipeline.session_serialization {
            docweave_config::SessionSerialization::PersistOnly => SerializeMode::PersistOnly,
            docweave_config::SessionSerialization::WholePipeline => SerializeMode::WholePipeline,
        },
    );
    if let Some(secs) = config.pipeline.generation_timeout_secs {
        orchestrator = orchestrator.with_timeout(Duration::from_secs(secs));
    }
    if let Some(corpus) = open_corpus(config).await? {
        orchestrator = orchestrator.with_store(Arc::new(corpus));
    }
    Ok(orchestrator)
}
