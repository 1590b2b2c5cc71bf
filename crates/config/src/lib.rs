//! Configuration loading, validation, and management for DocWeave.
//!
//! Loads configuration from `~/.docweave/config.toml` with environment
//! variable overrides. Generation profiles are plain data in the same file
//! (or a separate profiles file) and are validated into
//! [`GenerationProfile`] values before any request runs.

use docweave_core::error::PolicyError;
use docweave_core::generation::GenerationMode;
use docweave_core::policy::{
    CorpusPartitionPolicy, PartitionRule, PayloadTemplate, RetrievalStrategy, Section,
};
use docweave_core::profile::{GenerationProfile, HistorySettings};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.docweave/config.toml`.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Generation endpoint
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Embedding backend used for ingestion and query vectors
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Corpus snapshot and conversation log locations
    #[serde(default)]
    pub storage: StorageConfig,

    /// Corpus ingestion settings
    #[serde(default)]
    pub ingest: IngestConfig,

    /// Orchestrator behaviour
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Named generation profiles
    #[serde(default)]
    pub profiles: BTreeMap<String, ProfileConfig>,

    /// Profile used when a request names none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_profile: Option<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("provider", &self.provider)
            .field("embedding", &self.embedding)
            .field("storage", &self.storage)
            .field("ingest", &self.ingest)
            .field("pipeline", &self.pipeline)
            .field("profiles", &self.profiles.keys().collect::<Vec<_>>())
            .field("default_profile", &self.default_profile)
            .finish()
    }
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// OpenAI-compatible base URL (OpenAI, Ollama, vLLM, LM Studio...)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// HTTP timeout for a single generation call
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-5-mini".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    8192
}
fn default_timeout_secs() -> u64 {
    300
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &redact(&self.api_key))
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// Offline feature hashing
    #[default]
    Hash,
    /// `/embeddings` on the configured provider
    Openai,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub provider: EmbeddingProvider,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Vector width for the hash embedder
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".into()
}
fn default_dimensions() -> usize {
    256
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::default(),
            model: default_embedding_model(),
            dimensions: default_dimensions(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryBackend {
    Memory,
    #[default]
    File,
    Sqlite,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_corpus_path")]
    pub corpus_path: PathBuf,

    #[serde(default)]
    pub history_backend: HistoryBackend,

    #[serde(default = "default_history_path")]
    pub history_path: PathBuf,
}

fn default_corpus_path() -> PathBuf {
    AppConfig::config_dir().join("corpus.jsonl")
}
fn default_history_path() -> PathBuf {
    AppConfig::config_dir().join("history.jsonl")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            corpus_path: default_corpus_path(),
            history_backend: HistoryBackend::default(),
            history_path: default_history_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Directory of scraped `*.txt` documentation files
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Refuse to ingest unless exactly this many files are present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_files: Option<usize>,
}

fn default_data_dir() -> PathBuf {
    AppConfig::config_dir().join("extracted_data")
}
fn default_chunk_size() -> usize {
    1000
}
fn default_chunk_overlap() -> usize {
    100
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            expected_files: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionSerialization {
    /// Lock a session only while its exchange is appended
    #[default]
    PersistOnly,
    /// Run one request per session at a time
    WholePipeline,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Overall deadline for a generation call; unset waits indefinitely
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_timeout_secs: Option<u64>,

    #[serde(default)]
    pub session_serialization: SessionSerialization,
}

/// A generation profile as written in TOML. Mode, K, the history budget
/// and the recent-turn window have no defaults.
///
/// ```toml
/// [profiles.gemma]
/// model = "gemma3:12b"
/// mode = "multimodal"
/// top_k = 5
/// token_budget = 2500
/// keep_last_n = 3
/// template = "..."
///
/// [[profiles.gemma.rules]]
/// label = "Tailwind"
/// mode = "always_include_all"
///
/// [[profiles.gemma.sections]]
/// header = "TAILWIND CSS DOCS"
/// kind = "partitions"
/// labels = ["Tailwind"]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    pub mode: GenerationMode,

    pub top_k: usize,

    #[serde(default)]
    pub strategy: RetrievalStrategy,

    pub token_budget: usize,

    pub keep_last_n: usize,

    #[serde(default)]
    pub rules: Vec<PartitionRule>,

    #[serde(default)]
    pub sections: Vec<Section>,

    pub template: String,
}

impl ProfileConfig {
    /// Validate and convert into a runnable profile.
    pub fn to_profile(&self, name: &str) -> Result<GenerationProfile, PolicyError> {
        let policy = CorpusPartitionPolicy::new(
            self.rules.clone(),
            self.sections.clone(),
            self.top_k,
            self.strategy,
        )?;
        let template = PayloadTemplate::new(self.template.clone())?;
        let profile = GenerationProfile::new(
            name,
            self.mode,
            policy,
            template,
            HistorySettings {
                token_budget: self.token_budget,
                keep_last_n: self.keep_last_n,
            },
        )?;
        Ok(match &self.model {
            Some(m) => profile.with_model(m.clone()),
            None => profile,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ProfilesFile {
    #[serde(default)]
    profiles: BTreeMap<String, ProfileConfig>,
    #[serde(default)]
    default_profile: Option<String>,
}

impl AppConfig {
    /// Load configuration from the default path (~/.docweave/config.toml)
    /// and apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Environment variables take precedence over the file:
    /// - `DOCWEAVE_API_KEY`, then `OPENAI_API_KEY` (only when no key is configured)
    /// - `DOCWEAVE_MODEL`
    /// - `DOCWEAVE_BASE_URL`
    pub fn apply_env_overrides(&mut self) {
        if self.provider.api_key.is_none() {
            self.provider.api_key = std::env::var("DOCWEAVE_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }

        if let Ok(model) = std::env::var("DOCWEAVE_MODEL") {
            self.provider.model = model;
        }

        if let Ok(url) = std::env::var("DOCWEAVE_BASE_URL") {
            self.provider.base_url = url;
        }
    }

    /// Merge profiles from a TOML document. Profiles already present in this
    /// config win over same-named ones from `toml_str`.
    pub fn merge_profiles_toml(&mut self, toml_str: &str) -> Result<usize, ConfigError> {
        let file: ProfilesFile =
            toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
                path: PathBuf::from("<profiles>"),
                reason: e.to_string(),
            })?;

        let mut added = 0;
        for (name, profile) in file.profiles {
            if let std::collections::btree_map::Entry::Vacant(slot) = self.profiles.entry(name) {
                slot.insert(profile);
                added += 1;
            }
        }
        if self.default_profile.is_none() {
            self.default_profile = file.default_profile;
        }
        self.validate()?;
        Ok(added)
    }

    /// Resolve a profile by name, falling back to `default_profile`.
    pub fn profile(&self, name: Option<&str>) -> Result<GenerationProfile, ConfigError> {
        let name = name
            .or(self.default_profile.as_deref())
            .ok_or_else(|| ConfigError::UnknownProfile("no profile selected".into()))?;
        let cfg = self
            .profiles
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProfile(name.to_string()))?;
        cfg.to_profile(name).map_err(|e| ConfigError::InvalidProfile {
            name: name.to_string(),
            source: e,
        })
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".docweave")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.provider.temperature) {
            return Err(ConfigError::ValidationError(
                "provider.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.ingest.chunk_size == 0 {
            return Err(ConfigError::ValidationError(
                "ingest.chunk_size must be > 0".into(),
            ));
        }

        if self.ingest.chunk_overlap >= self.ingest.chunk_size {
            return Err(ConfigError::ValidationError(
                "ingest.chunk_overlap must be smaller than ingest.chunk_size".into(),
            ));
        }

        if self.embedding.dimensions == 0 {
            return Err(ConfigError::ValidationError(
                "embedding.dimensions must be > 0".into(),
            ));
        }

        for (name, profile) in &self.profiles {
            profile
                .to_profile(name)
                .map_err(|e| ConfigError::InvalidProfile {
                    name: name.clone(),
                    source: e,
                })?;
        }

        if let Some(default) = &self.default_profile
            && !self.profiles.is_empty()
            && !self.profiles.contains_key(default)
        {
            return Err(ConfigError::UnknownProfile(default.clone()));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.provider.api_key.is_some()
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    #[error("Unknown profile: {0}")]
    UnknownProfile(String),

    #[error("Profile '{name}' is invalid: {source}")]
    InvalidProfile {
        name: String,
        #[source]
        source: PolicyError,
    },
}
