//! Embeddings over an OpenAI-compatible `/embeddings` endpoint.

use async_trait::async_trait;
use docweave_config::ProviderConfig;
use docweave_core::document::Embedder;
use docweave_core::error::RetrievalError;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

pub struct OpenAiEmbedder {
    base_url: String,
    api_key: Option<String>,
    model: String,
    client: reqwest::Client,
}

impl OpenAiEmbedder {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Result<Self, RetrievalError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| RetrievalError::Embedding(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
            model: model.into(),
            client,
        })
    }

    pub fn from_config(provider: &ProviderConfig, model: &str) -> Result<Self, RetrievalError> {
        let mut embedder = Self::new(&provider.base_url, model)?;
        embedder.api_key = provider.api_key.clone();
        Ok(embedder)
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }
}

#[derive(Debug, Deserialize)]
struct EmbeddingApiResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    fn name(&self) -> &str {
        &self.model
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RetrievalError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/embeddings", self.base_url);
        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
            "encoding_format": "float",
        });

        debug!(model = %self.model, count = texts.len(), "Sending embedding request");

        let mut request = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {key}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| RetrievalError::Unavailable(format!("embedding endpoint: {e}")))?;

        let status = response.status().as_u16();
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            return Err(RetrievalError::Embedding(format!(
                "embedding request failed ({status}): {error_body}"
            )));
        }

        let mut api_resp: EmbeddingApiResponse = response.json().await.map_err(|e| {
            RetrievalError::Embedding(format!("Failed to parse embedding response: {e}"))
        })?;

        if api_resp.data.len() != texts.len() {
            return Err(RetrievalError::Embedding(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                api_resp.data.len()
            )));
        }

        api_resp.data.sort_by_key(|d| d.index);
        Ok(api_resp.data.into_iter().map(|d| d.embedding).collect())
    }
}
