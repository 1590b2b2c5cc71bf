//! Generation and summarization traits - the abstraction over LLM backends.
//!
//! A [`Generator`] turns a rendered instruction [`Payload`] into text, either
//! from text alone or from text plus a screenshot. A [`Summarizer`] condenses
//! older conversation turns; it usually reuses a generator.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::conversation::Turn;
use crate::error::{GenerationError, SummaryError};

/// Which kind of generation a request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMode {
    /// Prompt text only
    #[default]
    Text,
    /// Prompt text plus an attached image
    Multimodal,
}

impl std::fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::Multimodal => f.write_str("multimodal"),
        }
    }
}

/// An image encoded for transport to a multimodal model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedImage {
    /// MIME type sniffed from the image header
    pub media_type: String,

    /// Standard base64 of the raw bytes
    pub base64: String,
}

impl EncodedImage {
    /// Encode raw image bytes. Unrecognized formats fall back to
    /// `application/octet-stream` and are left to the model to reject.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            media_type: sniff_media_type(bytes).to_string(),
            base64: STANDARD.encode(bytes),
        }
    }

    /// `data:` URL form accepted by OpenAI-compatible vision endpoints.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.base64)
    }
}

fn sniff_media_type(bytes: &[u8]) -> &'static str {
    match bytes {
        [0x89, b'P', b'N', b'G', ..] => "image/png",
        [0xFF, 0xD8, 0xFF, ..] => "image/jpeg",
        [b'G', b'I', b'F', b'8', ..] => "image/gif",
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => "image/webp",
        _ => "application/octet-stream",
    }
}

/// The final instruction payload handed to a generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    /// Fully rendered instruction text
    pub text: String,

    /// Attached image, present only in multimodal mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<EncodedImage>,

    pub mode: GenerationMode,
}

impl Payload {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            image: None,
            mode: GenerationMode::Text,
        }
    }

    pub fn multimodal(text: impl Into<String>, image: EncodedImage) -> Self {
        Self {
            text: text.into(),
            image: Some(image),
            mode: GenerationMode::Multimodal,
        }
    }
}

/// The Generator capability.
///
/// Calls may take tens of seconds; implementations must not block the
/// runtime while waiting.
#[async_trait]
pub trait Generator: Send + Sync {
    /// A human-readable name (e.g., "openai", "ollama").
    fn name(&self) -> &str;

    /// Generate text for the payload.
    async fn invoke(&self, payload: &Payload) -> std::result::Result<String, GenerationError>;

    /// Whether this generator accepts image attachments.
    fn supports_images(&self) -> bool {
        true
    }
}

/// The Summarizer capability.
#[async_trait]
pub trait Summarizer: Send + Sync {
    fn name(&self) -> &str;

    /// Condense `turns` (oldest first) into a short narrative.
    async fn summarize(&self, turns: &[Turn]) -> std::result::Result<String, SummaryError>;
}
