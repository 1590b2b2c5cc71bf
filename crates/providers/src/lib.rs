//! Model provider implementations for DocWeave.
//!
//! Everything here speaks the OpenAI-compatible HTTP API:
//! - [`OpenAiCompatGenerator`]: text and multimodal chat completions
//! - [`OpenAiEmbedder`]: `/embeddings` for corpus and query vectors
//! - [`LlmSummarizer`]: history summarization on top of any generator

pub mod embedder;
pub mod openai_compat;
pub mod summarizer;

#[cfg(test)]
pub(crate) mod test_server;

pub use embedder::OpenAiEmbedder;
pub use openai_compat::OpenAiCompatGenerator;
pub use summarizer::LlmSummarizer;
