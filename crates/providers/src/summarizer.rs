//! Conversation summarization through a [`Generator`].

use async_trait::async_trait;
use docweave_core::conversation::Turn;
use docweave_core::error::SummaryError;
use docweave_core::generation::{Generator, Payload, Summarizer};
use std::sync::Arc;
use tracing::debug;

const DEFAULT_INSTRUCTIONS: &str = "Summarize the conversation below in a few sentences. \
Keep every concrete requirement the user stated (components, pages, styling, libraries) \
and what the assistant already produced. Reply with the summary only.";

/// Summarizes older turns by asking the model.
pub struct LlmSummarizer {
    generator: Arc<dyn Generator>,
    instructions: String,
}

impl LlmSummarizer {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self {
            generator,
            instructions: DEFAULT_INSTRUCTIONS.to_string(),
        }
    }

    fn build_prompt(&self, turns: &[Turn]) -> String {
        let lines: Vec<String> = turns.iter().map(Turn::render).collect();
        format!(
            "{}\n\nConversation:\n{}\n\nSummary:",
            self.instructions,
            lines.join("\n")
        )
    }
}

#[async_trait]
impl Summarizer for LlmSummarizer {
    fn name(&self) -> &str {
        "llm"
    }

    async fn summarize(&self, turns: &[Turn]) -> Result<String, SummaryError> {
        if turns.is_empty() {
            return Err(SummaryError::Empty);
        }

        debug!(turns = turns.len(), generator = %self.generator.name(), "Summarizing history");
        let summary = self
            .generator
            .invoke(&Payload::text(self.build_prompt(turns)))
            .await?;
        Ok(summary.trim().to_string())
    }
}
