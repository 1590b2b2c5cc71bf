//! Generation profiles: everything that used to distinguish one agent
//! variant from another, as a single value.

use serde::Serialize;

use crate::error::PolicyError;
use crate::generation::GenerationMode;
use crate::policy::{CorpusPartitionPolicy, PayloadTemplate};

/// Bounds on the conversation history folded into a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HistorySettings {
    /// Estimated-token ceiling for the rendered history
    pub token_budget: usize,
    /// Most recent turns always kept verbatim
    pub keep_last_n: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationProfile {
    pub name: String,
    /// Model override for this profile; `None` uses the provider default
    pub model: Option<String>,
    pub mode: GenerationMode,
    pub policy: CorpusPartitionPolicy,
    pub template: PayloadTemplate,
    pub history: HistorySettings,
}

impl GenerationProfile {
    pub fn new(
        name: impl Into<String>,
        mode: GenerationMode,
        policy: CorpusPartitionPolicy,
        template: PayloadTemplate,
        history: HistorySettings,
    ) -> Result<Self, PolicyError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(PolicyError::InvalidProfile("profile name is empty".into()));
        }
        if history.token_budget == 0 {
            return Err(PolicyError::InvalidProfile(format!(
                "profile '{name}': token_budget must be > 0"
            )));
        }
        Ok(Self {
            name,
            model: None,
            mode,
            policy,
            template,
            history,
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}
