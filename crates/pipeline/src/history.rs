//! Budget-bounded conversation history.
//!
//! Renders a session's turns as `ROLE: content` lines. When the full log is
//! over the token budget, everything but the most recent turns is replaced by
//! a model-written summary. Summaries are never written back to the log.

use crate::context::token::{estimate_tokens, max_bytes_for, truncate_to_bytes};
use docweave_core::conversation::{ConversationLog, SessionId, Turn};
use docweave_core::error::{LogError, SummaryError};
use docweave_core::generation::Summarizer;
use thiserror::Error;
use tracing::{debug, warn};

const SUMMARY_PREFIX: &str = "SUMMARY: ";

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error(transparent)]
    Log(#[from] LogError),

    #[error(transparent)]
    Summary(#[from] SummaryError),
}

/// Load and render the history for `session`, bounded by `token_budget`.
///
/// Returns `None` for a session with no turns. The output fits the budget
/// unless the last `keep_last_n` turns alone already exceed it; those are
/// never cut, so the overflow is returned as is.
pub async fn bounded_history(
    log: &dyn ConversationLog,
    summarizer: &dyn Summarizer,
    session: &SessionId,
    token_budget: usize,
    keep_last_n: usize,
) -> Result<Option<String>, HistoryError> {
    let turns = log.read(session).await?;
    if turns.is_empty() {
        return Ok(None);
    }

    let full = render_lines(&turns);
    let full_tokens = estimate_tokens(&full);
    if full_tokens <= token_budget || turns.len() <= keep_last_n {
        if full_tokens > token_budget {
            warn!(session = %session, tokens = full_tokens, budget = token_budget, "History over budget with nothing to summarize");
        }
        return Ok(Some(full));
    }

    let split = turns.len() - keep_last_n;
    let (older, recent) = turns.split_at(split);
    let recent_text = render_lines(recent);

    let summary = summarizer.summarize(older).await?;
    debug!(
        session = %session,
        summarized = older.len(),
        kept = recent.len(),
        summary_len = summary.len(),
        "History summarized"
    );

    let overhead = SUMMARY_PREFIX.len() + 1 + recent_text.len();
    let room = max_bytes_for(token_budget).saturating_sub(overhead);
    let summary = truncate_to_bytes(summary.trim(), room);

    if summary.is_empty() {
        if estimate_tokens(&recent_text) > token_budget {
            warn!(
                session = %session,
                kept = recent.len(),
                budget = token_budget,
                "Recent turns alone exceed the history budget"
            );
        }
        return Ok(Some(recent_text));
    }

    if recent_text.is_empty() {
        return Ok(Some(format!("{SUMMARY_PREFIX}{summary}")));
    }
    Ok(Some(format!("{SUMMARY_PREFIX}{summary}\n{recent_text}")))
}

fn render_lines(turns: &[Turn]) -> String {
    turns.iter().map(Turn::render).collect::<Vec<_>>().join("\n")
}
