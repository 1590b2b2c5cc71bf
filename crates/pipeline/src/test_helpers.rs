//! Shared scripted capabilities for pipeline tests.

use async_trait::async_trait;
use docweave_core::conversation::{ConversationLog, SessionId, Turn};
use docweave_core::document::{Chunk, DocumentStore};
use docweave_core::error::{GenerationError, LogError, RetrievalError, SummaryError};
use docweave_core::generation::{Generator, Payload, Summarizer};
use docweave_core::label::Label;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// One recorded `search` call.
#[derive(Debug, Clone)]
pub struct SearchCall {
    pub query: String,
    pub k: usize,
    pub exclude: Vec<Label>,
}

/// An in-memory document store with a deterministic word-overlap ranking.
///
/// A chunk scores one point per distinct query word it contains; ties keep
/// insertion order.
#[derive(Default)]
pub struct MockStore {
    chunks: Vec<Chunk>,
    fail_search: bool,
    fail_labels: bool,
    pub searches: Mutex<Vec<SearchCall>>,
    pub label_reads: Mutex<Vec<Label>>,
}

impl MockStore {
    pub fn new(chunks: Vec<(Label, &str)>) -> Self {
        Self {
            chunks: chunks
                .into_iter()
                .enumerate()
                .map(|(i, (label, content))| Chunk {
                    id: format!("c{i}"),
                    content: content.to_string(),
                    label,
                    embedding: Vec::new(),
                })
                .collect(),
            ..Self::default()
        }
    }

    /// Every `search` and `list` call fails.
    pub fn failing_search(mut self) -> Self {
        self.fail_search = true;
        self
    }

    /// Every `get_by_label` call fails.
    pub fn failing_labels(mut self) -> Self {
        self.fail_labels = true;
        self
    }

    pub fn search_calls(&self) -> Vec<SearchCall> {
        self.searches.lock().unwrap().clone()
    }

    fn score(content: &str, query: &str) -> usize {
        let content = content.to_lowercase();
        let mut words: Vec<String> = query
            .split_whitespace()
            .map(|w| w.to_lowercase())
            .collect();
        words.sort();
        words.dedup();
        words.iter().filter(|w| content.contains(w.as_str())).count()
    }
}

#[async_trait]
impl DocumentStore for MockStore {
    fn name(&self) -> &str {
        "mock"
    }

    async fn get_by_label(&self, label: &Label) -> Result<Vec<Chunk>, RetrievalError> {
        self.label_reads.lock().unwrap().push(label.clone());
        if self.fail_labels {
            return Err(RetrievalError::Unavailable("connection refused".into()));
        }
        Ok(self
            .chunks
            .iter()
            .filter(|c| c.label == *label)
            .cloned()
            .collect())
    }

    async fn search(
        &self,
        query: &str,
        k: usize,
        exclude: &[Label],
    ) -> Result<Vec<Chunk>, RetrievalError> {
        self.searches.lock().unwrap().push(SearchCall {
            query: query.to_string(),
            k,
            exclude: exclude.to_vec(),
        });
        if self.fail_search {
            return Err(RetrievalError::Unavailable("connection refused".into()));
        }
        let mut scored: Vec<(usize, &Chunk)> = self
            .chunks
            .iter()
            .filter(|c| !exclude.contains(&c.label))
            .map(|c| (Self::score(&c.content, query), c))
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(scored.into_iter().take(k).map(|(_, c)| c.clone()).collect())
    }

    async fn list(&self, exclude: &[Label]) -> Result<Vec<Chunk>, RetrievalError> {
        if self.fail_search {
            return Err(RetrievalError::Unavailable("connection refused".into()));
        }
        Ok(self
            .chunks
            .iter()
            .filter(|c| !exclude.contains(&c.label))
            .cloned()
            .collect())
    }

    async fn len(&self) -> Result<usize, RetrievalError> {
        Ok(self.chunks.len())
    }
}

/// A conversation log whose reads or appends can be made to fail.
#[derive(Default)]
pub struct MockLog {
    sessions: Mutex<HashMap<SessionId, Vec<Turn>>>,
    fail_read: bool,
    /// Appends at or past this attempt index fail.
    fail_append_from: Option<usize>,
    pub append_attempts: AtomicUsize,
}

impl MockLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_turns(session: &SessionId, turns: Vec<Turn>) -> Self {
        let log = Self::default();
        log.sessions.lock().unwrap().insert(session.clone(), turns);
        log
    }

    pub fn failing_read(mut self) -> Self {
        self.fail_read = true;
        self
    }

    pub fn failing_append(self) -> Self {
        self.failing_append_after(0)
    }

    /// Let the first `n` appends through, then fail every later one.
    pub fn failing_append_after(mut self, n: usize) -> Self {
        self.fail_append_from = Some(n);
        self
    }

    pub fn turns(&self, session: &SessionId) -> Vec<Turn> {
        self.sessions
            .lock()
            .unwrap()
            .get(session)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl ConversationLog for MockLog {
    fn name(&self) -> &str {
        "mock"
    }

    async fn read(&self, session: &SessionId) -> Result<Vec<Turn>, LogError> {
        if self.fail_read {
            return Err(LogError::Storage("disk unplugged".into()));
        }
        Ok(self.turns(session))
    }

    async fn append(&self, session: &SessionId, turn: Turn) -> Result<(), LogError> {
        let attempt = self.append_attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_append_from.is_some_and(|n| attempt >= n) {
            return Err(LogError::Storage("disk full".into()));
        }
        self.sessions
            .lock()
            .unwrap()
            .entry(session.clone())
            .or_default()
            .push(turn);
        Ok(())
    }

    async fn clear(&self, session: &SessionId) -> Result<(), LogError> {
        self.sessions.lock().unwrap().remove(session);
        Ok(())
    }
}

/// A generator that returns a fixed reply and records every payload.
pub struct ScriptedGenerator {
    reply: Result<String, GenerationError>,
    delay: Option<Duration>,
    vision: bool,
    pub payloads: Mutex<Vec<Payload>>,
}

impl ScriptedGenerator {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            delay: None,
            vision: true,
            payloads: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(err: GenerationError) -> Self {
        Self {
            reply: Err(err),
            ..Self::replying("")
        }
    }

    /// Sleep before answering (for timeout and cancellation tests).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn text_only(mut self) -> Self {
        self.vision = false;
        self
    }

    pub fn calls(&self) -> usize {
        self.payloads.lock().unwrap().len()
    }

    pub fn last_payload(&self) -> Option<Payload> {
        self.payloads.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    fn supports_images(&self) -> bool {
        self.vision
    }

    async fn invoke(&self, payload: &Payload) -> Result<String, GenerationError> {
        self.payloads.lock().unwrap().push(payload.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.reply.clone()
    }
}

/// A summarizer that returns a fixed string and counts the turns it saw.
pub struct FixedSummarizer {
    reply: Result<String, SummaryError>,
    pub seen: Mutex<Vec<usize>>,
}

impl FixedSummarizer {
    pub fn new(summary: &str) -> Self {
        Self {
            reply: Ok(summary.to_string()),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: Err(SummaryError::Generation(GenerationError::Network(
                "summarizer offline".into(),
            ))),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

#[async_trait]
impl Summarizer for FixedSummarizer {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn summarize(&self, turns: &[Turn]) -> Result<String, SummaryError> {
        self.seen.lock().unwrap().push(turns.len());
        self.reply.clone()
    }
}

/// Alternating user/assistant turns `t0..t{n-1}`.
pub fn turns(n: usize) -> Vec<Turn> {
    (0..n)
        .map(|i| {
            if i % 2 == 0 {
                Turn::user(format!("t{i}"))
            } else {
                Turn::assistant(format!("t{i}"))
            }
        })
        .collect()
}
