//! The generation orchestrator.
//!
//! One call is one linear pass through a fixed sequence of steps:
//!
//! 1. **Check corpus**: no store, or an empty one, ends in `NO_CORPUS`
//! 2. **Assemble context** from the profile's partition policy
//! 3. **Load history**, summarizing older turns past the token budget
//! 4. **Render payload** from the profile's template (plus image)
//! 5. **Invoke generation**, once, with an optional timeout
//! 6. **Persist** the user and assistant turns
//!
//! Any failure in steps 1-5 ends the call with `FAILED` and nothing is
//! written to the log. A failure in step 6 is logged and the generated
//! content is still returned.

use crate::context::assembler::ContextAssembler;
use crate::history::{HistoryError, bounded_history};
use crate::session_lock::{SerializeMode, SessionLocks};
use docweave_core::conversation::{ConversationLog, SessionId, Turn};
use docweave_core::document::DocumentStore;
use docweave_core::error::{ErrorKind, GenerationError, LogError};
use docweave_core::generation::{EncodedImage, GenerationMode, Generator, Payload, Summarizer};
use docweave_core::profile::GenerationProfile;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Shown when generation is attempted before any corpus was ingested.
pub const NO_CORPUS_MESSAGE: &str = "No vector database found. Please generate vectors first.";

// ── Request / outcome ─────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub profile: GenerationProfile,
    pub mode: GenerationMode,
    pub session_id: SessionId,
    pub prompt: String,
    /// Raw image bytes; required in multimodal mode
    pub image: Option<Vec<u8>>,
}

impl GenerationRequest {
    /// A request in the profile's default mode.
    pub fn new(profile: GenerationProfile, session_id: SessionId, prompt: impl Into<String>) -> Self {
        Self {
            mode: profile.mode,
            profile,
            session_id,
            prompt: prompt.into(),
            image: None,
        }
    }

    pub fn with_mode(mut self, mode: GenerationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_image(mut self, bytes: Vec<u8>) -> Self {
        self.image = Some(bytes);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GenerationStatus {
    NoCorpus,
    Failed,
    Succeeded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutcomeError {
    pub kind: ErrorKind,
    pub message: String,
}

/// What the caller gets back. `content` carries the generated artifact on
/// success and the instructional message on `NO_CORPUS`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationOutcome {
    pub status: GenerationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<OutcomeError>,
}

impl GenerationOutcome {
    pub fn succeeded(content: impl Into<String>) -> Self {
        Self {
            status: GenerationStatus::Succeeded,
            content: Some(content.into()),
            error: None,
        }
    }

    pub fn no_corpus() -> Self {
        Self {
            status: GenerationStatus::NoCorpus,
            content: Some(NO_CORPUS_MESSAGE.to_string()),
            error: None,
        }
    }

    pub fn failed(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            status: GenerationStatus::Failed,
            content: None,
            error: Some(OutcomeError {
                kind,
                message: message.into(),
            }),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == GenerationStatus::Succeeded
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }
}

impl From<HistoryError> for GenerationOutcome {
    fn from(err: HistoryError) -> Self {
        match err {
            HistoryError::Log(e) => Self::failed(ErrorKind::RetrievalError, e.to_string()),
            HistoryError::Summary(e) => Self::failed(ErrorKind::GenerationError, e.to_string()),
        }
    }
}

// ── Orchestrator ──────────────────────────────────────────────────────────

/// Runs generation requests against shared, injected capabilities.
pub struct Orchestrator {
    store: Option<Arc<dyn DocumentStore>>,
    log: Arc<dyn ConversationLog>,
    generator: Arc<dyn Generator>,
    summarizer: Arc<dyn Summarizer>,
    timeout: Option<Duration>,
    serialize: SerializeMode,
    locks: SessionLocks,
}

impl Orchestrator {
    /// An orchestrator without a document store; every request ends in
    /// `NO_CORPUS` until one is attached with [`Orchestrator::with_store`].
    pub fn new(
        log: Arc<dyn ConversationLog>,
        generator: Arc<dyn Generator>,
        summarizer: Arc<dyn Summarizer>,
    ) -> Self {
        Self {
            store: None,
            log,
            generator,
            summarizer,
            timeout: None,
            serialize: SerializeMode::default(),
            locks: SessionLocks::new(),
        }
    }

    pub fn with_store(mut self, store: Arc<dyn DocumentStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Bound each generation call. No bound by default.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_serialize_mode(mut self, mode: SerializeMode) -> Self {
        self.serialize = mode;
        self
    }

    pub async fn generate(&self, request: GenerationRequest) -> GenerationOutcome {
        self.generate_cancellable(request, CancellationToken::new())
            .await
    }

    /// Like [`Orchestrator::generate`], aborting when `cancel` fires.
    ///
    /// Cancellation is honoured up to persistence. A cancelled request
    /// writes nothing to the conversation log.
    pub async fn generate_cancellable(
        &self,
        request: GenerationRequest,
        cancel: CancellationToken,
    ) -> GenerationOutcome {
        info!(
            session = %request.session_id,
            profile = %request.profile.name,
            mode = %request.mode,
            "Generation requested"
        );

        let work = async {
            let guard = match self.serialize {
                SerializeMode::WholePipeline => {
                    Some(self.locks.acquire(&request.session_id).await)
                }
                SerializeMode::PersistOnly => None,
            };
            self.produce(&request).await.map(|content| (content, guard))
        };

        let produced = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = work => Some(result),
        };

        let (content, guard) = match produced {
            None => return Self::cancelled(&request.session_id),
            Some(Err(outcome)) => {
                if let Some(err) = &outcome.error {
                    warn!(session = %request.session_id, kind = %err.kind, error = %err.message, "Generation failed");
                }
                return outcome;
            }
            Some(Ok(produced)) => produced,
        };

        if cancel.is_cancelled() {
            return Self::cancelled(&request.session_id);
        }

        let _guard = match guard {
            Some(g) => g,
            None => self.locks.acquire(&request.session_id).await,
        };
        if let Err(e) = self.persist(&request, &content).await {
            error!(session = %request.session_id, error = %e, "Failed to persist turns; returning result anyway");
        }

        info!(session = %request.session_id, chars = content.len(), "Generation succeeded");
        GenerationOutcome::succeeded(content)
    }

    /// Drop every turn recorded for `session`.
    pub async fn clear_session(&self, session: &SessionId) -> Result<(), LogError> {
        let _guard = self.locks.acquire(session).await;
        self.log.clear(session).await?;
        info!(session = %session, "Session history cleared");
        Ok(())
    }

    /// Steps 1-5. On error the returned outcome is terminal.
    async fn produce(&self, request: &GenerationRequest) -> Result<String, GenerationOutcome> {
        let profile = &request.profile;

        // CHECK_CORPUS_READY
        let Some(store) = &self.store else {
            info!("No document store attached");
            return Err(GenerationOutcome::no_corpus());
        };
        match store.is_ready().await {
            Ok(true) => {}
            Ok(false) => {
                info!(store = %store.name(), "Document store is empty");
                return Err(GenerationOutcome::no_corpus());
            }
            Err(e) => return Err(GenerationOutcome::failed(ErrorKind::RetrievalError, e.to_string())),
        }

        // ASSEMBLE_CONTEXT
        let bundle = ContextAssembler::new(store.clone())
            .assemble(&profile.policy, &request.prompt)
            .await
            .map_err(|e| GenerationOutcome::failed(ErrorKind::RetrievalError, e.to_string()))?;

        // LOAD_HISTORY
        let history = bounded_history(
            self.log.as_ref(),
            self.summarizer.as_ref(),
            &request.session_id,
            profile.history.token_budget,
            profile.history.keep_last_n,
        )
        .await?;

        // RENDER_PAYLOAD
        let context = bundle.render(&profile.policy);
        let text = profile
            .template
            .render(&context, history.as_deref(), &request.prompt);
        let payload = self.build_payload(request, text)?;
        debug!(
            session = %request.session_id,
            payload_len = payload.text.len(),
            has_history = history.is_some(),
            "Payload rendered"
        );

        // INVOKE_GENERATION
        self.invoke(&payload)
            .await
            .map_err(|e| GenerationOutcome::failed(ErrorKind::GenerationError, e.to_string()))
    }

    fn build_payload(
        &self,
        request: &GenerationRequest,
        text: String,
    ) -> Result<Payload, GenerationOutcome> {
        match request.mode {
            GenerationMode::Text => {
                if request.image.is_some() {
                    warn!(session = %request.session_id, "Ignoring image attached to a text-mode request");
                }
                Ok(Payload::text(text))
            }
            GenerationMode::Multimodal => {
                let Some(bytes) = request.image.as_deref().filter(|b| !b.is_empty()) else {
                    return Err(GenerationOutcome::failed(
                        ErrorKind::InvalidRequest,
                        "multimodal generation requires an image",
                    ));
                };
                if !self.generator.supports_images() {
                    return Err(GenerationOutcome::failed(
                        ErrorKind::GenerationError,
                        GenerationError::UnsupportedMode(format!(
                            "{} does not accept images",
                            self.generator.name()
                        ))
                        .to_string(),
                    ));
                }
                Ok(Payload::multimodal(text, EncodedImage::from_bytes(bytes)))
            }
        }
    }

    async fn invoke(&self, payload: &Payload) -> Result<String, GenerationError> {
        let call = self.generator.invoke(payload);
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| GenerationError::Timeout {
                    timeout_secs: limit.as_secs(),
                })?,
            None => call.await,
        }
    }

    async fn persist(&self, request: &GenerationRequest, content: &str) -> Result<(), LogError> {
        // An assistant turn is only ever appended after its user turn.
        self.log
            .append(&request.session_id, Turn::user(request.prompt.clone()))
            .await?;
        self.log
            .append(&request.session_id, Turn::assistant(content))
            .await
    }

    fn cancelled(session: &SessionId) -> GenerationOutcome {
        info!(session = %session, "Generation cancelled before persistence");
        GenerationOutcome::failed(ErrorKind::Cancelled, "request cancelled by caller")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{FixedSummarizer, MockLog, MockStore, ScriptedGenerator, turns};
    use docweave_core::conversation::Role;
    use docweave_core::label::Label;
    use docweave_core::policy::{CorpusPartitionPolicy, PayloadTemplate};
    use docweave_core::profile::HistorySettings;
    use std::sync::atomic::Ordering;

    fn profile(mode: GenerationMode) -> GenerationProfile {
        let policy = CorpusPartitionPolicy::builder()
            .always_include(Label::TAILWIND_UI_KIT)
            .always_include(Label::TAILWIND_TEMPLATES)
            .section(
                "STYLING REFERENCE",
                vec![Label::TAILWIND_UI_KIT, Label::TAILWIND_TEMPLATES],
            )
            .ranked_section("OTHER RELEVANT DOCS")
            .top_k(2)
            .build()
            .unwrap();
        let template = PayloadTemplate::new(
            "Context:\n{context}\n\nChat History:\n{history}\n\nUser Request:\n{prompt}",
        )
        .unwrap();
        GenerationProfile::new(
            "test",
            mode,
            policy,
            template,
            HistorySettings {
                token_budget: 200,
                keep_last_n: 2,
            },
        )
        .unwrap()
    }

    fn store() -> MockStore {
        MockStore::new(vec![
            (Label::TAILWIND_UI_KIT, "navbar card"),
            (Label::TAILWIND_TEMPLATES, "landing hero"),
            (Label::REACT, "useState hook"),
            (Label::AXIOS, "axios get request"),
            (Label::REACT_ROUTER, "route navigate"),
        ])
    }

    struct Harness {
        store: Arc<MockStore>,
        log: Arc<MockLog>,
        generator: Arc<ScriptedGenerator>,
        summarizer: Arc<FixedSummarizer>,
    }

    impl Harness {
        fn new(store: MockStore, log: MockLog, generator: ScriptedGenerator) -> Self {
            Self {
                store: Arc::new(store),
                log: Arc::new(log),
                generator: Arc::new(generator),
                summarizer: Arc::new(FixedSummarizer::new("earlier work")),
            }
        }

        fn standard() -> Self {
            Self::new(store(), MockLog::new(), ScriptedGenerator::replying("<App/>"))
        }

        fn orchestrator(&self) -> Orchestrator {
            Orchestrator::new(
                self.log.clone(),
                self.generator.clone(),
                self.summarizer.clone(),
            )
            .with_store(self.store.clone())
        }
    }

    fn request(prompt: &str) -> GenerationRequest {
        GenerationRequest::new(profile(GenerationMode::Text), SessionId::from("s1"), prompt)
    }

    #[tokio::test]
    async fn success_persists_both_turns() {
        let h = Harness::standard();
        let out = h.orchestrator().generate(request("axios request")).await;

        assert_eq!(out, GenerationOutcome::succeeded("<App/>"));
        let logged = h.log.turns(&SessionId::from("s1"));
        assert_eq!(logged.len(), 2);
        assert_eq!(logged[0], Turn { timestamp: logged[0].timestamp, ..Turn::user("axios request") });
        assert_eq!(logged[1].content, "<App/>");
    }

    #[tokio::test]
    async fn payload_carries_sections_history_and_prompt() {
        let session = SessionId::from("s1");
        let h = Harness::new(
            store(),
            MockLog::with_turns(&session, vec![Turn::user("make a navbar"), Turn::assistant("<Nav/>")]),
            ScriptedGenerator::replying("<App/>"),
        );
        h.orchestrator().generate(request("axios request")).await;

        let payload = h.generator.last_payload().unwrap();
        assert_eq!(payload.mode, GenerationMode::Text);
        assert!(payload.image.is_none());
        assert!(payload.text.contains("[STYLING REFERENCE]\nnavbar card\nlanding hero"));
        assert!(payload.text.contains("[OTHER RELEVANT DOCS]\naxios get request"));
        assert!(payload.text.contains("Chat History:\nUSER: make a navbar\nASSISTANT: <Nav/>"));
        assert!(payload.text.ends_with("User Request:\naxios request"));
    }

    #[tokio::test]
    async fn first_turn_renders_empty_history() {
        let h = Harness::standard();
        h.orchestrator().generate(request("hook")).await;
        let payload = h.generator.last_payload().unwrap();
        assert!(payload.text.contains("Chat History:\n\n\nUser Request:"));
    }

    #[tokio::test]
    async fn no_store_is_no_corpus() {
        let h = Harness::standard();
        let orch = Orchestrator::new(h.log.clone(), h.generator.clone(), h.summarizer.clone());
        let out = orch.generate(request("x")).await;

        assert_eq!(out.status, GenerationStatus::NoCorpus);
        assert_eq!(out.content.as_deref(), Some(NO_CORPUS_MESSAGE));
        assert_eq!(h.generator.calls(), 0);
        assert!(h.log.turns(&SessionId::from("s1")).is_empty());
    }

    #[tokio::test]
    async fn empty_store_is_no_corpus() {
        let h = Harness::new(MockStore::new(vec![]), MockLog::new(), ScriptedGenerator::replying("x"));
        let out = h.orchestrator().generate(request("x")).await;
        assert_eq!(out, GenerationOutcome::no_corpus());
    }

    #[tokio::test]
    async fn empty_partition_still_succeeds() {
        let h = Harness::new(
            MockStore::new(vec![
                (Label::TAILWIND_TEMPLATES, "landing hero"),
                (Label::REACT, "useState hook"),
            ]),
            MockLog::new(),
            ScriptedGenerator::replying("<App/>"),
        );
        let out = h.orchestrator().generate(request("hook")).await;
        assert!(out.is_success());
        let payload = h.generator.last_payload().unwrap();
        assert!(payload.text.contains("[STYLING REFERENCE]\n\nlanding hero"));
    }

    #[tokio::test]
    async fn search_failure_fails_without_append() {
        let h = Harness::new(
            store().failing_search(),
            MockLog::new(),
            ScriptedGenerator::replying("x"),
        );
        let out = h.orchestrator().generate(request("axios")).await;

        assert_eq!(out.status, GenerationStatus::Failed);
        assert_eq!(out.error_kind(), Some(ErrorKind::RetrievalError));
        assert!(out.content.is_none());
        assert_eq!(h.log.append_attempts.load(Ordering::SeqCst), 0);
        assert_eq!(h.generator.calls(), 0);
    }

    #[tokio::test]
    async fn append_failure_still_succeeds() {
        let h = Harness::new(
            store(),
            MockLog::new().failing_append(),
            ScriptedGenerator::replying("<App/>"),
        );
        let out = h.orchestrator().generate(request("axios")).await;

        assert_eq!(out, GenerationOutcome::succeeded("<App/>"));
        // The assistant append is skipped once the user append fails.
        assert_eq!(h.log.append_attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn log_read_failure_is_retrieval_error() {
        let h = Harness::new(store(), MockLog::new().failing_read(), ScriptedGenerator::replying("x"));
        let out = h.orchestrator().generate(request("axios")).await;
        assert_eq!(out.error_kind(), Some(ErrorKind::RetrievalError));
    }

    #[tokio::test]
    async fn summarizer_failure_is_generation_error() {
        let session = SessionId::from("s1");
        let mut h = Harness::new(store(), MockLog::with_turns(&session, turns(40)), ScriptedGenerator::replying("x"));
        h.summarizer = Arc::new(FixedSummarizer::failing());
        let mut req = request("axios");
        req.profile.history.token_budget = 10;

        let out = h.orchestrator().generate(req).await;
        assert_eq!(out.error_kind(), Some(ErrorKind::GenerationError));
        assert_eq!(h.generator.calls(), 0);
    }

    #[tokio::test]
    async fn long_history_is_summarized_in_payload() {
        let session = SessionId::from("s1");
        let h = Harness::new(store(), MockLog::with_turns(&session, turns(40)), ScriptedGenerator::replying("x"));
        let mut req = request("axios");
        req.profile.history.token_budget = 20;

        assert!(h.orchestrator().generate(req).await.is_success());
        let payload = h.generator.last_payload().unwrap();
        assert!(payload.text.contains("SUMMARY: earlier work\nUSER: t38\nASSISTANT: t39"));
        assert!(!payload.text.contains("USER: t0\n"));
        assert_eq!(h.summarizer.calls(), 1);
    }

    #[tokio::test]
    async fn generator_failure_is_generation_error() {
        let h = Harness::new(
            store(),
            MockLog::new(),
            ScriptedGenerator::failing(GenerationError::RateLimited { retry_after_secs: 3 }),
        );
        let out = h.orchestrator().generate(request("axios")).await;

        assert_eq!(out.error_kind(), Some(ErrorKind::GenerationError));
        assert!(out.error.unwrap().message.contains("retry after 3s"));
        assert_eq!(h.generator.calls(), 1);
        assert_eq!(h.log.append_attempts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_generation_times_out() {
        let h = Harness::new(
            store(),
            MockLog::new(),
            ScriptedGenerator::replying("late").with_delay(Duration::from_secs(30)),
        );
        let out = h
            .orchestrator()
            .with_timeout(Duration::from_secs(5))
            .generate(request("axios"))
            .await;

        assert_eq!(out.error_kind(), Some(ErrorKind::GenerationError));
        assert!(out.error.unwrap().message.contains("5s"));
        assert!(h.log.turns(&SessionId::from("s1")).is_empty());
    }

    #[tokio::test]
    async fn assistant_append_failure_still_succeeds() {
        let h = Harness::new(
            store(),
            MockLog::new().failing_append_after(1),
            ScriptedGenerator::replying("<App/>"),
        );
        let out = h.orchestrator().generate(request("axios")).await;

        assert_eq!(out, GenerationOutcome::succeeded("<App/>"));
        assert_eq!(h.log.append_attempts.load(Ordering::SeqCst), 2);
        let logged = h.log.turns(&SessionId::from("s1"));
        assert_eq!(logged.len(), 1);
        assert_eq!(logged[0].role, Role::User);
    }

    #[tokio::test]
    async fn image_only_request_uses_partitions_without_search() {
        let h = Harness::standard();
        let png = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        let req = GenerationRequest::new(
            profile(GenerationMode::Multimodal),
            SessionId::from("s1"),
            "",
        )
        .with_image(png);
        let out = h.orchestrator().generate(req).await;

        assert_eq!(out, GenerationOutcome::succeeded("<App/>"));
        assert!(h.store.search_calls().is_empty());
        let payload = h.generator.last_payload().unwrap();
        assert!(payload.text.contains("[STYLING REFERENCE]\nnavbar card\nlanding hero"));
        assert_eq!(payload.image.unwrap().media_type, "image/png");
    }

    #[tokio::test]
    async fn multimodal_without_image_is_invalid() {
        let h = Harness::standard();
        let req = GenerationRequest::new(
            profile(GenerationMode::Multimodal),
            SessionId::from("s1"),
            "build this",
        );
        let out = h.orchestrator().generate(req).await;
        assert_eq!(out.error_kind(), Some(ErrorKind::InvalidRequest));
        assert_eq!(h.generator.calls(), 0);
    }

    #[tokio::test]
    async fn multimodal_attaches_encoded_image() {
        let h = Harness::standard();
        let png = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        let req = GenerationRequest::new(
            profile(GenerationMode::Multimodal),
            SessionId::from("s1"),
            "build this screen",
        )
        .with_image(png);

        assert!(h.orchestrator().generate(req).await.is_success());
        let payload = h.generator.last_payload().unwrap();
        assert_eq!(payload.mode, GenerationMode::Multimodal);
        assert_eq!(payload.image.unwrap().media_type, "image/png");
    }

    #[tokio::test]
    async fn multimodal_on_text_only_generator_fails() {
        let h = Harness::new(store(), MockLog::new(), ScriptedGenerator::replying("x").text_only());
        let req = request("build this")
            .with_mode(GenerationMode::Multimodal)
            .with_image(b"GIF89a".to_vec());
        let out = h.orchestrator().generate(req).await;
        assert_eq!(out.error_kind(), Some(ErrorKind::GenerationError));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_persists_nothing() {
        let h = Harness::new(
            store(),
            MockLog::new(),
            ScriptedGenerator::replying("<App/>").with_delay(Duration::from_secs(10)),
        );
        let orch = h.orchestrator();
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let out = orch.generate_cancellable(request("axios"), cancel).await;
        assert_eq!(out.error_kind(), Some(ErrorKind::Cancelled));
        assert_eq!(h.log.append_attempts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn already_cancelled_skips_everything() {
        let h = Harness::standard();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let out = h.orchestrator().generate_cancellable(request("axios"), cancel).await;
        assert_eq!(out.error_kind(), Some(ErrorKind::Cancelled));
        assert_eq!(h.generator.calls(), 0);
    }

    #[tokio::test]
    async fn whole_pipeline_mode_orders_same_session_turns() {
        let h = Harness::new(
            store(),
            MockLog::new(),
            ScriptedGenerator::replying("<App/>").with_delay(Duration::from_millis(30)),
        );
        let orch = h.orchestrator().with_serialize_mode(SerializeMode::WholePipeline);

        let (a, b) = tokio::join!(
            orch.generate(request("first hook")),
            orch.generate(request("second hook"))
        );
        assert!(a.is_success() && b.is_success());

        let payloads = h.generator.payloads.lock().unwrap().clone();
        assert!(payloads[1].text.contains("USER: first hook\nASSISTANT: <App/>"));
        assert_eq!(h.log.turns(&SessionId::from("s1")).len(), 4);
    }

    #[tokio::test]
    async fn sessions_do_not_share_history() {
        let h = Harness::standard();
        let orch = h.orchestrator();
        orch.generate(request("hook")).await;

        let other = GenerationRequest::new(profile(GenerationMode::Text), SessionId::from("s2"), "route");
        orch.generate(other).await;
        let payload = h.generator.last_payload().unwrap();
        assert!(!payload.text.contains("USER: hook"));
    }

    #[tokio::test]
    async fn clear_session_forgets_history() {
        let h = Harness::standard();
        let orch = h.orchestrator();
        orch.generate(request("hook")).await;
        orch.clear_session(&SessionId::from("s1")).await.unwrap();
        assert!(h.log.turns(&SessionId::from("s1")).is_empty());
    }

    #[test]
    fn outcome_serializes_screaming_snake() {
        let json = serde_json::to_value(GenerationOutcome::failed(ErrorKind::RetrievalError, "down")).unwrap();
        assert_eq!(json["status"], "FAILED");
        assert_eq!(json["error"]["kind"], "RETRIEVAL_ERROR");
        assert!(json.get("content").is_none());

        let json = serde_json::to_value(GenerationOutcome::no_corpus()).unwrap();
        assert_eq!(json["status"], "NO_CORPUS");
    }
}
