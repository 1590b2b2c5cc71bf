//! The DocWeave generation pipeline.
//!
//! A request flows through one [`Orchestrator`] configured by a
//! [`GenerationProfile`](docweave_core::GenerationProfile):
//!
//! 1. **Check** that a corpus has been ingested
//! 2. **Assemble** always-included partitions and the ranked supplement
//! 3. **Load** conversation history within a token budget
//! 4. **Render** the profile's payload template
//! 5. **Generate**, then persist the exchange to the session log
//!
//! Every capability is an injected `Arc<dyn Trait>` from `docweave-core`;
//! nothing here touches the network or disk directly.

pub mod context;
pub mod history;
pub mod orchestrator;
pub mod session_lock;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use context::{ContextAssembler, ContextBundle, ContextWarning};
pub use history::{HistoryError, bounded_history};
pub use orchestrator::{
    GenerationOutcome, GenerationRequest, GenerationStatus, NO_CORPUS_MESSAGE, Orchestrator,
    OutcomeError,
};
pub use session_lock::{SerializeMode, SessionLocks};
