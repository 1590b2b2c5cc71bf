//! # DocWeave Core
//!
//! Domain types, capability traits, and error definitions for DocWeave.
//! This crate has **no storage or network dependencies**: it defines the
//! model that the store, provider and pipeline crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external capability (document store, conversation log, generation,
//! summarization, embeddings) is a trait here. Implementations live in their
//! respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with scripted mock implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod conversation;
pub mod document;
pub mod error;
pub mod generation;
pub mod label;
pub mod policy;
pub mod profile;

// Re-export key types at crate root for ergonomics
pub use conversation::{ConversationLog, Role, SessionId, Turn};
pub use document::{Chunk, DocumentStore, Embedder};
pub use error::{
    ErrorKind, GenerationError, LogError, PolicyError, RetrievalError, SummaryError,
};
pub use generation::{EncodedImage, GenerationMode, Generator, Payload, Summarizer};
pub use label::Label;
pub use policy::{
    CorpusPartitionPolicy, InclusionMode, PartitionRule, PayloadTemplate, PolicyBuilder,
    RetrievalStrategy, Section, SectionSource,
};
pub use profile::{GenerationProfile, HistorySettings};
