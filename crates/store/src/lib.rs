//! Storage implementations for DocWeave.
//!
//! - [`InMemoryCorpus`]: the reference document store, brute-force cosine
//!   ranking with JSONL snapshots on disk
//! - [`HashEmbedder`]: offline, deterministic feature-hashing embedder
//! - Conversation logs: in-memory, JSONL file, SQLite
//! - [`ingest`]: turns scraped documentation files into labelled chunks

pub mod corpus;
pub mod file_log;
pub mod hash_embedder;
pub mod in_memory_log;
pub mod ingest;
pub mod splitter;
pub mod vector;

#[cfg(feature = "sqlite")]
pub mod sqlite_log;

pub use corpus::InMemoryCorpus;
pub use file_log::FileConversationLog;
pub use hash_embedder::HashEmbedder;
pub use in_memory_log::InMemoryConversationLog;
pub use ingest::{IngestError, IngestOptions, IngestReport, ingest_dir, label_from_path};
pub use splitter::CharacterSplitter;
pub use vector::{cosine_similarity, rank_by_similarity};

#[cfg(feature = "sqlite")]
pub use sqlite_log::SqliteConversationLog;
