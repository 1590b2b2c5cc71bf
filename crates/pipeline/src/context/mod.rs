//! Context assembly for generation prompts.
//!
//! | Part | Source | Budget |
//! |------|--------|--------|
//! | Always-included partitions | Whole label partitions | None, always complete |
//! | Ranked supplement | Top-K similarity search | K chunks |
//! | Conversation history | Session log, see [`crate::history`] | Estimated tokens |

pub mod assembler;
pub mod token;

pub use assembler::{ContextAssembler, ContextBundle, ContextWarning};
