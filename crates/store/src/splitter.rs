//! Chunking of documentation text before embedding.
//!
//! Wraps [`text_splitter::TextSplitter`] with a character-counted capacity.
//! Text is cut at the coarsest boundary that fits (paragraph breaks, then
//! sentences, words and graphemes), so no chunk exceeds `chunk_size` chars.
//! Consecutive chunks share up to `chunk_overlap` chars.

use text_splitter::{ChunkConfig, ChunkConfigError, TextSplitter};

pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 100;

pub struct CharacterSplitter {
    inner: TextSplitter<text_splitter::Characters>,
}

impl CharacterSplitter {
    /// Fails when `chunk_overlap` is not smaller than `chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, ChunkConfigError> {
        let config = ChunkConfig::new(chunk_size)
            .with_overlap(chunk_overlap)?
            .with_trim(true);
        Ok(Self {
            inner: TextSplitter::new(config),
        })
    }

    /// Split `text` into trimmed, non-empty chunks in document order.
    pub fn split(&self, text: &str) -> Vec<String> {
        self.inner.chunks(text).map(str::to_owned).collect()
    }
}
