//! Token estimation utilities.
//!
//! Uses a character-based heuristic: ~4 bytes per token, rounded up. Close
//! enough for BPE tokenizers on English text and code, and fully
//! deterministic, which is what budget enforcement needs.

/// Bytes per estimated token.
pub const BYTES_PER_TOKEN: usize = 4;

/// Estimate the token count for a string.
pub fn estimate_tokens(text: &str) -> usize {
    text.len().div_ceil(BYTES_PER_TOKEN)
}

/// Largest byte length that still fits in `tokens`.
pub fn max_bytes_for(tokens: usize) -> usize {
    tokens.saturating_mul(BYTES_PER_TOKEN)
}

/// Truncate `text` to at most `max_bytes`, backing off to a char boundary.
pub fn truncate_to_bytes(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
