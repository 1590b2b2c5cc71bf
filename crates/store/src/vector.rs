//! Vector similarity utilities.
//!
//! Pure-Rust implementations of:
//! - Cosine similarity
//! - Stable top-k ranking of chunks against a query embedding

use docweave_core::document::Chunk;

/// Compute cosine similarity between two vectors.
///
/// Returns a value in [-1, 1] where 1 = identical, 0 = orthogonal, -1 = opposite.
/// Returns 0.0 if either vector is zero-length, empty, or the lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let x = *x as f64;
        let y = *y as f64;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < 1e-10 {
        return 0.0;
    }

    (dot / denom) as f32
}

/// Rank chunks by cosine similarity to a query embedding.
///
/// Returns at most `k` chunks, most similar first. The sort is stable, so
/// chunks with equal similarity keep the order they were given in (the
/// store's insertion order).
pub fn rank_by_similarity<'a, I>(chunks: I, query_embedding: &[f32], k: usize) -> Vec<Chunk>
where
    I: IntoIterator<Item = &'a Chunk>,
{
    if k == 0 {
        return Vec::new();
    }

    let mut scored: Vec<(f32, &Chunk)> = chunks
        .into_iter()
        .map(|chunk| {
            let sim = cosine_similarity(&chunk.embedding, query_embedding);
            let sim = if sim.is_finite() { sim } else { 0.0 };
            (sim, chunk)
        })
        .collect();

    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(k);
    scored.into_iter().map(|(_, c)| c.clone()).collect()
}
