use std::sync::Arc;

use tracing::debug;

use crate::embedding::{EmbeddingCache, EmbeddingError, SentenceEncoder, cosine_similarity};

/// Ranks candidate texts by cosine similarity to a query in encoder space.
#[derive(Debug, Clone)]
pub struct EmbeddingRanker {
    encoder: Arc<SentenceEncoder>,
    cache: EmbeddingCache,
}

impl EmbeddingRanker {
    pub fn new(encoder: Arc<SentenceEncoder>, cache: EmbeddingCache) -> Self {
        Self { encoder, cache }
    }

    pub fn encoder(&self) -> &SentenceEncoder {
        &self.encoder
    }

    /// Scores every text against `query`, best first; ties keep input order.
    pub fn rank(&self, query: &str, texts: &[&str]) -> Result<Vec<(usize, f32)>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let query_vector = self.encoder.embed(query)?;
        let etalon_vectors = self.cache.embed_all(&self.encoder, texts)?;

        let mut scored: Vec<(usize, f32)> = etalon_vectors
            .iter()
            .enumerate()
            .map(|(idx, vector)| (idx, cosine_similarity(&query_vector, vector)))
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        debug!(
            candidates = texts.len(),
            top_score = scored.first().map(|(_, s)| *s),
            "Ranked candidates"
        );

        Ok(scored)
    }

    /// Best (index, score) or `None` for no texts.
    pub fn best(&self, query: &str, texts: &[&str]) -> Result<Option<(usize, f32)>, EmbeddingError> {
        Ok(self.rank(query, texts)?.into_iter().next())
    }
}
