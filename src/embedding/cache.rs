use std::sync::Arc;

use moka::sync::Cache;
use tracing::debug;

use super::encoder::SentenceEncoder;
use super::error::EmbeddingError;
use crate::constants::DEFAULT_EMBEDDING_CACHE_CAPACITY;

/// BLAKE3 of the exact text bytes.
pub fn text_key(text: &str) -> [u8; 32] {
    *blake3::hash(text.as_bytes()).as_bytes()
}

/// Bounded cache of etalon embeddings, keyed by text hash.
///
/// Etalon texts repeat across queries; the query text itself is always encoded fresh.
#[derive(Clone)]
pub struct EmbeddingCache {
    entries: Cache<[u8; 32], Arc<Vec<f32>>>,
}

impl Default for EmbeddingCache {
    fn default() -> Self {
        Self::new(DEFAULT_EMBEDDING_CACHE_CAPACITY)
    }
}

impl std::fmt::Debug for EmbeddingCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingCache")
            .field("entries", &self.entries.entry_count())
            .finish()
    }
}

impl EmbeddingCache {
    pub fn new(capacity: u64) -> Self {
        Self {
            entries: Cache::new(capacity),
        }
    }

    /// Embeds `texts` through `encoder`, reusing cached vectors. Order is preserved.
    pub fn embed_all(
        &self,
        encoder: &SentenceEncoder,
        texts: &[&str],
    ) -> Result<Vec<Arc<Vec<f32>>>, EmbeddingError> {
        let keys: Vec<[u8; 32]> = texts.iter().map(|text| text_key(text)).collect();
        let mut vectors: Vec<Option<Arc<Vec<f32>>>> =
            keys.iter().map(|key| self.entries.get(key)).collect();

        let missing: Vec<usize> = (0..texts.len()).filter(|&i| vectors[i].is_none()).collect();
        if !missing.is_empty() {
            let batch: Vec<&str> = missing.iter().map(|&i| texts[i]).collect();
            let embedded = encoder.embed_batch(&batch)?;

            for (&i, embedding) in missing.iter().zip(embedded) {
                let embedding = Arc::new(embedding);
                self.entries.insert(keys[i], Arc::clone(&embedding));
                vectors[i] = Some(embedding);
            }
        }

        debug!(
            total = texts.len(),
            encoded = missing.len(),
            "Resolved etalon embeddings"
        );

        Ok(vectors.into_iter().flatten().collect())
    }

    pub fn contains(&self, text: &str) -> bool {
        self.entries.contains_key(&text_key(text))
    }

    /// Approximate entry count (pending maintenance is flushed first).
    pub fn len(&self) -> u64 {
        self.entries.run_pending_tasks();
        self.entries.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
