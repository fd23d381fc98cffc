//! Sentence encoder (BERT + mean pooling).
//!
//! Use [`EncoderConfig::stub`] for tests without model files.

pub mod config;
pub(crate) mod model;


pub use config::EncoderConfig;

use std::hash::{DefaultHasher, Hash, Hasher};

use candle_core::{Device, Tensor};
use tokenizers::Tokenizer;
use tracing::{debug, info, warn};

use crate::embedding::device::select_device;
use crate::embedding::error::EmbeddingError;
use crate::embedding::similarity::l2_normalize;
use crate::embedding::utils::load_tokenizer_with_truncation;

use model::MeanPooledBert;

enum EncoderBackend {
    Model {
        model: MeanPooledBert,
        tokenizer: Tokenizer,
        device: Device,
    },
    Stub {
        device: Device,
    },
}

/// Maps text to a dense vector; cosine similarity between vectors approximates meaning.
pub struct SentenceEncoder {
    backend: EncoderBackend,
    config: EncoderConfig,
}

impl std::fmt::Debug for SentenceEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SentenceEncoder")
            .field(
                "backend",
                &match &self.backend {
                    EncoderBackend::Model { device, .. } => format!("Model({device:?})"),
                    EncoderBackend::Stub { device } => format!("Stub({device:?})"),
                },
            )
            .field("dim", &self.dim())
            .field("max_seq_len", &self.config.max_seq_len)
            .finish()
    }
}

impl SentenceEncoder {
    pub fn load(config: EncoderConfig) -> Result<Self, EmbeddingError> {
        config.validate()?;

        let device = select_device();
        debug!(?device, "Selected compute device for encoder");

        if config.testing_stub {
            warn!("Sentence encoder running in STUB mode (testing only)");
            return Ok(Self {
                backend: EncoderBackend::Stub { device },
                config,
            });
        }

        if !config.model_available() {
            return Err(EmbeddingError::ModelNotFound {
                path: config.model_dir.clone(),
            });
        }

        let model = MeanPooledBert::load(&config.model_dir, &device).map_err(|e| {
            EmbeddingError::ModelLoadFailed {
                reason: format!("Failed to load BERT model: {e}"),
            }
        })?;

        let tokenizer = load_tokenizer_with_truncation(&config.model_dir, config.max_seq_len)
            .map_err(|e| EmbeddingError::TokenizationFailed {
                reason: format!("Failed to load tokenizer: {e}"),
            })?;

        info!(
            model_dir = %config.model_dir.display(),
            hidden_size = model.hidden_size(),
            max_seq_len = config.max_seq_len,
            "Sentence encoder loaded"
        );

        Ok(Self {
            backend: EncoderBackend::Model {
                model,
                tokenizer,
                device,
            },
            config,
        })
    }

    pub fn stub() -> Result<Self, EmbeddingError> {
        Self::load(EncoderConfig::stub())
    }

    /// Encodes one text into a unit-length vector.
    pub fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        match &self.backend {
            EncoderBackend::Model {
                model,
                tokenizer,
                device,
            } => Self::embed_with_model(text, model, tokenizer, device),
            EncoderBackend::Stub { .. } => Ok(self.embed_stub(text)),
        }
    }

    /// Encodes a batch; output order matches input order.
    pub fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        // Sequential: no padding, so every pass sees exactly its own tokens.
        texts.iter().map(|text| self.embed(text)).collect()
    }

    fn embed_with_model(
        text: &str,
        model: &MeanPooledBert,
        tokenizer: &Tokenizer,
        device: &Device,
    ) -> Result<Vec<f32>, EmbeddingError> {
        let encoding =
            tokenizer
                .encode(text, true)
                .map_err(|e| EmbeddingError::TokenizationFailed {
                    reason: e.to_string(),
                })?;

        if encoding.get_ids().is_empty() {
            return Ok(vec![0.0; model.hidden_size()]);
        }

        let input_ids = Tensor::new(encoding.get_ids(), device)?.unsqueeze(0)?;
        let type_ids = Tensor::new(encoding.get_type_ids(), device)?.unsqueeze(0)?;
        let attention_mask = Tensor::new(encoding.get_attention_mask(), device)?.unsqueeze(0)?;

        let pooled = model.forward(&input_ids, &type_ids, &attention_mask)?;
        let mut embedding = pooled.squeeze(0)?.to_vec1::<f32>()?;
        l2_normalize(&mut embedding);

        debug!(
            text_len = text.len(),
            token_count = encoding.get_ids().len(),
            "Encoded text"
        );

        Ok(embedding)
    }

    /// Bag-of-words stub: each distinct token contributes a hash-seeded pseudo-random
    /// direction, so texts sharing tokens get positive cosine similarity.
    fn embed_stub(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.config.stub_dim];

        let mut tokens: Vec<String> = text.split_whitespace().map(str::to_lowercase).collect();
        tokens.sort();
        tokens.dedup();

        for token in &tokens {
            let mut hasher = DefaultHasher::new();
            token.hash(&mut hasher);
            let mut state = hasher.finish();

            for value in embedding.iter_mut() {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
                *value += ((state >> 32) as f32 / u32::MAX as f32) * 2.0 - 1.0;
            }
        }

        l2_normalize(&mut embedding);
        embedding
    }

    /// Output vector width.
    pub fn dim(&self) -> usize {
        match &self.backend {
            EncoderBackend::Model { model, .. } => model.hidden_size(),
            EncoderBackend::Stub { .. } => self.config.stub_dim,
        }
    }

    /// Returns `true` if running in stub mode.
    pub fn is_stub(&self) -> bool {
        matches!(self.backend, EncoderBackend::Stub { .. })
    }

    pub fn device(&self) -> &Device {
        match &self.backend {
            EncoderBackend::Model { device, .. } | EncoderBackend::Stub { device } => device,
        }
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }
}
