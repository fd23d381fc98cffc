use std::path::PathBuf;

use crate::constants::{DEFAULT_ENCODER_MAX_SEQ_LEN, STUB_EMBEDDING_DIM};
use crate::embedding::error::EmbeddingError;

/// Sentence encoder configuration.
///
/// `model_dir` holds a BERT-family checkpoint: `config.json`, `model.safetensors`,
/// `tokenizer.json`.
#[derive(Debug, Clone)]
pub struct EncoderConfig {
    pub model_dir: PathBuf,
    pub max_seq_len: usize,
    /// Width of stub embeddings; ignored when a model is loaded.
    pub stub_dim: usize,
    /// Skip model loading and produce deterministic bag-of-words vectors.
    pub testing_stub: bool,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::new(),
            max_seq_len: DEFAULT_ENCODER_MAX_SEQ_LEN,
            stub_dim: STUB_EMBEDDING_DIM,
            testing_stub: false,
        }
    }
}

impl EncoderConfig {
    pub fn new<P: Into<PathBuf>>(model_dir: P) -> Self {
        Self {
            model_dir: model_dir.into(),
            ..Default::default()
        }
    }

    pub fn stub() -> Self {
        Self {
            testing_stub: true,
            ..Default::default()
        }
    }

    pub fn with_max_seq_len(mut self, max_seq_len: usize) -> Self {
        self.max_seq_len = max_seq_len;
        self
    }

    pub fn validate(&self) -> Result<(), EmbeddingError> {
        if self.max_seq_len == 0 {
            return Err(EmbeddingError::InvalidConfig {
                reason: "max_seq_len must be positive".to_string(),
            });
        }
        if self.testing_stub && self.stub_dim == 0 {
            return Err(EmbeddingError::InvalidConfig {
                reason: "stub_dim must be positive".to_string(),
            });
        }
        if !self.testing_stub && self.model_dir.as_os_str().is_empty() {
            return Err(EmbeddingError::InvalidConfig {
                reason: "model_dir cannot be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Returns `true` if all model files are present.
    pub fn model_available(&self) -> bool {
        ["config.json", "model.safetensors", "tokenizer.json"]
            .iter()
            .all(|file| self.model_dir.join(file).is_file())
    }
}
