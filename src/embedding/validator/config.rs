use std::path::PathBuf;

use crate::constants::{VALIDATOR_MAX_LENGTH, VALIDATOR_MAX_SEQ_LEN};

pub const DEFAULT_THRESHOLD: f32 = 0.5;

/// Relevance validator configuration.
#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    /// T5 checkpoint directory (`config.json`, `model.safetensors`); `None` runs the stub.
    pub model_dir: Option<PathBuf>,

    /// Directory or file of `tokenizer.json`; defaults to `model_dir`.
    pub tokenizer_path: Option<PathBuf>,

    /// Minimum confidence for an affirmative verdict to count.
    pub threshold: f32,

    /// Max decoder positions including the start token.
    pub max_length: usize,

    pub max_seq_len: usize,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            model_dir: None,
            tokenizer_path: None,
            threshold: DEFAULT_THRESHOLD,
            max_length: VALIDATOR_MAX_LENGTH,
            max_seq_len: VALIDATOR_MAX_SEQ_LEN,
        }
    }
}

impl ValidatorConfig {
    pub fn new<P: Into<PathBuf>>(model_dir: P) -> Self {
        Self {
            model_dir: Some(model_dir.into()),
            ..Default::default()
        }
    }

    pub fn stub() -> Self {
        Self::default()
    }

    pub fn with_tokenizer<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.tokenizer_path = Some(path.into());
        self
    }

    /// Out-of-range values are reported by [`Self::validate`].
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(format!(
                "threshold must be between 0.0 and 1.0, got {}",
                self.threshold
            ));
        }

        if self.max_length < 2 {
            return Err(format!("max_length must be at least 2, got {}", self.max_length));
        }

        if let Some(ref path) = self.model_dir
            && path.as_os_str().is_empty()
        {
            return Err("model_dir cannot be empty when provided".to_string());
        }

        Ok(())
    }

    /// Tokenizer location: explicit path or the model directory.
    pub fn tokenizer_location(&self) -> Option<&PathBuf> {
        self.tokenizer_path.as_ref().or(self.model_dir.as_ref())
    }
}
