use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidatorError {
    #[error("relevance validator could not be loaded: {reason}")]
    ModelLoadFailed { reason: String },

    #[error("relevance generation failed: {reason}")]
    InferenceFailed { reason: String },

    #[error("tokenizer error: {reason}")]
    TokenizationFailed { reason: String },

    #[error("invalid validator settings: {reason}")]
    InvalidConfig { reason: String },
}

impl From<candle_core::Error> for ValidatorError {
    fn from(err: candle_core::Error) -> Self {
        ValidatorError::InferenceFailed {
            reason: err.to_string(),
        }
    }
}
