use thiserror::Error;

use crate::embedding::{EmbeddingError, ValidatorError};
use crate::normalize::NormalizeError;
use crate::retrieval::RetrievalError;

/// Infrastructure failures inside a classifier. Rejections are not errors.
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("normalization failed: {0}")]
    Normalize(#[from] NormalizeError),

    #[error("retrieval failed: {0}")]
    Retrieval(#[from] RetrievalError),

    #[error("encoding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("validation failed: {0}")]
    Validator(#[from] ValidatorError),
}
