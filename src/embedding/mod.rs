//! Dense models: sentence encoder, generative relevance validator, embedding cache.

pub mod cache;
pub mod device;
pub mod encoder;
pub mod error;
pub mod similarity;
pub mod utils;
pub mod validator;

pub use cache::EmbeddingCache;
pub use device::select_device;
pub use encoder::{EncoderConfig, SentenceEncoder};
pub use error::EmbeddingError;
pub use similarity::{cosine_similarity, l2_normalize};
pub use validator::{Judgement, RelevanceValidator, ValidatorConfig, ValidatorError};
