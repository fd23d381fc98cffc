//! Retrieval adapter over the etalon and answer indices (Elasticsearch).

pub mod client;
pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod model;
pub mod query;

#[cfg(test)]
mod tests;

pub use client::{DEFAULT_REQUEST_TIMEOUT, ElasticClient, ElasticConfig, RetrievalBackend};
pub use error::RetrievalError;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockRetrievalBackend;
pub use model::{AnswerTemplate, Candidate, fields};
pub use query::{BooleanQuery, Predicate, answer_query};
