//! Classification strategies.
//!
//! Every strategy implements [`Classifier`]: it either accepts a query with a
//! [`MatchResult`] or rejects it with a [`Rejection`]. Infrastructure failures are
//! [`ClassifierError`]s and abort the whole cascade.

pub mod error;
pub mod jaccard;
pub mod ranking;
pub mod registry;
pub mod rule_pattern;
pub mod sbert;
pub mod sbert_t5;
pub mod tfidf;
pub mod types;


pub use error::ClassifierError;
pub use jaccard::{JaccardClassifier, jaccard_score};
pub use ranking::EmbeddingRanker;
pub use registry::{BuildContext, StrategyKind, build_classifier, build_classifiers};
pub use rule_pattern::RulePatternClassifier;
pub use sbert::SbertClassifier;
pub use sbert_t5::SbertT5Classifier;
pub use tfidf::{EtalonRecord, TfidfClassifier, TfidfIndex, read_etalons};
pub use types::{MatchResult, Query, Rejection, Verdict};

use async_trait::async_trait;

use crate::retrieval::{AnswerTemplate, BooleanQuery, Candidate, RetrievalBackend, RetrievalError};

#[async_trait]
/// A single matching strategy.
pub trait Classifier: Send + Sync {
    /// Configured name; scenarios refer to classifiers by this name.
    fn name(&self) -> &str;

    /// Classifies `text` on behalf of publication `pub_id`.
    async fn classify(&self, text: &str, pub_id: i64) -> Result<Verdict, ClassifierError>;
}

/// Rejects queries whose normalized form has more than `limit` tokens.
pub(crate) fn check_len_limit(tokens: &[String], limit: Option<usize>) -> Option<Rejection> {
    match limit {
        Some(limit) if tokens.len() > limit => Some(Rejection::QueryTooLong {
            tokens: tokens.len(),
            limit,
        }),
        _ => None,
    }
}

/// Where a retrieval-backed strategy reads etalons and answers.
#[derive(Debug, Clone)]
pub struct EtalonSource<B> {
    pub backend: B,
    pub clusters_index: String,
    pub answers_index: String,
    /// Documents requested per search.
    pub max_hits: usize,
}

impl<B: RetrievalBackend> EtalonSource<B> {
    /// Searches the clusters index; no hits becomes [`Rejection::EmptyRetrieval`].
    pub(crate) async fn candidates(
        &self,
        query: &BooleanQuery,
    ) -> Result<Result<Vec<Candidate>, Rejection>, ClassifierError> {
        let result = self
            .backend
            .search(&self.clusters_index, query, self.max_hits)
            .await;
        recover_empty(result)
    }

    /// Looks up the answer template; a missing template becomes
    /// [`Rejection::EmptyRetrieval`].
    pub(crate) async fn answer(
        &self,
        template_id: i64,
        pub_id: i64,
    ) -> Result<Result<AnswerTemplate, Rejection>, ClassifierError> {
        let result = self
            .backend
            .lookup_answer(&self.answers_index, template_id, pub_id)
            .await;
        recover_empty(result)
    }
}

fn recover_empty<T>(
    result: Result<T, RetrievalError>,
) -> Result<Result<T, Rejection>, ClassifierError> {
    match result {
        Ok(value) => Ok(Ok(value)),
        Err(RetrievalError::Empty { index, query }) => Ok(Err(Rejection::EmptyRetrieval {
            index,
            detail: query,
        })),
        Err(err) => Err(err.into()),
    }
}
