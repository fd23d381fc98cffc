//! Dense similarity between the query and retrieved etalons.

use async_trait::async_trait;
use tracing::debug;

use super::error::ClassifierError;
use super::ranking::EmbeddingRanker;
use super::types::{MatchResult, Rejection, Verdict};
use super::{Classifier, EtalonSource, check_len_limit};
use crate::normalize::TextNormalizer;
use crate::retrieval::{BooleanQuery, Candidate, RetrievalBackend, fields};

pub const ALGORITHM: &str = "Sbert";

pub struct SbertClassifier<B> {
    name: String,
    stage: DenseStage<B>,
    threshold: f32,
}

impl<B> SbertClassifier<B> {
    pub fn new(
        name: impl Into<String>,
        normalizer: TextNormalizer,
        source: EtalonSource<B>,
        ranker: EmbeddingRanker,
        threshold: f32,
    ) -> Self {
        Self {
            name: name.into(),
            stage: DenseStage::new(normalizer, source, ranker),
            threshold,
        }
    }

    /// Caps how many retrieved candidates are scored; `None` scores all.
    pub fn with_num_candidates(mut self, num_candidates: Option<usize>) -> Self {
        self.stage.num_candidates = num_candidates;
        self
    }

    pub fn with_len_limit(mut self, len_limit: Option<usize>) -> Self {
        self.stage.len_limit = len_limit;
        self
    }
}

/// Outcome of the retrieve-and-rank stage shared by the dense strategies.
pub(crate) enum Ranked {
    Best {
        candidate: Candidate,
        score: f32,
        tokens_str: String,
    },
    Rejected(Rejection),
}

/// Retrieve-and-rank stage shared by the dense strategies.
pub(crate) struct DenseStage<B> {
    pub normalizer: TextNormalizer,
    pub source: EtalonSource<B>,
    pub ranker: EmbeddingRanker,
    pub num_candidates: Option<usize>,
    pub len_limit: Option<usize>,
}

impl<B> DenseStage<B> {
    pub fn new(normalizer: TextNormalizer, source: EtalonSource<B>, ranker: EmbeddingRanker) -> Self {
        Self {
            normalizer,
            source,
            ranker,
            num_candidates: None,
            len_limit: None,
        }
    }
}

impl<B: RetrievalBackend> DenseStage<B> {
    /// Normalizes, retrieves candidates for `pub_id`, keeps the first `num_candidates` and
    /// returns the closest one if it reaches `threshold`.
    pub async fn rank(&self, text: &str, pub_id: i64, threshold: f32) -> Result<Ranked, ClassifierError> {
        let tokens = self.normalizer.normalize_one(text)?;
        if let Some(rejection) = check_len_limit(&tokens, self.len_limit) {
            return Ok(Ranked::Rejected(rejection));
        }
        let tokens_str = tokens.join(" ");

        let query = BooleanQuery::new()
            .must_match(fields::LEM_CLUSTER, tokens_str.as_str())
            .must_match(fields::PARENT_PUB_LIST, pub_id);

        let mut candidates = match self.source.candidates(&query).await? {
            Ok(candidates) => candidates,
            Err(rejection) => return Ok(Ranked::Rejected(rejection)),
        };
        if let Some(limit) = self.num_candidates {
            candidates.truncate(limit);
        }

        let texts: Vec<&str> = candidates
            .iter()
            .map(|c| c.lemmatized_cluster_text.as_str())
            .collect();

        let Some((best_idx, score)) = self.ranker.best(&tokens_str, &texts)? else {
            return Ok(Ranked::Rejected(Rejection::EmptyRetrieval {
                index: self.source.clusters_index.clone(),
                detail: "no candidates left after truncation".to_string(),
            }));
        };

        if score < threshold {
            return Ok(Ranked::Rejected(Rejection::ScoreTooLow {
                score: Some(score),
                threshold,
                detail: format!("closest etalon to '{tokens_str}' is '{}'", texts[best_idx]),
            }));
        }

        let candidate = candidates.swap_remove(best_idx);
        Ok(Ranked::Best {
            candidate,
            score,
            tokens_str,
        })
    }
}

#[async_trait]
impl<B: RetrievalBackend> Classifier for SbertClassifier<B> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn classify(&self, text: &str, pub_id: i64) -> Result<Verdict, ClassifierError> {
        let ranked = self.stage.rank(text, pub_id, self.threshold).await?;

        let (candidate, score) = match ranked {
            Ranked::Best {
                candidate, score, ..
            } => (candidate, score),
            Ranked::Rejected(rejection) => return Ok(Verdict::Rejected(rejection)),
        };

        let answer = match self.stage.source.answer(candidate.id, pub_id).await? {
            Ok(answer) => answer,
            Err(rejection) => return Ok(Verdict::Rejected(rejection)),
        };

        debug!(classifier = %self.name, template_id = candidate.id, score, "Sbert match");

        Ok(Verdict::Accepted(MatchResult::new(
            candidate.id,
            answer.template_text,
            // Dense matches report the lemmatized etalon they were ranked against.
            candidate.lemmatized_cluster_text,
            ALGORITHM,
            score,
        )))
    }
}
