//! Dense similarity followed by generative validation of the candidate's answer.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::error::ClassifierError;
use super::ranking::EmbeddingRanker;
use super::sbert::{DenseStage, Ranked};
use super::types::{MatchResult, Rejection, Verdict};
use super::{Classifier, EtalonSource};
use crate::embedding::RelevanceValidator;
use crate::normalize::TextNormalizer;
use crate::retrieval::RetrievalBackend;

pub const ALGORITHM: &str = "SbertT5";

pub struct SbertT5Classifier<B> {
    name: String,
    stage: DenseStage<B>,
    validator: Arc<RelevanceValidator>,
    sbert_threshold: f32,
}

impl<B> SbertT5Classifier<B> {
    /// `sbert_threshold` gates the similarity stage; the validator carries its own threshold.
    pub fn new(
        name: impl Into<String>,
        normalizer: TextNormalizer,
        source: EtalonSource<B>,
        ranker: EmbeddingRanker,
        validator: Arc<RelevanceValidator>,
        sbert_threshold: f32,
    ) -> Self {
        Self {
            name: name.into(),
            stage: DenseStage::new(normalizer, source, ranker),
            validator,
            sbert_threshold,
        }
    }

    pub fn with_num_candidates(mut self, num_candidates: Option<usize>) -> Self {
        self.stage.num_candidates = num_candidates;
        self
    }

    pub fn with_len_limit(mut self, len_limit: Option<usize>) -> Self {
        self.stage.len_limit = len_limit;
        self
    }
}

#[async_trait]
impl<B: RetrievalBackend> Classifier for SbertT5Classifier<B> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn classify(&self, text: &str, pub_id: i64) -> Result<Verdict, ClassifierError> {
        let ranked = self.stage.rank(text, pub_id, self.sbert_threshold).await?;

        let (candidate, score, tokens_str) = match ranked {
            Ranked::Best {
                candidate,
                score,
                tokens_str,
            } => (candidate, score, tokens_str),
            Ranked::Rejected(rejection) => return Ok(Verdict::Rejected(rejection)),
        };

        let judgement = self
            .validator
            .judge(&tokens_str, &candidate.short_answer_text)?;
        if !self.validator.accepts(&judgement) {
            return Ok(Verdict::Rejected(Rejection::ScoreTooLow {
                score: Some(judgement.confidence),
                threshold: self.validator.threshold(),
                detail: format!(
                    "validator answered '{}' for etalon {}",
                    judgement.answer, candidate.id
                ),
            }));
        }

        let answer = match self.stage.source.answer(candidate.id, pub_id).await? {
            Ok(answer) => answer,
            Err(rejection) => return Ok(Verdict::Rejected(rejection)),
        };

        debug!(
            classifier = %self.name,
            template_id = candidate.id,
            score,
            confidence = judgement.confidence,
            "SbertT5 match"
        );

        Ok(Verdict::Accepted(MatchResult::new(
            candidate.id,
            answer.template_text,
            candidate.raw_cluster_text,
            ALGORITHM,
            score,
        )))
    }
}
