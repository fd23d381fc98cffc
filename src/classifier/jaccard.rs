//! Token-set overlap between the query and retrieved etalons.

use std::collections::HashSet;

use async_trait::async_trait;
use tracing::debug;

use super::error::ClassifierError;
use super::types::{MatchResult, Rejection, Verdict};
use super::{Classifier, EtalonSource, check_len_limit};
use crate::normalize::TextNormalizer;
use crate::retrieval::{BooleanQuery, RetrievalBackend, fields};

pub const ALGORITHM: &str = "Jaccard";

/// |A ∩ B| / |A ∪ B| over whitespace tokens; `0.0` when both are empty.
pub fn jaccard_score(a: &str, b: &str) -> f32 {
    let a: HashSet<&str> = a.split_whitespace().collect();
    let b: HashSet<&str> = b.split_whitespace().collect();

    let union = a.union(&b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(&b).count() as f32 / union as f32
}

pub struct JaccardClassifier<B> {
    name: String,
    normalizer: TextNormalizer,
    source: EtalonSource<B>,
    threshold: f32,
    len_limit: Option<usize>,
}

impl<B> JaccardClassifier<B> {
    pub fn new(
        name: impl Into<String>,
        normalizer: TextNormalizer,
        source: EtalonSource<B>,
        threshold: f32,
    ) -> Self {
        Self {
            name: name.into(),
            normalizer,
            source,
            threshold,
            len_limit: None,
        }
    }

    pub fn with_len_limit(mut self, len_limit: Option<usize>) -> Self {
        self.len_limit = len_limit;
        self
    }
}

#[async_trait]
impl<B: RetrievalBackend> Classifier for JaccardClassifier<B> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn classify(&self, text: &str, pub_id: i64) -> Result<Verdict, ClassifierError> {
        let tokens = self.normalizer.normalize_one(text)?;
        if let Some(rejection) = check_len_limit(&tokens, self.len_limit) {
            return Ok(Verdict::Rejected(rejection));
        }
        let tokens_str = tokens.join(" ");

        let query = BooleanQuery::new()
            .must_match_phrase(fields::PARENT_PUB_LIST, pub_id)
            .must_match(fields::LEM_CLUSTER, tokens_str.as_str());

        let candidates = match self.source.candidates(&query).await? {
            Ok(candidates) => candidates,
            Err(rejection) => return Ok(Verdict::Rejected(rejection)),
        };

        for candidate in &candidates {
            if !candidate.serves(pub_id) {
                continue;
            }

            let score = jaccard_score(&tokens_str, &candidate.lemmatized_cluster_text);
            if score < self.threshold {
                continue;
            }

            match self.source.answer(candidate.id, pub_id).await? {
                Ok(answer) => {
                    debug!(classifier = %self.name, template_id = answer.template_id, score, "Jaccard match");
                    return Ok(Verdict::Accepted(MatchResult::new(
                        answer.template_id,
                        answer.template_text,
                        candidate.raw_cluster_text.clone(),
                        ALGORITHM,
                        score,
                    )));
                }
                Err(_) => {
                    debug!(classifier = %self.name, candidate = candidate.id, "No answer template, skipping");
                }
            }
        }

        Ok(Verdict::Rejected(Rejection::AnswerNotFound {
            detail: format!(
                "no etalon reached {} for '{tokens_str}' among {} candidates",
                self.threshold,
                candidates.len()
            ),
        }))
    }
}
