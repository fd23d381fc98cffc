//! Exact-containment rules for a fixed topic.
//!
//! A configured pattern (e.g. budget classification code prefixes) is stripped from both the
//! query and the etalons; an etalon matches when its remaining text occurs verbatim in the
//! remaining query. Longer etalons are tried first.

use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

use super::error::ClassifierError;
use super::types::{MatchResult, Rejection, Verdict};
use super::{Classifier, EtalonSource, check_len_limit};
use crate::normalize::TextNormalizer;
use crate::retrieval::{BooleanQuery, RetrievalBackend, fields};

pub const ALGORITHM: &str = "RulePattern";

pub struct RulePatternClassifier<B> {
    name: String,
    normalizer: TextNormalizer,
    source: EtalonSource<B>,
    topic: String,
    strip: Regex,
    len_limit: Option<usize>,
}

impl<B> RulePatternClassifier<B> {
    pub fn new(
        name: impl Into<String>,
        normalizer: TextNormalizer,
        source: EtalonSource<B>,
        topic: impl Into<String>,
        strip: Regex,
    ) -> Self {
        Self {
            name: name.into(),
            normalizer,
            source,
            topic: topic.into(),
            strip,
            len_limit: None,
        }
    }

    pub fn with_len_limit(mut self, len_limit: Option<usize>) -> Self {
        self.len_limit = len_limit;
        self
    }

    /// Removes pattern matches and collapses whitespace.
    pub fn strip_pattern(&self, text: &str) -> String {
        self.strip
            .replace_all(text, " ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[async_trait]
impl<B: RetrievalBackend> Classifier for RulePatternClassifier<B> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn classify(&self, text: &str, pub_id: i64) -> Result<Verdict, ClassifierError> {
        let tokens = self.normalizer.normalize_one(text)?;
        if let Some(rejection) = check_len_limit(&tokens, self.len_limit) {
            return Ok(Verdict::Rejected(rejection));
        }
        let stripped_query = self.strip_pattern(&tokens.join(" "));

        let query = BooleanQuery::new()
            .must_match_phrase(fields::TOPIC, self.topic.as_str())
            .must_match(fields::LEM_CLUSTER, stripped_query.as_str());

        let candidates = match self.source.candidates(&query).await? {
            Ok(candidates) => candidates,
            Err(rejection) => return Ok(Verdict::Rejected(rejection)),
        };

        let mut rules: Vec<(usize, String, &_)> = candidates
            .iter()
            .map(|candidate| {
                let etalon = self.strip_pattern(&candidate.lemmatized_cluster_text);
                (etalon.split_whitespace().count(), etalon, candidate)
            })
            .collect();
        rules.sort_by(|a, b| b.0.cmp(&a.0));

        let padded_query = format!(" {stripped_query} ");
        for (_, etalon, candidate) in &rules {
            if etalon.is_empty() || !candidate.serves(pub_id) {
                continue;
            }
            // Whole-token containment: "22" does not fire inside "226", unlike a raw substring match.
            if !padded_query.contains(&format!(" {etalon} ")) {
                continue;
            }

            match self.source.answer(candidate.id, pub_id).await? {
                Ok(answer) => {
                    debug!(classifier = %self.name, template_id = answer.template_id, etalon = %etalon, "Rule match");
                    return Ok(Verdict::Accepted(MatchResult::new(
                        answer.template_id,
                        answer.template_text,
                        etalon.clone(),
                        ALGORITHM,
                        1.0,
                    )));
                }
                Err(_) => {
                    debug!(classifier = %self.name, candidate = candidate.id, "No answer template, skipping");
                }
            }
        }

        Ok(Verdict::Rejected(Rejection::AnswerNotFound {
            detail: format!("no rule of topic '{}' contained in '{stripped_query}'", self.topic),
        }))
    }
}
