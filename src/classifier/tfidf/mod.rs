//! Bag-of-words classifier over a local etalon file.
//!
//! Needs no retrieval backend: the etalons and their answers are loaded at startup and
//! grouped by answer label.

mod index;

pub use index::TfidfIndex;

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use tracing::{debug, info};

use super::error::ClassifierError;
use super::types::{MatchResult, Rejection, Verdict};
use super::{Classifier, check_len_limit};
use crate::normalize::{NormalizeError, TextNormalizer};
use crate::tsv::{TsvError, TsvTable};

pub const ALGORITHM: &str = "TFIDF";

pub const LABEL_COLUMN: &str = "label";
pub const QUERY_COLUMN: &str = "query";
pub const ANSWER_COLUMN: &str = "templateText";

/// One row of the etalons file.
#[derive(Debug, Clone, PartialEq)]
pub struct EtalonRecord {
    pub label: i64,
    pub query: String,
    pub answer: String,
}

/// Reads a TSV with `label`, `query` and `templateText` columns.
pub fn read_etalons(path: &Path) -> Result<Vec<EtalonRecord>, TsvError> {
    let table = TsvTable::read(path)?;

    table
        .columns([LABEL_COLUMN, QUERY_COLUMN, ANSWER_COLUMN])?
        .into_iter()
        .enumerate()
        .map(|(row, [label, query, answer])| {
            let label = label
                .trim()
                .parse::<i64>()
                .map_err(|_| TsvError::InvalidValue {
                    path: path.to_path_buf(),
                    row: row + 1,
                    column: LABEL_COLUMN.to_string(),
                    value: label.to_string(),
                })?;
            Ok(EtalonRecord {
                label,
                query: query.to_string(),
                answer: answer.to_string(),
            })
        })
        .collect()
}

#[derive(Debug, Clone)]
struct AnswerGroup {
    label: i64,
    answer: String,
    reference: String,
}

pub struct TfidfClassifier {
    name: String,
    normalizer: TextNormalizer,
    index: TfidfIndex,
    groups: Vec<AnswerGroup>,
    threshold: f32,
    len_limit: Option<usize>,
}

impl TfidfClassifier {
    /// Lemmatizes every etalon and builds one document per label (labels ascending).
    ///
    /// A label's answer text and reference etalon come from its first row.
    pub fn build(
        name: impl Into<String>,
        normalizer: TextNormalizer,
        records: &[EtalonRecord],
        threshold: f32,
    ) -> Result<Self, NormalizeError> {
        let name = name.into();
        let texts: Vec<&str> = records.iter().map(|r| r.query.as_str()).collect();
        let lemmas = normalizer.lemmatize_texts(&texts)?;

        let mut grouped: BTreeMap<i64, (Vec<String>, &EtalonRecord)> = BTreeMap::new();
        for (record, tokens) in records.iter().zip(lemmas) {
            grouped
                .entry(record.label)
                .or_insert_with(|| (Vec::new(), record))
                .0
                .extend(tokens);
        }

        let mut documents = Vec::with_capacity(grouped.len());
        let mut groups = Vec::with_capacity(grouped.len());
        for (label, (tokens, first)) in grouped {
            documents.push(tokens);
            groups.push(AnswerGroup {
                label,
                answer: first.answer.clone(),
                reference: first.query.clone(),
            });
        }

        let index = TfidfIndex::build(&documents);

        info!(
            classifier = %name,
            etalons = records.len(),
            groups = groups.len(),
            vocabulary = index.vocabulary_len(),
            "TF-IDF index built"
        );

        Ok(Self {
            name,
            normalizer,
            index,
            groups,
            threshold,
            len_limit: None,
        })
    }

    pub fn with_len_limit(mut self, len_limit: Option<usize>) -> Self {
        self.len_limit = len_limit;
        self
    }

    /// Number of answer groups.
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }
}

#[async_trait]
impl Classifier for TfidfClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    async fn classify(&self, text: &str, _pub_id: i64) -> Result<Verdict, ClassifierError> {
        let tokens = self.normalizer.normalize_one(text)?;
        if let Some(rejection) = check_len_limit(&tokens, self.len_limit) {
            return Ok(Verdict::Rejected(rejection));
        }

        let similarities = self.index.similarities(&tokens);

        // First maximum wins; groups are in label order.
        let best = similarities
            .iter()
            .enumerate()
            .fold(None, |best: Option<(usize, f32)>, (idx, &score)| match best {
                Some((_, top)) if top >= score => best,
                _ => Some((idx, score)),
            });

        match best {
            Some((idx, score)) if score >= self.threshold => {
                let group = &self.groups[idx];
                debug!(classifier = %self.name, label = group.label, score, "TF-IDF match");
                Ok(Verdict::Accepted(MatchResult::new(
                    group.label,
                    group.answer.clone(),
                    group.reference.clone(),
                    ALGORITHM,
                    score,
                )))
            }
            best => Ok(Verdict::Rejected(Rejection::ScoreTooLow {
                score: best.map(|(_, score)| score),
                threshold: self.threshold,
                detail: format!("'{}' against {} groups", tokens.join(" "), self.groups.len()),
            })),
        }
    }
}
