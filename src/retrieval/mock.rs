use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::client::RetrievalBackend;
use super::error::RetrievalError;
use super::model::{AnswerTemplate, Candidate};
use super::query::{BooleanQuery, Predicate, answer_query};

/// In-memory retrieval backend with Elasticsearch-like `match` semantics.
///
/// `match` on a string scores by shared lowercase tokens (no shared token = no hit);
/// on an array it tests membership. `match_phrase` tests substring or value equality.
/// Hits are ordered by score, ties in insertion order.
#[derive(Default)]
pub struct MockRetrievalBackend {
    indices: std::sync::RwLock<HashMap<String, Vec<Value>>>,
    searches: AtomicUsize,
    unavailable: AtomicBool,
}

impl MockRetrievalBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty index (searching an unknown index fails with `IndexNotFound`).
    pub fn create_index(&self, index: &str) {
        if let Ok(mut indices) = self.indices.write() {
            indices.entry(index.to_string()).or_default();
        }
    }

    pub fn insert_document<T: Serialize>(&self, index: &str, document: &T) {
        let value = serde_json::to_value(document).unwrap_or_default();
        if let Ok(mut indices) = self.indices.write() {
            indices.entry(index.to_string()).or_default().push(value);
        }
    }

    pub fn insert_candidate(&self, index: &str, candidate: Candidate) {
        self.insert_document(index, &candidate);
    }

    pub fn insert_answer(&self, index: &str, answer: AnswerTemplate) {
        self.insert_document(index, &answer);
    }

    /// Number of search and lookup calls served so far.
    pub fn search_count(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }

    /// Makes every subsequent call fail with `ConnectionFailed`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn run<T: DeserializeOwned>(
        &self,
        index: &str,
        query: &BooleanQuery,
        max_results: usize,
    ) -> Result<Vec<T>, RetrievalError> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        self.ensure_available()?;

        let indices = self
            .indices
            .read()
            .map_err(|_| RetrievalError::SearchFailed {
                index: index.to_string(),
                message: "lock poisoned".to_string(),
            })?;

        let documents = indices
            .get(index)
            .ok_or_else(|| RetrievalError::IndexNotFound {
                index: index.to_string(),
            })?;

        let mut scored: Vec<(usize, &Value)> = documents
            .iter()
            .filter_map(|doc| query_score(query, doc).map(|score| (score, doc)))
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.truncate(max_results);

        if scored.is_empty() {
            return Err(RetrievalError::Empty {
                index: index.to_string(),
                query: query.to_string(),
            });
        }

        scored
            .into_iter()
            .map(|(_, doc)| {
                serde_json::from_value(doc.clone()).map_err(|e| RetrievalError::InvalidResponse {
                    index: index.to_string(),
                    message: e.to_string(),
                })
            })
            .collect()
    }

    fn ensure_available(&self) -> Result<(), RetrievalError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RetrievalError::ConnectionFailed {
                url: "mock://retrieval".to_string(),
                message: "backend unavailable".to_string(),
            });
        }
        Ok(())
    }
}

impl RetrievalBackend for MockRetrievalBackend {
    async fn search(
        &self,
        index: &str,
        query: &BooleanQuery,
        max_results: usize,
    ) -> Result<Vec<Candidate>, RetrievalError> {
        self.run(index, query, max_results)
    }

    async fn lookup_answer(
        &self,
        index: &str,
        template_id: i64,
        pub_id: i64,
    ) -> Result<AnswerTemplate, RetrievalError> {
        let query = answer_query(template_id, pub_id);
        let answers: Vec<AnswerTemplate> = self.run(index, &query, 1)?;
        answers
            .into_iter()
            .next()
            .ok_or_else(|| RetrievalError::Empty {
                index: index.to_string(),
                query: query.to_string(),
            })
    }

    async fn health_check(&self) -> Result<(), RetrievalError> {
        self.ensure_available()
    }
}

/// Sum of predicate scores, `None` if any predicate fails.
fn query_score(query: &BooleanQuery, doc: &Value) -> Option<usize> {
    query
        .predicates()
        .iter()
        .map(|predicate| predicate_score(predicate, doc))
        .sum()
}

fn predicate_score(predicate: &Predicate, doc: &Value) -> Option<usize> {
    let field = doc.get(predicate.field())?;
    let wanted = predicate.value();

    match (predicate, field, wanted) {
        (_, Value::Array(items), _) => items
            .iter()
            .any(|item| values_equal(item, wanted))
            .then_some(1),
        (Predicate::Match { .. }, Value::String(text), Value::String(query)) => {
            let doc_tokens = tokens(text);
            let shared = tokens(query)
                .iter()
                .filter(|token| doc_tokens.contains(*token))
                .count();
            (shared > 0).then_some(shared)
        }
        (Predicate::MatchPhrase { .. }, Value::String(text), Value::String(phrase)) => {
            let text = tokens_joined(text);
            let phrase = tokens_joined(phrase);
            (!phrase.is_empty() && format!(" {text} ").contains(&format!(" {phrase} ")))
                .then_some(1)
        }
        _ => values_equal(field, wanted).then_some(1),
    }
}

fn tokens(text: &str) -> HashSet<String> {
    text.split_whitespace().map(str::to_lowercase).collect()
}

fn tokens_joined(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => {
            s.trim().parse::<f64>().ok() == n.as_f64()
        }
        _ => a == b,
    }
}
