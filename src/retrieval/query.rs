use serde_json::{Value, json};

use super::model::fields;

/// One clause of a conjunctive query.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Relevance-scored full-text match (token overlap).
    Match { field: String, value: Value },
    /// Exact phrase / value match.
    MatchPhrase { field: String, value: Value },
}

impl Predicate {
    pub fn field(&self) -> &str {
        match self {
            Predicate::Match { field, .. } | Predicate::MatchPhrase { field, .. } => field,
        }
    }

    pub fn value(&self) -> &Value {
        match self {
            Predicate::Match { value, .. } | Predicate::MatchPhrase { value, .. } => value,
        }
    }

    /// Elasticsearch DSL for this clause.
    pub fn to_json(&self) -> Value {
        match self {
            Predicate::Match { field, value } => json!({ "match": { field: value } }),
            Predicate::MatchPhrase { field, value } => {
                json!({ "match_phrase": { field: value } })
            }
        }
    }
}

/// Conjunction of predicates ("bool must").
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BooleanQuery {
    must: Vec<Predicate>,
}

impl BooleanQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn must_match(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.must.push(Predicate::Match {
            field: field.to_string(),
            value: value.into(),
        });
        self
    }

    pub fn must_match_phrase(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.must.push(Predicate::MatchPhrase {
            field: field.to_string(),
            value: value.into(),
        });
        self
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.must
    }

    /// Elasticsearch DSL for the whole query.
    pub fn to_json(&self) -> Value {
        let must: Vec<Value> = self.must.iter().map(Predicate::to_json).collect();
        json!({ "bool": { "must": must } })
    }
}

impl std::fmt::Display for BooleanQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

/// Query locating the answer template of `template_id` for `pub_id`.
pub fn answer_query(template_id: i64, pub_id: i64) -> BooleanQuery {
    BooleanQuery::new()
        .must_match_phrase(fields::TEMPLATE_ID, template_id)
        .must_match_phrase(fields::PUB_ID, pub_id)
}
