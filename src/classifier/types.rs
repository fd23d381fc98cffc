use serde::{Deserialize, Serialize};

/// A user question routed through a scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub text: String,
    pub pub_id: i64,
    pub sys_id: String,
}

impl Query {
    pub fn new(text: impl Into<String>, pub_id: i64, sys_id: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            pub_id,
            sys_id: sys_id.into(),
        }
    }
}

/// An accepted classification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    template_id: i64,
    template_text: String,
    etalon_text: String,
    algorithm: String,
    score: f32,
}

impl MatchResult {
    pub fn new(
        template_id: i64,
        template_text: impl Into<String>,
        etalon_text: impl Into<String>,
        algorithm: impl Into<String>,
        score: f32,
    ) -> Self {
        Self {
            template_id,
            template_text: template_text.into(),
            etalon_text: etalon_text.into(),
            algorithm: algorithm.into(),
            score,
        }
    }

    pub fn template_id(&self) -> i64 {
        self.template_id
    }

    pub fn template_text(&self) -> &str {
        &self.template_text
    }

    /// The etalon the query was matched against.
    pub fn etalon_text(&self) -> &str {
        &self.etalon_text
    }

    /// Label of the strategy that produced the match.
    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    pub fn score(&self) -> f32 {
        self.score
    }
}

/// Why a classifier declined a query. Declining is a normal outcome, not an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Rejection {
    /// The best candidate scored below the threshold, or the validator said no.
    ScoreTooLow {
        score: Option<f32>,
        threshold: f32,
        detail: String,
    },
    /// Candidates existed but none passed filtering or had an answer.
    AnswerNotFound { detail: String },
    /// Retrieval returned nothing.
    EmptyRetrieval { index: String, detail: String },
    /// The normalized query has more tokens than the classifier accepts.
    QueryTooLong { tokens: usize, limit: usize },
}

impl Rejection {
    pub fn kind(&self) -> &'static str {
        match self {
            Rejection::ScoreTooLow { .. } => "score_too_low",
            Rejection::AnswerNotFound { .. } => "answer_not_found",
            Rejection::EmptyRetrieval { .. } => "empty_retrieval",
            Rejection::QueryTooLong { .. } => "query_too_long",
        }
    }
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::ScoreTooLow {
                score: Some(score),
                threshold,
                detail,
            } => write!(f, "score {score} below {threshold}: {detail}"),
            Rejection::ScoreTooLow {
                score: None,
                threshold,
                detail,
            } => write!(f, "nothing reached {threshold}: {detail}"),
            Rejection::AnswerNotFound { detail } => write!(f, "answer not found: {detail}"),
            Rejection::EmptyRetrieval { index, detail } => {
                write!(f, "no documents in '{index}': {detail}")
            }
            Rejection::QueryTooLong { tokens, limit } => {
                write!(f, "query has {tokens} tokens, limit is {limit}")
            }
        }
    }
}

/// Outcome of one classifier on one query.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Accepted(MatchResult),
    Rejected(Rejection),
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted(_))
    }

    pub fn accepted(self) -> Option<MatchResult> {
        match self {
            Verdict::Accepted(result) => Some(result),
            Verdict::Rejected(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Verdict::Accepted(_) => None,
            Verdict::Rejected(rejection) => Some(rejection),
        }
    }
}
