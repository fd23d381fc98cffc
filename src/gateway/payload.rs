use serde::{Deserialize, Serialize};

use crate::classifier::MatchResult;
use crate::scenario::Attempt;

/// Client identifiers (`sys_id`, `chat_id`) arrive as numbers or strings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Identifier {
    Int(i64),
    Str(String),
}

impl Identifier {
    /// `None` for a blank string.
    pub fn into_key(self) -> Option<String> {
        match self {
            Identifier::Int(n) => Some(n.to_string()),
            Identifier::Str(s) => {
                let s = s.trim();
                (!s.is_empty()).then(|| s.to_string())
            }
        }
    }
}

/// Body of `POST /search`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchRequest {
    #[serde(alias = "pub_id")]
    pub pubid: i64,
    #[serde(default)]
    pub chat_id: Option<Identifier>,
    #[serde(default)]
    pub userid: i64,
    #[serde(default)]
    pub sys_id: Option<Identifier>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(rename = "templateId")]
    pub template_id: i64,
    #[serde(rename = "templateText")]
    pub template_text: String,
    pub etalon_text: String,
    pub algorithm: String,
    pub score: f32,
}

impl From<MatchResult> for SearchResponse {
    fn from(result: MatchResult) -> Self {
        Self {
            template_id: result.template_id(),
            template_text: result.template_text().to_string(),
            etalon_text: result.etalon_text().to_string(),
            algorithm: result.algorithm().to_string(),
            score: result.score(),
        }
    }
}

/// Body returned when no classifier matched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotFoundResponse {
    pub status: &'static str,
    pub sys_id: String,
    pub attempts: Vec<Attempt>,
}
