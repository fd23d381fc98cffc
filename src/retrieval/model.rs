use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Document field names as stored in the search indices.
pub mod fields {
    pub const ID: &str = "ID";
    pub const CLUSTER: &str = "Cluster";
    pub const LEM_CLUSTER: &str = "LemCluster";
    pub const PARENT_PUB_LIST: &str = "ParentPubList";
    pub const TOPIC: &str = "Topic";
    pub const SHORT_ANSWER_TEXT: &str = "ShortAnswerText";

    pub const TEMPLATE_ID: &str = "templateId";
    pub const TEMPLATE_TEXT: &str = "templateText";
    pub const PUB_ID: &str = "pubId";
}

/// An etalon document from the clusters index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(rename = "ID")]
    pub id: i64,
    #[serde(rename = "Cluster", default)]
    pub raw_cluster_text: String,
    #[serde(rename = "LemCluster", default)]
    pub lemmatized_cluster_text: String,
    #[serde(rename = "ParentPubList", default)]
    pub parent_pub_list: BTreeSet<i64>,
    #[serde(rename = "Topic", default)]
    pub topic: String,
    #[serde(rename = "ShortAnswerText", default)]
    pub short_answer_text: String,
}

impl Candidate {
    /// Returns `true` if this etalon may be shown to users of `pub_id`.
    pub fn serves(&self, pub_id: i64) -> bool {
        self.parent_pub_list.contains(&pub_id)
    }
}

/// A document from the answers index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerTemplate {
    #[serde(rename = "templateId")]
    pub template_id: i64,
    #[serde(rename = "templateText")]
    pub template_text: String,
    #[serde(rename = "pubId")]
    pub pub_id: i64,
}
