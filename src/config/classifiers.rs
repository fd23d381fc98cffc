//! Classifier definitions and scenarios (YAML).
//!
//! ```yaml
//! classifiers:
//!   jaccard:
//!     class_name: JaccardClassifier
//!     score_threshold: 0.6
//!     stopwords_files: [stopwords.tsv]
//!     es_clusters_index: clusters
//!     es_answers_index: answers
//! scenarios:
//!   prepend_to_all: [jaccard]
//!   default: []
//!   by_sys_id:
//!     1: []
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Deserializer};
use tracing::info;

use super::error::ConfigError;
use crate::classifier::StrategyKind;
use crate::scenario::ScenarioTable;

/// Default topic for rule-pattern classifiers.
pub const DEFAULT_RULE_TOPIC: &str = "КОСГУ робот";

/// Default pattern stripped by rule-pattern classifiers.
pub const DEFAULT_RULE_PATTERNS: &str = "косг|квр";

/// Parameters of one configured classifier. Which fields apply depends on `class_name`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ClassifierParams {
    pub class_name: String,
    #[serde(default)]
    pub score_threshold: Option<f32>,
    /// Max normalized query tokens; longer queries are rejected.
    #[serde(default)]
    pub len_limit: Option<usize>,
    /// Relative paths resolve against the data directory.
    #[serde(default)]
    pub stopwords_files: Vec<PathBuf>,
    #[serde(default)]
    pub synonyms: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub num_candidates: Option<usize>,
    #[serde(default)]
    pub es_clusters_index: Option<String>,
    #[serde(default)]
    pub es_answers_index: Option<String>,
    #[serde(default)]
    pub patterns: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub etalons_file: Option<PathBuf>,
    /// Relative paths resolve against the models directory.
    #[serde(default)]
    pub model_dir: Option<PathBuf>,
    #[serde(default)]
    pub tokenizer_dir: Option<PathBuf>,
    #[serde(default)]
    pub validator_dir: Option<PathBuf>,
    #[serde(default)]
    pub sbert_score: Option<f32>,
    #[serde(default)]
    pub t5_score: Option<f32>,
}

impl ClassifierParams {
    pub fn kind(&self) -> Option<StrategyKind> {
        StrategyKind::from_class_name(&self.class_name)
    }

    /// Stopword files resolved against `data_dir`.
    pub fn stopword_paths(&self, data_dir: &Path) -> Vec<PathBuf> {
        self.stopwords_files
            .iter()
            .map(|file| data_dir.join(file))
            .collect()
    }

    /// Pattern stripped by the rule-pattern strategy.
    pub fn rule_patterns(&self) -> &str {
        self.patterns.as_deref().unwrap_or(DEFAULT_RULE_PATTERNS)
    }

    pub fn rule_topic(&self) -> &str {
        self.topic.as_deref().unwrap_or(DEFAULT_RULE_TOPIC)
    }

    pub(crate) fn require<T: Clone>(
        &self,
        name: &str,
        parameter: &'static str,
        value: &Option<T>,
    ) -> Result<T, ConfigError> {
        value.clone().ok_or_else(|| ConfigError::MissingParameter {
            classifier: name.to_string(),
            parameter,
        })
    }

    fn validate(&self, name: &str, data_dir: &Path) -> Result<StrategyKind, ConfigError> {
        let kind = self.kind().ok_or_else(|| ConfigError::UnknownClassName {
            classifier: name.to_string(),
            class_name: self.class_name.clone(),
        })?;

        for path in self.stopword_paths(data_dir) {
            if !path.is_file() {
                return Err(ConfigError::MissingStopwordsFile {
                    classifier: name.to_string(),
                    path,
                });
            }
        }

        if kind.uses_retrieval() {
            self.require(name, "es_clusters_index", &self.es_clusters_index)?;
            self.require(name, "es_answers_index", &self.es_answers_index)?;
        }

        match kind {
            StrategyKind::Jaccard | StrategyKind::Tfidf | StrategyKind::Sbert => {
                self.require(name, "score_threshold", &self.score_threshold)?;
            }
            StrategyKind::SbertT5 => {
                self.require(name, "sbert_score", &self.sbert_score)?;
                let t5_score = self.require(name, "t5_score", &self.t5_score)?;
                if !(0.0..=1.0).contains(&t5_score) {
                    return Err(ConfigError::InvalidParameter {
                        classifier: name.to_string(),
                        parameter: "t5_score",
                        reason: format!("must be between 0.0 and 1.0, got {t5_score}"),
                    });
                }
            }
            StrategyKind::RulePattern => {
                Regex::new(self.rule_patterns()).map_err(|e| ConfigError::InvalidParameter {
                    classifier: name.to_string(),
                    parameter: "patterns",
                    reason: e.to_string(),
                })?;
            }
        }

        if kind == StrategyKind::Tfidf {
            let file = self.require(name, "etalons_file", &self.etalons_file)?;
            let path = data_dir.join(file);
            if !path.is_file() {
                return Err(ConfigError::PathNotFound { path });
            }
        }

        if self.num_candidates == Some(0) {
            return Err(ConfigError::InvalidParameter {
                classifier: name.to_string(),
                parameter: "num_candidates",
                reason: "must be positive".to_string(),
            });
        }

        Ok(kind)
    }
}

/// Scenario lists as written in the file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ScenarioSection {
    /// Classifiers run first for every system.
    #[serde(default)]
    pub prepend_to_all: Vec<String>,
    #[serde(default)]
    pub default: Vec<String>,
    #[serde(default, deserialize_with = "string_keyed")]
    pub by_sys_id: BTreeMap<String, Vec<String>>,
}

/// Map keys may be written as numbers or strings.
fn string_keyed<'de, D>(deserializer: D) -> Result<BTreeMap<String, Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize, PartialEq, Eq, Hash)]
    #[serde(untagged)]
    enum Key {
        Int(i64),
        Str(String),
    }

    let raw: HashMap<Key, Vec<String>> = HashMap::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(key, list)| {
            let key = match key {
                Key::Int(n) => n.to_string(),
                Key::Str(s) => s,
            };
            (key, list)
        })
        .collect())
}

/// The whole classifier configuration file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ClassifiersFile {
    pub classifiers: BTreeMap<String, ClassifierParams>,
    #[serde(default)]
    pub scenarios: ScenarioSection,
}

impl ClassifiersFile {
    /// Reads, parses and validates `path`.
    pub fn load(path: &Path, data_dir: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let file = Self::parse(path, &content)?;
        file.validate(data_dir)?;

        info!(
            path = %path.display(),
            classifiers = file.classifiers.len(),
            sys_ids = file.scenarios.by_sys_id.len(),
            "Loaded classifier configuration"
        );

        Ok(file)
    }

    /// Parses YAML; `path` is only used in error messages.
    pub fn parse(path: &Path, content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(|e| ConfigError::ParseFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Checks every classifier definition and every scenario reference.
    pub fn validate(&self, data_dir: &Path) -> Result<(), ConfigError> {
        for (name, params) in &self.classifiers {
            params.validate(name, data_dir)?;
        }

        ScenarioTable::from_section(&self.scenarios)
            .validate(|name| self.classifiers.contains_key(name))
    }
}
