use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use super::error::{Attempt, ScenarioError};
use super::table::ScenarioTable;
use crate::classifier::{Classifier, MatchResult, Query, Verdict};
use crate::config::ConfigError;

/// Runs the classifiers of a scenario in order until one accepts.
pub struct Orchestrator {
    classifiers: BTreeMap<String, Arc<dyn Classifier>>,
    table: ScenarioTable,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("classifiers", &self.classifiers.keys().collect::<Vec<_>>())
            .field("table", &self.table)
            .finish()
    }
}

impl Orchestrator {
    /// Fails if any scenario references a classifier missing from `classifiers`.
    pub fn new(
        classifiers: BTreeMap<String, Arc<dyn Classifier>>,
        table: ScenarioTable,
    ) -> Result<Self, ConfigError> {
        table.validate(|name| classifiers.contains_key(name))?;

        let unused: Vec<&String> = classifiers
            .keys()
            .filter(|name| !table.referenced().any(|used| used == name.as_str()))
            .collect();
        if !unused.is_empty() {
            warn!(?unused, "Classifiers not referenced by any scenario");
        }

        Ok(Self { classifiers, table })
    }

    pub fn table(&self) -> &ScenarioTable {
        &self.table
    }

    pub fn classifier_names(&self) -> impl Iterator<Item = &str> {
        self.classifiers.keys().map(String::as_str)
    }

    /// Tries each classifier of the query's scenario in order.
    ///
    /// The first accepted match is returned and later classifiers are not invoked. A
    /// rejection moves on to the next classifier; an infrastructure error aborts immediately.
    #[instrument(skip(self, query), fields(pub_id = query.pub_id, sys_id = %query.sys_id))]
    pub async fn classify(&self, query: &Query) -> Result<MatchResult, ScenarioError> {
        let scenario = self.table.resolve(&query.sys_id);
        if !self.table.has_scenario(&query.sys_id) {
            debug!("No scenario for sys_id, using default list");
        }
        let mut attempts = Vec::with_capacity(scenario.len());

        for name in scenario {
            let classifier = self
                .classifiers
                .get(name)
                .ok_or_else(|| ScenarioError::UnknownClassifier(name.to_string()))?;

            let verdict = classifier
                .classify(&query.text, query.pub_id)
                .await
                .map_err(|source| ScenarioError::Classifier {
                    classifier: name.to_string(),
                    source,
                })?;

            match verdict {
                Verdict::Accepted(result) => {
                    info!(
                        classifier = %name,
                        algorithm = result.algorithm(),
                        template_id = result.template_id(),
                        score = result.score(),
                        "Query matched"
                    );
                    return Ok(result);
                }
                Verdict::Rejected(rejection) => {
                    debug!(classifier = %name, reason = %rejection, "Classifier declined");
                    attempts.push(Attempt {
                        classifier: name.to_string(),
                        rejection,
                    });
                }
            }
        }

        info!(tried = attempts.len(), "No classifier matched");
        Err(ScenarioError::Exhausted {
            sys_id: query.sys_id.clone(),
            attempts,
        })
    }
}
