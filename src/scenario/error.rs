use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::classifier::{ClassifierError, Rejection};

/// One classifier that declined a query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attempt {
    pub classifier: String,
    pub rejection: Rejection,
}

impl fmt::Display for Attempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.classifier, self.rejection)
    }
}

#[derive(Debug, Error)]
pub enum ScenarioError {
    /// Every classifier in the scenario declined.
    #[error("no classifier matched for sys_id '{sys_id}' ({} tried)", attempts.len())]
    Exhausted {
        sys_id: String,
        attempts: Vec<Attempt>,
    },

    /// A classifier hit an infrastructure failure; the scenario was aborted.
    #[error("classifier '{classifier}' failed: {source}")]
    Classifier {
        classifier: String,
        #[source]
        source: ClassifierError,
    },

    /// A resolved scenario names a classifier that was never built.
    #[error("classifier '{0}' is not registered")]
    UnknownClassifier(String),
}

impl ScenarioError {
    /// True for the terminal "no answer" outcome.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }
}
