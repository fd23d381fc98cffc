use std::collections::BTreeMap;

use crate::config::{ConfigError, ScenarioSection};
use crate::constants::DEFAULT_SCENARIO;

/// Which classifiers run, in order, for each system.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScenarioTable {
    prefix: Vec<String>,
    default: Vec<String>,
    by_sys_id: BTreeMap<String, Vec<String>>,
}

impl ScenarioTable {
    pub fn new(
        prefix: Vec<String>,
        default: Vec<String>,
        by_sys_id: BTreeMap<String, Vec<String>>,
    ) -> Self {
        Self {
            prefix,
            default,
            by_sys_id,
        }
    }

    pub fn from_section(section: &ScenarioSection) -> Self {
        Self::new(
            section.prepend_to_all.clone(),
            section.default.clone(),
            section.by_sys_id.clone(),
        )
    }

    /// Prefix followed by the list for `sys_id`, or by the default list when `sys_id` has none.
    pub fn resolve(&self, sys_id: &str) -> Vec<&str> {
        let tail = self.by_sys_id.get(sys_id).unwrap_or(&self.default);
        self.prefix
            .iter()
            .chain(tail)
            .map(String::as_str)
            .collect()
    }

    /// Whether `sys_id` has its own list.
    pub fn has_scenario(&self, sys_id: &str) -> bool {
        self.by_sys_id.contains_key(sys_id)
    }

    /// Fails on the first name `is_declared` does not know.
    pub fn validate(&self, is_declared: impl Fn(&str) -> bool) -> Result<(), ConfigError> {
        let named_lists = [("prepend_to_all", &self.prefix), (DEFAULT_SCENARIO, &self.default)]
            .into_iter()
            .chain(self.by_sys_id.iter().map(|(sys_id, list)| (sys_id.as_str(), list)));

        for (scenario, list) in named_lists {
            if let Some(missing) = list.iter().find(|name| !is_declared(name)) {
                return Err(ConfigError::UnknownClassifier {
                    scenario: scenario.to_string(),
                    classifier: missing.clone(),
                });
            }
        }

        Ok(())
    }

    /// Every classifier name referenced anywhere in the table.
    pub fn referenced(&self) -> impl Iterator<Item = &str> {
        self.prefix
            .iter()
            .chain(&self.default)
            .chain(self.by_sys_id.values().flatten())
            .map(String::as_str)
    }
}
