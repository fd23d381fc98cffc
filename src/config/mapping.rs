use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use tracing::{debug, warn};

use super::error::ConfigError;

/// Publication to system lookup, inverted from a `{ "sys_id": [pub_id, ...] }` JSON file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SysPubMapping {
    by_pub: HashMap<i64, String>,
}

impl SysPubMapping {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &content)
    }

    pub fn parse(path: &Path, content: &str) -> Result<Self, ConfigError> {
        let raw: BTreeMap<String, Vec<i64>> =
            serde_json::from_str(content).map_err(|e| ConfigError::ParseFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let mut by_pub = HashMap::new();
        for (sys_id, pubs) in raw {
            for pub_id in pubs {
                if let Some(previous) = by_pub.insert(pub_id, sys_id.clone()) {
                    warn!(pub_id, previous = %previous, sys_id = %sys_id, "Publication listed under several systems, last wins");
                }
            }
        }

        debug!(publications = by_pub.len(), "Loaded sys/pub mapping");
        Ok(Self { by_pub })
    }

    pub fn sys_id_for(&self, pub_id: i64) -> Option<&str> {
        self.by_pub.get(&pub_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_pub.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_pub.is_empty()
    }
}
