//! Environment-backed process configuration plus the classifier file and sys/pub mapping.
//!
//! Most settings have defaults. Override with `ETALON_*` environment variables.

pub mod classifiers;
pub mod error;
pub mod mapping;


pub use classifiers::{ClassifierParams, ClassifiersFile, ScenarioSection};
pub use error::ConfigError;
pub use mapping::SysPubMapping;

use std::env;
use std::net::IpAddr;
use std::path::PathBuf;

use crate::constants::{DEFAULT_EMBEDDING_CACHE_CAPACITY, DEFAULT_MAX_HITS};
use crate::retrieval::ElasticConfig;

/// Process configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `ETALON_*` overrides on top of defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port. Default: `8080`.
    pub port: u16,

    /// IP address to bind to. Default: `0.0.0.0`.
    pub bind_addr: IpAddr,

    /// Base directory for stopword and etalon files. Default: `./data`.
    pub data_dir: PathBuf,

    /// Base directory for model artifacts. Default: `./data/models`.
    pub models_dir: PathBuf,

    /// Classifier and scenario YAML. Default: `./classifiers_config.yml`.
    pub classifiers_config: PathBuf,

    /// Optional `{ sys_id: [pub_id] }` JSON file.
    pub sys_pub_mapping: Option<PathBuf>,

    /// Search backend URL. Default: `http://localhost:9200`.
    pub es_url: String,

    pub es_user: Option<String>,

    pub es_password: Option<String>,

    /// Documents requested per search. Default: `300`.
    pub es_max_hits: u64,

    /// Morphological analyzer binary. Default: `mystem`.
    pub mystem_path: PathBuf,

    /// Max cached candidate embeddings per dense classifier. Default: `50_000`.
    pub embedding_cache_capacity: u64,
}

/// Default search backend URL used when `ETALON_ES_URL` is not set.
pub const DEFAULT_ES_URL: &str = "http://localhost:9200";

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            bind_addr: IpAddr::V4(std::net::Ipv4Addr::new(0, 0, 0, 0)),
            data_dir: PathBuf::from("./data"),
            models_dir: PathBuf::from("./data/models"),
            classifiers_config: PathBuf::from("./classifiers_config.yml"),
            sys_pub_mapping: None,
            es_url: DEFAULT_ES_URL.to_string(),
            es_user: None,
            es_password: None,
            es_max_hits: DEFAULT_MAX_HITS as u64,
            mystem_path: PathBuf::from("mystem"),
            embedding_cache_capacity: DEFAULT_EMBEDDING_CACHE_CAPACITY,
        }
    }
}

impl Config {
    const ENV_PORT: &'static str = "ETALON_PORT";
    const ENV_BIND_ADDR: &'static str = "ETALON_BIND_ADDR";
    const ENV_DATA_DIR: &'static str = "ETALON_DATA_DIR";
    const ENV_MODELS_DIR: &'static str = "ETALON_MODELS_DIR";
    const ENV_CLASSIFIERS_CONFIG: &'static str = "ETALON_CLASSIFIERS_CONFIG";
    const ENV_SYS_PUB_MAPPING: &'static str = "ETALON_SYS_PUB_MAPPING";
    const ENV_ES_URL: &'static str = "ETALON_ES_URL";
    const ENV_ES_USER: &'static str = "ETALON_ES_USER";
    const ENV_ES_PASSWORD: &'static str = "ETALON_ES_PASSWORD";
    const ENV_ES_MAX_HITS: &'static str = "ETALON_ES_MAX_HITS";
    const ENV_MYSTEM_PATH: &'static str = "ETALON_MYSTEM_PATH";
    const ENV_EMBEDDING_CACHE_CAPACITY: &'static str = "ETALON_EMBEDDING_CACHE_CAPACITY";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = Self::parse_port_from_env(defaults.port)?;
        let bind_addr = Self::parse_bind_addr_from_env(defaults.bind_addr)?;
        let data_dir = Self::parse_path_from_env(Self::ENV_DATA_DIR, defaults.data_dir);
        let models_dir = Self::parse_path_from_env(Self::ENV_MODELS_DIR, defaults.models_dir);
        let classifiers_config =
            Self::parse_path_from_env(Self::ENV_CLASSIFIERS_CONFIG, defaults.classifiers_config);
        let sys_pub_mapping = Self::parse_optional_path_from_env(Self::ENV_SYS_PUB_MAPPING);
        let es_url = Self::parse_string_from_env(Self::ENV_ES_URL, defaults.es_url);
        let es_user = Self::parse_optional_string_from_env(Self::ENV_ES_USER);
        let es_password = Self::parse_optional_string_from_env(Self::ENV_ES_PASSWORD);
        let es_max_hits = Self::parse_u64_from_env(Self::ENV_ES_MAX_HITS, defaults.es_max_hits);
        let mystem_path = Self::parse_path_from_env(Self::ENV_MYSTEM_PATH, defaults.mystem_path);
        let embedding_cache_capacity = Self::parse_u64_from_env(
            Self::ENV_EMBEDDING_CACHE_CAPACITY,
            defaults.embedding_cache_capacity,
        );

        Ok(Self {
            port,
            bind_addr,
            data_dir,
            models_dir,
            classifiers_config,
            sys_pub_mapping,
            es_url,
            es_user,
            es_password,
            es_max_hits,
            mystem_path,
            embedding_cache_capacity,
        })
    }

    /// Validates paths and basic invariants (does not create directories).
    pub fn validate(&self) -> Result<(), ConfigError> {
        for dir in [&self.data_dir, &self.models_dir] {
            if dir.exists() && !dir.is_dir() {
                return Err(ConfigError::NotADirectory { path: dir.clone() });
            }
        }

        if !self.classifiers_config.exists() {
            return Err(ConfigError::PathNotFound {
                path: self.classifiers_config.clone(),
            });
        }
        if !self.classifiers_config.is_file() {
            return Err(ConfigError::NotAFile {
                path: self.classifiers_config.clone(),
            });
        }

        if let Some(ref path) = self.sys_pub_mapping {
            if !path.exists() {
                return Err(ConfigError::PathNotFound { path: path.clone() });
            }
            if !path.is_file() {
                return Err(ConfigError::NotAFile { path: path.clone() });
            }
        }

        if self.es_max_hits == 0 {
            return Err(ConfigError::InvalidValue {
                name: Self::ENV_ES_MAX_HITS,
                value: self.es_max_hits.to_string(),
            });
        }

        Ok(())
    }

    /// Returns `"{bind_addr}:{port}"` (useful for logging/binding).
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    /// Search client settings; credentials apply only when both user and password are set.
    pub fn elastic_config(&self) -> ElasticConfig {
        let config = ElasticConfig::new(self.es_url.clone())
            .with_max_hits(usize::try_from(self.es_max_hits).unwrap_or(usize::MAX));
        match (&self.es_user, &self.es_password) {
            (Some(user), Some(password)) => config.with_credentials(user.clone(), password.clone()),
            _ => config,
        }
    }

    fn parse_port_from_env(default: u16) -> Result<u16, ConfigError> {
        match env::var(Self::ENV_PORT) {
            Ok(value) => {
                let port: u16 = value.parse().map_err(|e| ConfigError::PortParseError {
                    value: value.clone(),
                    source: e,
                })?;

                if port == 0 {
                    return Err(ConfigError::InvalidPort { value });
                }

                Ok(port)
            }
            Err(_) => Ok(default),
        }
    }

    fn parse_bind_addr_from_env(default: IpAddr) -> Result<IpAddr, ConfigError> {
        match env::var(Self::ENV_BIND_ADDR) {
            Ok(value) => value
                .parse()
                .map_err(|e| ConfigError::InvalidBindAddr { value, source: e }),
            Err(_) => Ok(default),
        }
    }

    fn parse_path_from_env(var_name: &str, default: PathBuf) -> PathBuf {
        env::var(var_name).map(PathBuf::from).unwrap_or(default)
    }

    fn parse_optional_path_from_env(var_name: &str) -> Option<PathBuf> {
        Self::parse_optional_string_from_env(var_name).map(PathBuf::from)
    }

    fn parse_optional_string_from_env(var_name: &str) -> Option<String> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse_string_from_env(var_name: &str, default: String) -> String {
        env::var(var_name).unwrap_or(default)
    }

    fn parse_u64_from_env(var_name: &str, default: u64) -> u64 {
        env::var(var_name)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }
}
