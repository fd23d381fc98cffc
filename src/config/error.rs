//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading and validating configuration. All of them are fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Port value is outside valid range (1-65535).
    #[error("invalid port '{value}': must be between 1 and 65535")]
    InvalidPort { value: String },

    /// Port string could not be parsed as a number.
    #[error("failed to parse port '{value}': {source}")]
    PortParseError {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    /// Bind address string could not be parsed.
    #[error("failed to parse bind address '{value}': {source}")]
    InvalidBindAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },

    /// An environment value is out of range.
    #[error("invalid value for {name}: '{value}'")]
    InvalidValue { name: &'static str, value: String },

    /// Specified path does not exist on the filesystem.
    #[error("path does not exist: {path}")]
    PathNotFound { path: PathBuf },

    /// Path exists but is not a file (when a file was expected).
    #[error("path is not a file: {path}")]
    NotAFile { path: PathBuf },

    /// Path exists but is not a directory (when a directory was expected).
    #[error("path is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// A configuration file could not be read.
    #[error("failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A configuration file is malformed.
    #[error("failed to parse '{path}': {reason}")]
    ParseFailed { path: PathBuf, reason: String },

    /// `class_name` is not a known strategy.
    #[error("classifier '{classifier}' has unknown class_name '{class_name}'")]
    UnknownClassName {
        classifier: String,
        class_name: String,
    },

    /// A scenario names a classifier that is not declared.
    #[error("scenario '{scenario}' references undeclared classifier '{classifier}'")]
    UnknownClassifier {
        scenario: String,
        classifier: String,
    },

    /// A stopword file listed for a classifier is missing.
    #[error("classifier '{classifier}': stopwords file not found: {path}")]
    MissingStopwordsFile { classifier: String, path: PathBuf },

    /// A strategy parameter is required but absent.
    #[error("classifier '{classifier}' requires '{parameter}'")]
    MissingParameter {
        classifier: String,
        parameter: &'static str,
    },

    /// A strategy parameter is present but unusable.
    #[error("classifier '{classifier}': invalid '{parameter}': {reason}")]
    InvalidParameter {
        classifier: String,
        parameter: &'static str,
        reason: String,
    },

    /// A strategy failed to initialize (model, stopwords, etalons).
    #[error("failed to initialize classifier '{classifier}': {reason}")]
    StrategyInit { classifier: String, reason: String },
}
