use std::path::PathBuf;
use thiserror::Error;

use crate::tsv::TsvError;

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("failed to start morphological analyzer '{program}': {source}")]
    AnalyzerSpawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("lost connection to morphological analyzer '{program}': {source}")]
    AnalyzerIo {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("morphological analyzer '{program}' failed ({status}): {stderr}")]
    AnalyzerFailed {
        program: PathBuf,
        status: String,
        stderr: String,
    },

    #[error("unreadable analyzer output: {reason}")]
    AnalyzerOutput { reason: String },

    #[error("lemmatizer returned {actual} segments for {expected} texts")]
    SegmentMismatch { expected: usize, actual: usize },

    #[error("invalid word pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("failed to load stopwords: {0}")]
    Stopwords(#[from] TsvError),
}
