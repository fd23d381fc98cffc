use thiserror::Error;

#[derive(Debug, Error)]
/// Errors returned by retrieval backends.
pub enum RetrievalError {
    /// The query matched no documents. Classifiers treat this as a rejection, not a failure.
    #[error("no documents in '{index}' for query {query}")]
    Empty {
        /// Index name.
        index: String,
        /// Rendered query.
        query: String,
    },

    /// Could not reach the search endpoint.
    #[error("failed to connect to search backend at '{url}': {message}")]
    ConnectionFailed {
        /// Endpoint URL.
        url: String,
        /// Error message.
        message: String,
    },

    /// Index does not exist.
    #[error("index not found: {index}")]
    IndexNotFound {
        /// Index name.
        index: String,
    },

    /// The backend answered with an error.
    #[error("failed to search in '{index}': {message}")]
    SearchFailed {
        /// Index name.
        index: String,
        /// Error message.
        message: String,
    },

    /// The response body could not be decoded.
    #[error("invalid response from '{index}': {message}")]
    InvalidResponse {
        /// Index name.
        index: String,
        /// Error message.
        message: String,
    },
}

impl RetrievalError {
    /// Returns `true` for the "no documents" outcome.
    pub fn is_empty_result(&self) -> bool {
        matches!(self, RetrievalError::Empty { .. })
    }
}
