use std::time::Duration;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;

use super::error::RetrievalError;
use super::model::{AnswerTemplate, Candidate};
use super::query::{BooleanQuery, answer_query};
use crate::constants::DEFAULT_MAX_HITS;

/// Default per-request timeout for the search backend.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection settings for [`ElasticClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElasticConfig {
    /// Base URL, e.g. `http://localhost:9200`.
    pub url: String,
    /// Basic-auth user; auth is sent only when both user and password are set.
    pub user: Option<String>,
    pub password: Option<String>,
    /// Documents requested per search.
    pub max_hits: usize,
    pub request_timeout: Duration,
}

impl Default for ElasticConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:9200".to_string(),
            user: None,
            password: None,
            max_hits: DEFAULT_MAX_HITS,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl ElasticConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self.password = Some(password.into());
        self
    }

    pub fn with_max_hits(mut self, max_hits: usize) -> Self {
        self.max_hits = max_hits;
        self
    }

    fn basic_auth(&self) -> Option<(&str, &str)> {
        match (&self.user, &self.password) {
            (Some(user), Some(password)) => Some((user, password)),
            _ => None,
        }
    }
}

/// Minimal async interface used by the classifiers.
pub trait RetrievalBackend: Send + Sync {
    /// Runs a conjunctive query against `index`, returning at most `max_results` candidates
    /// in backend relevance order. No hits is [`RetrievalError::Empty`].
    fn search(
        &self,
        index: &str,
        query: &BooleanQuery,
        max_results: usize,
    ) -> impl std::future::Future<Output = Result<Vec<Candidate>, RetrievalError>> + Send;

    /// Fetches the answer template for (`template_id`, `pub_id`).
    fn lookup_answer(
        &self,
        index: &str,
        template_id: i64,
        pub_id: i64,
    ) -> impl std::future::Future<Output = Result<AnswerTemplate, RetrievalError>> + Send;

    /// Checks that the backend is reachable.
    fn health_check(&self) -> impl std::future::Future<Output = Result<(), RetrievalError>> + Send;
}

impl<T: RetrievalBackend> RetrievalBackend for std::sync::Arc<T> {
    async fn search(
        &self,
        index: &str,
        query: &BooleanQuery,
        max_results: usize,
    ) -> Result<Vec<Candidate>, RetrievalError> {
        (**self).search(index, query, max_results).await
    }

    async fn lookup_answer(
        &self,
        index: &str,
        template_id: i64,
        pub_id: i64,
    ) -> Result<AnswerTemplate, RetrievalError> {
        (**self).lookup_answer(index, template_id, pub_id).await
    }

    async fn health_check(&self) -> Result<(), RetrievalError> {
        (**self).health_check().await
    }
}

#[derive(Clone)]
/// Elasticsearch client speaking the `_search` REST API.
pub struct ElasticClient {
    http: reqwest::Client,
    config: ElasticConfig,
}

impl std::fmt::Debug for ElasticClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElasticClient")
            .field("url", &self.config.url)
            .field("max_hits", &self.config.max_hits)
            .finish()
    }
}

impl ElasticClient {
    /// Creates a client; no request is made until the first search.
    pub fn new(config: ElasticConfig) -> Result<Self, RetrievalError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| RetrievalError::ConnectionFailed {
                url: config.url.clone(),
                message: e.to_string(),
            })?;

        Ok(Self { http, config })
    }

    /// Returns the configured URL.
    pub fn url(&self) -> &str {
        &self.config.url
    }

    /// Returns the number of documents requested per search.
    pub fn max_hits(&self) -> usize {
        self.config.max_hits
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.url.trim_end_matches('/'), path)
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.config.basic_auth() {
            Some((user, password)) => builder.basic_auth(user, Some(password)),
            None => builder,
        }
    }

    async fn search_documents<T: DeserializeOwned>(
        &self,
        index: &str,
        query: &BooleanQuery,
        size: usize,
    ) -> Result<Vec<T>, RetrievalError> {
        let url = self.endpoint(&format!("{index}/_search"));
        let body = json!({ "query": query.to_json(), "size": size });

        debug!(index, size, query = %query, "Searching");

        let response = self
            .request(self.http.post(&url).json(&body))
            .send()
            .await
            .map_err(|e| RetrievalError::ConnectionFailed {
                url: url.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(RetrievalError::IndexNotFound {
                index: index.to_string(),
            });
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(RetrievalError::SearchFailed {
                index: index.to_string(),
                message: format!("HTTP {status}: {text}"),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| RetrievalError::InvalidResponse {
                index: index.to_string(),
                message: e.to_string(),
            })?;

        documents_from_response(index, query, body)
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    hits: SearchHits,
}

#[derive(Deserialize)]
struct SearchHits {
    #[serde(default)]
    hits: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    #[serde(rename = "_source")]
    source: Value,
}

/// Extracts `hits.hits[*]._source` from a `_search` response body.
pub(crate) fn documents_from_response<T: DeserializeOwned>(
    index: &str,
    query: &BooleanQuery,
    body: Value,
) -> Result<Vec<T>, RetrievalError> {
    let invalid = |e: serde_json::Error| RetrievalError::InvalidResponse {
        index: index.to_string(),
        message: e.to_string(),
    };

    let response: SearchResponse = serde_json::from_value(body).map_err(invalid)?;
    if response.hits.hits.is_empty() {
        return Err(RetrievalError::Empty {
            index: index.to_string(),
            query: query.to_string(),
        });
    }

    response
        .hits
        .hits
        .into_iter()
        .map(|hit| serde_json::from_value(hit.source).map_err(invalid))
        .collect()
}

impl RetrievalBackend for ElasticClient {
    async fn search(
        &self,
        index: &str,
        query: &BooleanQuery,
        max_results: usize,
    ) -> Result<Vec<Candidate>, RetrievalError> {
        self.search_documents(index, query, max_results).await
    }

    async fn lookup_answer(
        &self,
        index: &str,
        template_id: i64,
        pub_id: i64,
    ) -> Result<AnswerTemplate, RetrievalError> {
        let query = answer_query(template_id, pub_id);
        let answers: Vec<AnswerTemplate> = self.search_documents(index, &query, 1).await?;
        answers
            .into_iter()
            .next()
            .ok_or_else(|| RetrievalError::Empty {
                index: index.to_string(),
                query: query.to_string(),
            })
    }

    async fn health_check(&self) -> Result<(), RetrievalError> {
        let url = self.endpoint("_cluster/health");
        let response = self
            .request(self.http.get(&url))
            .send()
            .await
            .map_err(|e| RetrievalError::ConnectionFailed {
                url: url.clone(),
                message: e.to_string(),
            })?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(RetrievalError::ConnectionFailed {
                url,
                message: format!("HTTP {}", response.status()),
            })
        }
    }
}
