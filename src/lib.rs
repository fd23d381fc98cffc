//! Etalon library crate (used by the server binary and integration tests).
//!
//! Matches a free-text question to a canonical answer template by running a cascade of
//! classifiers until one of them accepts.
//!
//! # Public API Surface
//!
//! ## Cascade
//! - [`Orchestrator`], [`ScenarioTable`], [`ScenarioError`] - Scenario resolution and fallthrough
//! - [`Classifier`], [`Verdict`], [`Rejection`], [`MatchResult`] - Strategy contract
//! - [`build_classifiers`], [`BuildContext`], [`StrategyKind`] - Static strategy registry
//!
//! ## Strategies
//! - [`JaccardClassifier`], [`RulePatternClassifier`], [`TfidfClassifier`]
//! - [`SbertClassifier`], [`SbertT5Classifier`] - Dense ranking, optionally validated by T5
//!
//! ## Text and Retrieval
//! - [`TextNormalizer`], [`Lemmatizer`], [`MystemLemmatizer`] - Lemmas, synonyms, stopwords
//! - [`RetrievalBackend`], [`ElasticClient`], [`BooleanQuery`] - Etalon and answer lookup
//!
//! ## Configuration
//! - [`Config`] - `ETALON_*` environment settings
//! - [`ClassifiersFile`], [`SysPubMapping`] - Classifier/scenario YAML and sys/pub JSON
//!
//! ## Test/Mock Support
//! Mock implementations are available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod classifier;
pub mod config;
pub mod constants;
pub mod embedding;
pub mod gateway;
pub mod normalize;
pub mod retrieval;
pub mod scenario;
pub mod tsv;

pub use classifier::{
    BuildContext, Classifier, ClassifierError, EtalonRecord, JaccardClassifier, MatchResult,
    Query, Rejection, RulePatternClassifier, SbertClassifier, SbertT5Classifier, StrategyKind,
    TfidfClassifier, Verdict, build_classifier, build_classifiers,
};
pub use config::{ClassifierParams, ClassifiersFile, Config, ConfigError, SysPubMapping};
pub use embedding::{
    EmbeddingCache, EmbeddingError, EncoderConfig, RelevanceValidator, SentenceEncoder,
    ValidatorConfig, ValidatorError,
};
pub use gateway::{AppState, GatewayError, create_router_with_state};
pub use normalize::{Lemmatizer, MystemLemmatizer, NormalizeError, TableLemmatizer, TextNormalizer};
#[cfg(any(test, feature = "mock"))]
pub use retrieval::MockRetrievalBackend;
pub use retrieval::{
    AnswerTemplate, BooleanQuery, Candidate, ElasticClient, ElasticConfig, RetrievalBackend,
    RetrievalError,
};
pub use scenario::{Attempt, Orchestrator, ScenarioError, ScenarioTable};
pub use tsv::{TsvError, TsvTable};
