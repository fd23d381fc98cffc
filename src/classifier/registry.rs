//! Static strategy table: `class_name` -> constructor.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;

use regex::Regex;
use tracing::{info, warn};

use super::{
    Classifier, EmbeddingRanker, EtalonSource, JaccardClassifier, RulePatternClassifier,
    SbertClassifier, SbertT5Classifier, TfidfClassifier, read_etalons,
};
use crate::config::{ClassifierParams, ClassifiersFile, ConfigError};
use crate::constants::{DEFAULT_EMBEDDING_CACHE_CAPACITY, DEFAULT_MAX_HITS};
use crate::embedding::{
    EmbeddingCache, EncoderConfig, RelevanceValidator, SentenceEncoder, ValidatorConfig,
};
use crate::normalize::{Lemmatizer, TextNormalizer, load_stopwords};
use crate::retrieval::RetrievalBackend;

/// The closed set of matching strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    Jaccard,
    RulePattern,
    Tfidf,
    Sbert,
    SbertT5,
}

const CLASS_NAMES: [(StrategyKind, &str); 5] = [
    (StrategyKind::Jaccard, "JaccardClassifier"),
    (StrategyKind::RulePattern, "RulePatternClassifier"),
    (StrategyKind::Tfidf, "TFIDFClassifier"),
    (StrategyKind::Sbert, "SBERTClassifier"),
    (StrategyKind::SbertT5, "SBERTT5Classifier"),
];

impl StrategyKind {
    pub fn from_class_name(class_name: &str) -> Option<Self> {
        CLASS_NAMES
            .iter()
            .find(|(_, name)| *name == class_name)
            .map(|(kind, _)| *kind)
    }

    pub fn class_name(self) -> &'static str {
        CLASS_NAMES
            .iter()
            .find(|(kind, _)| *kind == self)
            .map(|(_, name)| *name)
            .unwrap_or_default()
    }

    /// Value reported in [`super::MatchResult::algorithm`].
    pub fn algorithm(self) -> &'static str {
        match self {
            Self::Jaccard => super::jaccard::ALGORITHM,
            Self::RulePattern => super::rule_pattern::ALGORITHM,
            Self::Tfidf => super::tfidf::ALGORITHM,
            Self::Sbert => super::sbert::ALGORITHM,
            Self::SbertT5 => super::sbert_t5::ALGORITHM,
        }
    }

    /// Whether the strategy reads etalons from the search backend.
    pub fn uses_retrieval(self) -> bool {
        !matches!(self, Self::Tfidf)
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.class_name())
    }
}

/// Shared inputs for building classifiers.
///
/// Encoders are loaded once per model directory and shared by every dense classifier that
/// names it.
pub struct BuildContext<B> {
    pub backend: B,
    pub lemmatizer: Arc<dyn Lemmatizer>,
    pub data_dir: PathBuf,
    pub models_dir: PathBuf,
    pub max_hits: usize,
    pub embedding_cache_capacity: u64,
    encoders: HashMap<Option<PathBuf>, Arc<SentenceEncoder>>,
}

impl<B> BuildContext<B> {
    pub fn new(
        backend: B,
        lemmatizer: Arc<dyn Lemmatizer>,
        data_dir: impl Into<PathBuf>,
        models_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            backend,
            lemmatizer,
            data_dir: data_dir.into(),
            models_dir: models_dir.into(),
            max_hits: DEFAULT_MAX_HITS,
            embedding_cache_capacity: DEFAULT_EMBEDDING_CACHE_CAPACITY,
            encoders: HashMap::new(),
        }
    }

    pub fn with_max_hits(mut self, max_hits: usize) -> Self {
        self.max_hits = max_hits;
        self
    }

    pub fn with_embedding_cache_capacity(mut self, capacity: u64) -> Self {
        self.embedding_cache_capacity = capacity;
        self
    }

    fn model_path(&self, dir: &Option<PathBuf>) -> Option<PathBuf> {
        dir.as_ref().map(|dir| self.models_dir.join(dir))
    }

    fn encoder(&mut self, name: &str, model_dir: Option<PathBuf>) -> Result<Arc<SentenceEncoder>, ConfigError> {
        if let Some(encoder) = self.encoders.get(&model_dir) {
            return Ok(Arc::clone(encoder));
        }

        let config = match &model_dir {
            Some(dir) => EncoderConfig::new(dir.clone()),
            None => {
                warn!(classifier = %name, "No model_dir configured, sentence encoder runs as a stub");
                EncoderConfig::stub()
            }
        };
        let encoder = Arc::new(SentenceEncoder::load(config).map_err(|e| init_error(name, e))?);
        self.encoders.insert(model_dir, Arc::clone(&encoder));
        Ok(encoder)
    }

    fn normalizer(&self, name: &str, params: &ClassifierParams) -> Result<TextNormalizer, ConfigError> {
        let stopwords = load_stopwords(params.stopword_paths(&self.data_dir).as_slice())
            .map_err(|e| init_error(name, e))?;

        TextNormalizer::new(Arc::clone(&self.lemmatizer))
            .with_synonyms(&params.synonyms)
            .and_then(|normalizer| normalizer.with_stopwords(stopwords.as_slice()))
            .map_err(|e| init_error(name, e))
    }
}

impl<B: Clone> BuildContext<B> {
    fn source(&self, name: &str, params: &ClassifierParams) -> Result<EtalonSource<B>, ConfigError> {
        Ok(EtalonSource {
            backend: self.backend.clone(),
            clusters_index: params.require(name, "es_clusters_index", &params.es_clusters_index)?,
            answers_index: params.require(name, "es_answers_index", &params.es_answers_index)?,
            max_hits: self.max_hits,
        })
    }
}

fn init_error(name: &str, err: impl std::fmt::Display) -> ConfigError {
    ConfigError::StrategyInit {
        classifier: name.to_string(),
        reason: err.to_string(),
    }
}

/// Builds one classifier from its parameters.
pub fn build_classifier<B>(
    ctx: &mut BuildContext<B>,
    name: &str,
    params: &ClassifierParams,
) -> Result<Arc<dyn Classifier>, ConfigError>
where
    B: RetrievalBackend + Clone + 'static,
{
    let kind = params.kind().ok_or_else(|| ConfigError::UnknownClassName {
        classifier: name.to_string(),
        class_name: params.class_name.clone(),
    })?;
    let normalizer = ctx.normalizer(name, params)?;

    let classifier: Arc<dyn Classifier> = match kind {
        StrategyKind::Jaccard => {
            let threshold = params.require(name, "score_threshold", &params.score_threshold)?;
            Arc::new(
                JaccardClassifier::new(name, normalizer, ctx.source(name, params)?, threshold)
                    .with_len_limit(params.len_limit),
            )
        }
        StrategyKind::RulePattern => {
            let strip = Regex::new(params.rule_patterns()).map_err(|e| {
                ConfigError::InvalidParameter {
                    classifier: name.to_string(),
                    parameter: "patterns",
                    reason: e.to_string(),
                }
            })?;
            Arc::new(
                RulePatternClassifier::new(
                    name,
                    normalizer,
                    ctx.source(name, params)?,
                    params.rule_topic(),
                    strip,
                )
                .with_len_limit(params.len_limit),
            )
        }
        StrategyKind::Tfidf => {
            let threshold = params.require(name, "score_threshold", &params.score_threshold)?;
            let file = params.require(name, "etalons_file", &params.etalons_file)?;
            let records = read_etalons(&ctx.data_dir.join(file)).map_err(|e| init_error(name, e))?;
            Arc::new(
                TfidfClassifier::build(name, normalizer, &records, threshold)
                    .map_err(|e| init_error(name, e))?
                    .with_len_limit(params.len_limit),
            )
        }
        StrategyKind::Sbert => {
            let threshold = params.require(name, "score_threshold", &params.score_threshold)?;
            let model_dir = ctx.model_path(&params.model_dir);
            let encoder = ctx.encoder(name, model_dir)?;
            let ranker = EmbeddingRanker::new(encoder, EmbeddingCache::new(ctx.embedding_cache_capacity));
            Arc::new(
                SbertClassifier::new(name, normalizer, ctx.source(name, params)?, ranker, threshold)
                    .with_num_candidates(params.num_candidates)
                    .with_len_limit(params.len_limit),
            )
        }
        StrategyKind::SbertT5 => {
            let sbert_score = params.require(name, "sbert_score", &params.sbert_score)?;
            let t5_score = params.require(name, "t5_score", &params.t5_score)?;
            let model_dir = ctx.model_path(&params.model_dir);
            let encoder = ctx.encoder(name, model_dir)?;
            let ranker = EmbeddingRanker::new(encoder, EmbeddingCache::new(ctx.embedding_cache_capacity));
            let validator = load_validator(ctx, name, params, t5_score)?;
            Arc::new(
                SbertT5Classifier::new(
                    name,
                    normalizer,
                    ctx.source(name, params)?,
                    ranker,
                    validator,
                    sbert_score,
                )
                .with_num_candidates(params.num_candidates)
                .with_len_limit(params.len_limit),
            )
        }
    };

    info!(classifier = %name, strategy = %kind, "Classifier ready");
    Ok(classifier)
}

fn load_validator<B>(
    ctx: &BuildContext<B>,
    name: &str,
    params: &ClassifierParams,
    t5_score: f32,
) -> Result<Arc<RelevanceValidator>, ConfigError> {
    let mut config = match ctx.model_path(&params.validator_dir) {
        Some(dir) => ValidatorConfig::new(dir),
        None => {
            warn!(classifier = %name, "No validator_dir configured, relevance validator runs as a stub");
            ValidatorConfig::stub()
        }
    };
    if let Some(tokenizer) = ctx.model_path(&params.tokenizer_dir) {
        config = config.with_tokenizer(tokenizer);
    }
    config.threshold = t5_score;

    RelevanceValidator::load(config)
        .map(Arc::new)
        .map_err(|e| init_error(name, e))
}

/// Builds every classifier declared in `file`, keyed by name.
pub fn build_classifiers<B>(
    ctx: &mut BuildContext<B>,
    file: &ClassifiersFile,
) -> Result<BTreeMap<String, Arc<dyn Classifier>>, ConfigError>
where
    B: RetrievalBackend + Clone + 'static,
{
    let mut classifiers = BTreeMap::new();
    for (name, params) in &file.classifiers {
        classifiers.insert(name.clone(), build_classifier(ctx, name, params)?);
    }
    Ok(classifiers)
}
