//! Cross-cutting, shared constants.
//!
//! Per-classifier values (thresholds, candidate caps, index names) come from the classifier
//! configuration file; the values here are defaults and fixed model contracts.

/// Documents requested from the search backend per query before client-side truncation.
pub const DEFAULT_MAX_HITS: usize = 300;

/// Capacity of the candidate embedding cache (entries).
pub const DEFAULT_EMBEDDING_CACHE_CAPACITY: u64 = 50_000;

/// Max tokens fed to the sentence encoder.
pub const DEFAULT_ENCODER_MAX_SEQ_LEN: usize = 128;

/// Embedding width produced by the stub encoder.
pub const STUB_EMBEDDING_DIM: usize = 768;

/// Max decoder positions (including the start token) for relevance validation.
pub const VALIDATOR_MAX_LENGTH: usize = 64;

/// Max tokens fed to the validator encoder.
pub const VALIDATOR_MAX_SEQ_LEN: usize = 512;

/// Literal the validator must generate for an answer to count as relevant.
pub const AFFIRMATIVE_ANSWER: &str = "Правда";

/// Literal the stub validator emits for irrelevant answers.
pub const NEGATIVE_ANSWER: &str = "Ложь";

/// Vocabulary index whose first-step sigmoid is read as the validator confidence.
///
/// Treated as an opaque property of the trained validator; do not re-derive.
pub const AFFIRMATIVE_LOGIT_INDEX: usize = 2;

/// Scenario key used when a system identifier has no explicit scenario.
pub const DEFAULT_SCENARIO: &str = "default";
