use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};

use regex::{NoExpand, Regex};
use tracing::debug;

use super::error::NormalizeError;
use super::lemmatizer::Lemmatizer;

static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s]").expect("static punctuation pattern"));

/// Strips punctuation: every character that is neither a word character nor whitespace
/// becomes a space.
pub fn strip_punctuation(text: &str) -> String {
    NON_WORD.replace_all(text, " ").into_owned()
}

/// Turns raw text into lemma tokens with synonyms folded and stopwords removed.
///
/// Stopwords and synonym variants are lemmatized once, when they are installed, with the
/// same lemmatizer used for queries.
#[derive(Clone)]
pub struct TextNormalizer {
    lemmatizer: Arc<dyn Lemmatizer>,
    stopwords: Vec<String>,
    stopword_pattern: Option<Regex>,
    synonyms: Vec<(String, Regex)>,
}

impl std::fmt::Debug for TextNormalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextNormalizer")
            .field("stopwords", &self.stopwords.len())
            .field("synonyms", &self.synonyms.len())
            .finish()
    }
}

impl TextNormalizer {
    pub fn new(lemmatizer: Arc<dyn Lemmatizer>) -> Self {
        Self {
            lemmatizer,
            stopwords: Vec::new(),
            stopword_pattern: None,
            synonyms: Vec::new(),
        }
    }

    /// Installs a stopword list. Each entry is lemmatized; multi-word entries are allowed.
    pub fn with_stopwords<S: AsRef<str>>(mut self, words: &[S]) -> Result<Self, NormalizeError> {
        let mut lemmas: Vec<String> = self
            .lemmatize_texts(words)?
            .into_iter()
            .map(|tokens| tokens.join(" "))
            .filter(|lemma| !lemma.is_empty())
            .collect();
        lemmas.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        lemmas.dedup();

        self.stopword_pattern = word_alternation(&lemmas)?;
        debug!(count = lemmas.len(), "Installed stopwords");
        self.stopwords = lemmas;

        Ok(self)
    }

    /// Installs a synonym table: canonical lemma -> variants. Variants are lemmatized.
    pub fn with_synonyms(
        mut self,
        table: &BTreeMap<String, Vec<String>>,
    ) -> Result<Self, NormalizeError> {
        let mut synonyms = Vec::with_capacity(table.len());

        for (canonical, variants) in table {
            let mut lemmas: Vec<String> = self
                .lemmatize_texts(variants.as_slice())?
                .into_iter()
                .map(|tokens| tokens.join(" "))
                .filter(|lemma| !lemma.is_empty() && lemma != canonical)
                .collect();
            lemmas.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
            lemmas.dedup();

            if let Some(pattern) = word_alternation(&lemmas)? {
                synonyms.push((canonical.clone(), pattern));
            }
        }

        debug!(groups = synonyms.len(), "Installed synonyms");
        self.synonyms = synonyms;

        Ok(self)
    }

    /// Lemmatized stopwords, longest first.
    pub fn stopwords(&self) -> &[String] {
        &self.stopwords
    }

    /// Lemmatizes a batch in a single analyzer call.
    ///
    /// Texts are cleaned of punctuation, lowercased and joined with `\n`; the analyzer output
    /// is split back on `\n`. Newlines inside a text are treated as spaces so that output
    /// segment `i` always belongs to input `i`.
    pub fn lemmatize_texts<S: AsRef<str>>(
        &self,
        texts: &[S],
    ) -> Result<Vec<Vec<String>>, NormalizeError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let joined = texts
            .iter()
            .map(|text| text.as_ref().replace(['\n', '\r'], " "))
            .collect::<Vec<_>>()
            .join("\n");
        let prepared = strip_punctuation(&joined).to_lowercase();

        let lemmatized = self.lemmatizer.lemmatize(&prepared)?;

        let mut segments: Vec<Vec<String>> = lemmatized
            .split('\n')
            .map(|segment| segment.split_whitespace().map(str::to_string).collect())
            .collect();

        if segments.len() < texts.len() {
            return Err(NormalizeError::SegmentMismatch {
                expected: texts.len(),
                actual: segments.len(),
            });
        }
        segments.truncate(texts.len());

        Ok(segments)
    }

    /// Full pipeline for a batch: lemmatize, fold synonyms, drop stopwords.
    pub fn normalize<S: AsRef<str>>(&self, texts: &[S]) -> Result<Vec<Vec<String>>, NormalizeError> {
        let lemmas = self.lemmatize_texts(texts)?;

        if self.synonyms.is_empty() {
            return Ok(lemmas
                .iter()
                .map(|tokens| self.remove_stopwords(&tokens.join(" ")))
                .collect());
        }

        let mut joined = lemmas
            .iter()
            .map(|tokens| tokens.join(" "))
            .collect::<Vec<_>>()
            .join("\n");

        for (canonical, pattern) in &self.synonyms {
            joined = pattern
                .replace_all(&joined, NoExpand(canonical.as_str()))
                .into_owned();
        }

        Ok(joined
            .split('\n')
            .take(texts.len())
            .map(|segment| self.remove_stopwords(segment))
            .collect())
    }

    /// Normalizes a single text into tokens.
    pub fn normalize_one(&self, text: &str) -> Result<Vec<String>, NormalizeError> {
        Ok(self.normalize(&[text])?.into_iter().next().unwrap_or_default())
    }

    /// Normalizes a single text into a space-joined lemma string.
    pub fn normalized_string(&self, text: &str) -> Result<String, NormalizeError> {
        Ok(self.normalize_one(text)?.join(" "))
    }

    /// Removes whole-word stopword matches from already lemmatized text.
    pub fn remove_stopwords(&self, lemmatized: &str) -> Vec<String> {
        let cleaned = match &self.stopword_pattern {
            Some(pattern) => pattern.replace_all(lemmatized, " "),
            None => lemmatized.into(),
        };
        cleaned.split_whitespace().map(str::to_string).collect()
    }
}

/// Compiles `\b(?:w1|w2|...)\b`; `None` for an empty word list.
fn word_alternation(words: &[String]) -> Result<Option<Regex>, NormalizeError> {
    if words.is_empty() {
        return Ok(None);
    }

    let alternation = words
        .iter()
        .map(|word| regex::escape(word))
        .collect::<Vec<_>>()
        .join("|");
    let pattern = format!(r"\b(?:{alternation})\b");

    Regex::new(&pattern)
        .map(Some)
        .map_err(|source| NormalizeError::InvalidPattern { pattern, source })
}
