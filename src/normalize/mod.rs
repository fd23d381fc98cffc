//! Text normalization: lemmatization, synonym folding, stopword removal.
//!
//! The same [`TextNormalizer`] must be applied to queries and to the etalons they are
//! compared against; lemma comparisons are meaningless otherwise.

pub mod error;
pub mod lemmatizer;
pub mod normalizer;
pub mod stopwords;

#[cfg(test)]
mod tests;

pub use error::NormalizeError;
pub use lemmatizer::{Lemmatizer, MystemLemmatizer, TableLemmatizer};
pub use normalizer::{TextNormalizer, strip_punctuation};
pub use stopwords::{STOPWORDS_COLUMN, load_stopwords};
