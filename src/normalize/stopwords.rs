use std::path::Path;

use tracing::debug;

use super::error::NormalizeError;
use crate::tsv::TsvTable;

/// Header of the stopword column.
pub const STOPWORDS_COLUMN: &str = "stopwords";

/// Reads and concatenates stopword files (TSV with a `stopwords` column).
pub fn load_stopwords<P: AsRef<Path>>(files: &[P]) -> Result<Vec<String>, NormalizeError> {
    let mut words = Vec::new();

    for file in files {
        let table = TsvTable::read(file.as_ref())?;
        let column = table.column(STOPWORDS_COLUMN)?;
        words.extend(
            column
                .into_iter()
                .map(str::trim)
                .filter(|word| !word.is_empty())
                .map(str::to_string),
        );
        debug!(file = %file.as_ref().display(), total = words.len(), "Loaded stopword file");
    }

    Ok(words)
}
