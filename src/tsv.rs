//! Tab-separated data files (stopword lists, TF-IDF etalons).
//!
//! The first non-empty record is the header. A cell that starts with `"` is quoted: it may
//! contain tabs and line breaks, and `""` inside it stands for one quote. Blank records are
//! skipped and missing trailing cells read as empty strings.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors raised while reading a TSV file.
#[derive(Debug, Error)]
pub enum TsvError {
    /// File could not be read.
    #[error("failed to read '{path}': {source}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// File has no header line.
    #[error("'{path}' has no header line")]
    Empty {
        /// File path.
        path: PathBuf,
    },

    /// Header does not contain a required column.
    #[error("'{path}' has no column '{column}'")]
    MissingColumn {
        /// File path.
        path: PathBuf,
        /// Column name.
        column: String,
    },

    /// A cell could not be parsed.
    #[error("'{path}' row {row}: invalid {column} '{value}'")]
    InvalidValue {
        /// File path.
        path: PathBuf,
        /// 1-based data row.
        row: usize,
        /// Column name.
        column: String,
        /// Offending cell.
        value: String,
    },
}

/// A parsed TSV file.
#[derive(Debug, Clone)]
pub struct TsvTable {
    path: PathBuf,
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TsvTable {
    /// Reads and parses `path`.
    pub fn read(path: &Path) -> Result<Self, TsvError> {
        let content = std::fs::read_to_string(path).map_err(|source| TsvError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &content)
    }

    /// Parses `content`; `path` is only used in error messages.
    pub fn parse(path: &Path, content: &str) -> Result<Self, TsvError> {
        let mut records = split_records(content).into_iter();

        let header = records
            .next()
            .ok_or_else(|| TsvError::Empty {
                path: path.to_path_buf(),
            })?
            .into_iter()
            .map(|cell| cell.trim().to_string())
            .collect();

        Ok(Self {
            path: path.to_path_buf(),
            header,
            rows: records.collect(),
        })
    }

    /// Returns the values of `column`, one per row.
    pub fn column(&self, column: &str) -> Result<Vec<&str>, TsvError> {
        let idx = self.column_index(column)?;
        Ok(self
            .rows
            .iter()
            .map(|row| row.get(idx).map(String::as_str).unwrap_or(""))
            .collect())
    }

    /// Returns the values of several columns, row by row.
    pub fn columns<const N: usize>(&self, columns: [&str; N]) -> Result<Vec<[&str; N]>, TsvError> {
        let mut indices = [0usize; N];
        for (slot, column) in indices.iter_mut().zip(columns) {
            *slot = self.column_index(column)?;
        }

        Ok(self
            .rows
            .iter()
            .map(|row| indices.map(|idx| row.get(idx).map(String::as_str).unwrap_or("")))
            .collect())
    }

    /// Path the table was read from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if there are no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn column_index(&self, column: &str) -> Result<usize, TsvError> {
        self.header
            .iter()
            .position(|name| name == column)
            .ok_or_else(|| TsvError::MissingColumn {
                path: self.path.clone(),
                column: column.to_string(),
            })
    }
}

/// Splits tab-separated content into records, honouring quoted cells.
fn split_records(content: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut cell = String::new();
    let mut quoted = false;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if quoted {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    cell.push('"');
                }
                '"' => quoted = false,
                _ => cell.push(c),
            }
            continue;
        }

        match c {
            '"' if cell.is_empty() => quoted = true,
            '\t' => record.push(std::mem::take(&mut cell)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' | '\r' => {
                record.push(std::mem::take(&mut cell));
                push_record(&mut records, std::mem::take(&mut record));
            }
            _ => cell.push(c),
        }
    }

    if !cell.is_empty() || !record.is_empty() {
        record.push(cell);
        push_record(&mut records, record);
    }

    records
}

fn push_record(records: &mut Vec<Vec<String>>, record: Vec<String>) {
    let blank = record.len() == 1 && record[0].trim().is_empty();
    if !blank {
        records.push(record);
    }
}
