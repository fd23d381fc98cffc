//! Morphological analyzers.

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::LazyLock;

use parking_lot::Mutex;
use regex::{Captures, Regex};
use serde::Deserialize;
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::task::block_in_place;
use tracing::{debug, info, warn};

use super::error::NormalizeError;

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").expect("static word pattern"));

/// Replaces each word of a text with its dictionary form.
///
/// Implementations must keep every non-word character in place, newlines included, so that
/// a newline-joined batch can be split back into its parts.
pub trait Lemmatizer: Send + Sync {
    fn lemmatize(&self, text: &str) -> Result<String, NormalizeError>;
}

/// Lemmatizer backed by a long-lived `mystem` process.
///
/// The analyzer is started once and fed one line at a time; it answers every input line
/// with one JSON line. Calls are serialized on the pipe. A process that fails an exchange
/// or returns unreadable output is dropped and the next call starts a fresh one.
pub struct MystemLemmatizer {
    program: PathBuf,
    process: Mutex<Option<MystemProcess>>,
}

impl std::fmt::Debug for MystemLemmatizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MystemLemmatizer")
            .field("program", &self.program)
            .field("running", &self.process.lock().is_some())
            .finish()
    }
}

impl MystemLemmatizer {
    /// Creates the lemmatizer; the analyzer starts on first use.
    pub fn new<P: Into<PathBuf>>(program: P) -> Self {
        Self {
            program: program.into(),
            process: Mutex::new(None),
        }
    }

    /// Creates the lemmatizer and starts the analyzer right away.
    pub fn start<P: Into<PathBuf>>(program: P) -> Result<Self, NormalizeError> {
        let lemmatizer = Self::new(program);
        *lemmatizer.process.lock() = Some(MystemProcess::spawn(&lemmatizer.program)?);
        info!(program = %lemmatizer.program.display(), "Morphological analyzer started");
        Ok(lemmatizer)
    }

    fn run(&self, text: &str) -> Result<String, NormalizeError> {
        let mut guard = self.process.lock();
        let mut process = match guard.take() {
            Some(process) => process,
            None => MystemProcess::spawn(&self.program)?,
        };

        let mut lemmatized = String::with_capacity(text.len());
        for (idx, line) in text.split('\n').enumerate() {
            let raw = process.analyze_line(line).inspect_err(|e| {
                warn!(program = %self.program.display(), error = %e, "Analyzer exchange failed, restarting on next call");
            })?;
            if idx > 0 {
                lemmatized.push('\n');
            }
            lemmatized.push_str(parse_mystem_output(&raw)?.trim_end_matches('\n'));
        }

        *guard = Some(process);
        Ok(lemmatized)
    }
}

impl Lemmatizer for MystemLemmatizer {
    fn lemmatize(&self, text: &str) -> Result<String, NormalizeError> {
        let lemmatized = block_off_executor(|| self.run(text))?;

        debug!(
            input_len = text.len(),
            output_len = lemmatized.len(),
            "Lemmatized text"
        );

        Ok(lemmatized)
    }
}

/// Runs blocking pipe I/O without stalling other tasks on a multi-threaded runtime.
fn block_off_executor<T>(f: impl FnOnce() -> T) -> T {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => block_in_place(f),
        _ => f(),
    }
}

struct MystemProcess {
    program: PathBuf,
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl MystemProcess {
    fn spawn(program: &Path) -> Result<Self, NormalizeError> {
        let spawn_error = |source| NormalizeError::AnalyzerSpawn {
            program: program.to_path_buf(),
            source,
        };

        let mut child = Command::new(program)
            .args(["-c", "-l", "-d", "-e", "utf-8", "--format", "json"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(spawn_error)?;

        let pipes = child.stdin.take().zip(child.stdout.take());
        let Some((stdin, stdout)) = pipes else {
            let _ = child.kill();
            return Err(spawn_error(std::io::Error::other("analyzer pipes unavailable")));
        };

        Ok(Self {
            program: program.to_path_buf(),
            child,
            stdin,
            stdout: BufReader::new(stdout),
        })
    }

    /// Sends one line and reads the analyzer's JSON line for it.
    fn analyze_line(&mut self, line: &str) -> Result<String, NormalizeError> {
        let io_error = |source| NormalizeError::AnalyzerIo {
            program: self.program.clone(),
            source,
        };

        self.stdin
            .write_all(line.replace('\r', " ").as_bytes())
            .and_then(|()| self.stdin.write_all(b"\n"))
            .and_then(|()| self.stdin.flush())
            .map_err(io_error)?;

        let mut raw = String::new();
        let read = self.stdout.read_line(&mut raw).map_err(io_error)?;
        if read == 0 {
            let status = self
                .child
                .try_wait()
                .ok()
                .flatten()
                .map_or_else(|| "running".to_string(), |status| status.to_string());
            return Err(NormalizeError::AnalyzerFailed {
                program: self.program.clone(),
                status,
                stderr: "analyzer closed its output".to_string(),
            });
        }

        Ok(raw)
    }
}

impl Drop for MystemProcess {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

#[derive(Debug, Deserialize)]
struct MystemToken {
    text: String,
    #[serde(default)]
    analysis: Vec<MystemAnalysis>,
}

#[derive(Debug, Deserialize)]
struct MystemAnalysis {
    lex: String,
}

impl MystemToken {
    fn lemma(&self) -> &str {
        self.analysis
            .first()
            .map(|a| a.lex.as_str())
            .unwrap_or(&self.text)
    }
}

/// Rebuilds plain text from `mystem --format json` output.
///
/// The analyzer emits one JSON array per input line. Depending on the version, line breaks
/// either show up as `"\n"` tokens or only as array boundaries; both layouts are accepted.
pub(crate) fn parse_mystem_output(raw: &str) -> Result<String, NormalizeError> {
    let lines = serde_json::Deserializer::from_str(raw)
        .into_iter::<Vec<MystemToken>>()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| NormalizeError::AnalyzerOutput {
            reason: e.to_string(),
        })?;

    let inline_breaks = lines
        .iter()
        .flatten()
        .any(|token| token.text.contains('\n'));

    let mut lemmatized = String::with_capacity(raw.len() / 4);
    for (idx, line) in lines.iter().enumerate() {
        if idx > 0 && !inline_breaks {
            lemmatized.push('\n');
        }
        for token in line {
            lemmatized.push_str(token.lemma());
        }
    }

    Ok(lemmatized)
}

/// Dictionary lookup lemmatizer. Unknown words are kept as-is.
///
/// Useful where the analyzer binary is not installed and in tests.
#[derive(Debug, Clone, Default)]
pub struct TableLemmatizer {
    lemmas: HashMap<String, String>,
}

impl TableLemmatizer {
    pub fn new<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            lemmas: pairs
                .into_iter()
                .map(|(word, lemma)| (word.into(), lemma.into()))
                .collect(),
        }
    }

    /// Lemmatizer that returns every word unchanged.
    pub fn identity() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lemmas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lemmas.is_empty()
    }
}

impl Lemmatizer for TableLemmatizer {
    fn lemmatize(&self, text: &str) -> Result<String, NormalizeError> {
        Ok(WORD
            .replace_all(text, |caps: &Captures| {
                let word = &caps[0];
                self.lemmas
                    .get(word)
                    .cloned()
                    .unwrap_or_else(|| word.to_string())
            })
            .into_owned())
    }
}
