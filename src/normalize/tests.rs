use super::lemmatizer::parse_mystem_output;
use super::*;
use std::collections::BTreeMap;
use std::io::Write;
use std::sync::Arc;

use serial_test::serial;

fn tax_lemmatizer() -> Arc<dyn Lemmatizer> {
    Arc::new(TableLemmatizer::new([
        ("оплатить", "оплата"),
        ("налога", "налог"),
        ("налоги", "налог"),
        ("платить", "оплата"),
        ("взносы", "взнос"),
        ("сборы", "сбор"),
    ]))
}

#[test]
fn test_strip_punctuation() {
    assert_eq!(strip_punctuation("Как, оплатить?!"), "Как  оплатить  ");
    assert_eq!(strip_punctuation("a\nb"), "a\nb");
}

#[test]
fn test_lemmatize_texts_keeps_batch_alignment() {
    let normalizer = TextNormalizer::new(tax_lemmatizer());

    let lemmas = normalizer
        .lemmatize_texts(&["Оплатить налоги!", "", "взносы\nи сборы"])
        .unwrap();

    assert_eq!(lemmas.len(), 3);
    assert_eq!(lemmas[0], vec!["оплата", "налог"]);
    assert!(lemmas[1].is_empty());
    assert_eq!(lemmas[2], vec!["взнос", "и", "сбор"]);
}

#[test]
fn test_lemmatize_texts_empty_batch() {
    let normalizer = TextNormalizer::new(tax_lemmatizer());
    let texts: [&str; 0] = [];

    assert!(normalizer.lemmatize_texts(&texts).unwrap().is_empty());
}

#[test]
fn test_lemmatize_texts_drops_trailing_segment() {
    struct TrailingNewline;
    impl Lemmatizer for TrailingNewline {
        fn lemmatize(&self, text: &str) -> Result<String, NormalizeError> {
            Ok(format!("{text}\n"))
        }
    }

    let normalizer = TextNormalizer::new(Arc::new(TrailingNewline));
    let lemmas = normalizer.lemmatize_texts(&["один", "два"]).unwrap();

    assert_eq!(lemmas, vec![vec!["один"], vec!["два"]]);
}

#[test]
fn test_lemmatize_texts_segment_mismatch() {
    struct Flattening;
    impl Lemmatizer for Flattening {
        fn lemmatize(&self, text: &str) -> Result<String, NormalizeError> {
            Ok(text.replace('\n', " "))
        }
    }

    let normalizer = TextNormalizer::new(Arc::new(Flattening));
    let err = normalizer.lemmatize_texts(&["один", "два"]).unwrap_err();

    assert!(matches!(
        err,
        NormalizeError::SegmentMismatch {
            expected: 2,
            actual: 1
        }
    ));
}

#[test]
fn test_stopwords_are_lemmatized_and_removed() {
    let normalizer = TextNormalizer::new(tax_lemmatizer())
        .with_stopwords(&["как", "налога"])
        .unwrap();

    assert_eq!(normalizer.stopwords(), &["налог", "как"]);
    assert_eq!(
        normalizer.normalize_one("Как оплатить налоги").unwrap(),
        vec!["оплата"]
    );
}

#[test]
fn test_stopwords_match_whole_words_only() {
    let normalizer = TextNormalizer::new(tax_lemmatizer())
        .with_stopwords(&["на"])
        .unwrap();

    assert_eq!(
        normalizer.normalize_one("на налог").unwrap(),
        vec!["налог"]
    );
}

#[test]
fn test_multiword_stopword() {
    let normalizer = TextNormalizer::new(tax_lemmatizer())
        .with_stopwords(&["в том числе", "в"])
        .unwrap();

    assert_eq!(
        normalizer.normalize_one("налог в том числе взносы").unwrap(),
        vec!["налог", "взнос"]
    );
}

#[test]
fn test_synonyms_fold_before_stopwords() {
    let mut table = BTreeMap::new();
    table.insert(
        "оплата".to_string(),
        vec!["перечисление".to_string(), "платить".to_string()],
    );
    table.insert("сбор".to_string(), vec!["пошлина".to_string()]);

    let normalizer = TextNormalizer::new(tax_lemmatizer())
        .with_synonyms(&table)
        .unwrap()
        .with_stopwords(&["сборы"])
        .unwrap();

    let tokens = normalizer
        .normalize(&["перечисление налога", "платить пошлина"])
        .unwrap();

    assert_eq!(tokens[0], vec!["оплата", "налог"]);
    assert_eq!(tokens[1], vec!["оплата"]);
}

#[test]
fn test_normalize_is_deterministic() {
    let normalizer = TextNormalizer::new(tax_lemmatizer())
        .with_stopwords(&["как"])
        .unwrap();

    let first = normalizer.normalized_string("Как оплатить налог?").unwrap();
    let second = normalizer.normalized_string("Как оплатить налог?").unwrap();

    assert_eq!(first, "оплата налог");
    assert_eq!(first, second);
}

#[test]
fn test_table_lemmatizer_keeps_separators() {
    let lemmatizer = TableLemmatizer::new([("налоги", "налог")]);

    assert_eq!(
        lemmatizer.lemmatize("налоги\n  налоги").unwrap(),
        "налог\n  налог"
    );
    assert!(TableLemmatizer::identity().is_empty());
}

#[test]
fn test_parse_mystem_output_with_inline_breaks() {
    let raw = r#"[{"analysis":[{"lex":"оплата"}],"text":"оплаты"},{"text":" "},{"analysis":[{"lex":"налог"}],"text":"налогов"},{"text":"\n"},{"analysis":[],"text":"xyz"},{"text":"\n"}]"#;

    assert_eq!(parse_mystem_output(raw).unwrap(), "оплата налог\nxyz\n");
}

#[test]
fn test_parse_mystem_output_line_per_array() {
    let raw = "[{\"analysis\":[{\"lex\":\"налог\"}],\"text\":\"налоги\"}]\n[]\n[{\"analysis\":[{\"lex\":\"взнос\"}],\"text\":\"взносы\"}]\n";

    assert_eq!(parse_mystem_output(raw).unwrap(), "налог\n\nвзнос");
}

#[test]
fn test_parse_mystem_output_rejects_garbage() {
    let err = parse_mystem_output("not json").unwrap_err();
    assert!(matches!(err, NormalizeError::AnalyzerOutput { .. }));
}

#[test]
#[serial]
fn test_missing_mystem_binary() {
    let lemmatizer = MystemLemmatizer::new("/nonexistent/bin/mystem");
    let err = lemmatizer.lemmatize("налог").unwrap_err();

    assert!(matches!(err, NormalizeError::AnalyzerSpawn { .. }));
}

/// Writes an executable stand-in analyzer running `body`. Every launch appends a line to
/// `<script>.starts`.
#[cfg(unix)]
fn fake_analyzer(dir: &std::path::Path, body: &str) -> std::path::PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("mystem");
    std::fs::write(&path, format!("#!/bin/sh\necho started >> \"$0.starts\"\n{body}")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[cfg(unix)]
fn analyzer_starts(program: &std::path::Path) -> usize {
    let starts = program.with_extension("starts");
    std::fs::read_to_string(starts).map_or(0, |log| log.lines().count())
}

#[cfg(unix)]
const ECHO_ANALYZER: &str = r#"while IFS= read -r line; do
  printf '[{"text":"%s"},{"text":"\\n"}]\n' "$line"
done
"#;

#[cfg(unix)]
#[test]
#[serial]
fn test_mystem_process_is_reused_across_calls() {
    let dir = tempfile::tempdir().unwrap();
    let program = fake_analyzer(dir.path(), ECHO_ANALYZER);

    let lemmatizer = MystemLemmatizer::start(&program).unwrap();
    assert_eq!(analyzer_starts(&program), 1);

    assert_eq!(lemmatizer.lemmatize("налог").unwrap(), "налог");
    assert_eq!(
        lemmatizer.lemmatize("оплата налог\nвзнос\n\nсбор").unwrap(),
        "оплата налог\nвзнос\n\nсбор"
    );
    assert_eq!(analyzer_starts(&program), 1);
}

#[cfg(unix)]
#[test]
#[serial]
fn test_mystem_restarts_after_analyzer_exits() {
    let dir = tempfile::tempdir().unwrap();
    let program = fake_analyzer(dir.path(), "exit 1\n");

    let lemmatizer = MystemLemmatizer::new(&program);
    assert_eq!(analyzer_starts(&program), 0);

    let err = lemmatizer.lemmatize("налог").unwrap_err();
    assert!(matches!(
        err,
        NormalizeError::AnalyzerIo { .. } | NormalizeError::AnalyzerFailed { .. }
    ));

    assert!(lemmatizer.lemmatize("налог").is_err());
    assert_eq!(analyzer_starts(&program), 2);
}

#[cfg(unix)]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[serial]
async fn test_mystem_runs_inside_multi_thread_runtime() {
    let dir = tempfile::tempdir().unwrap();
    let program = fake_analyzer(dir.path(), ECHO_ANALYZER);
    let lemmatizer = Arc::new(MystemLemmatizer::start(&program).unwrap());

    let handles: Vec<_> = ["налог", "взнос"]
        .into_iter()
        .map(|word| {
            let lemmatizer = Arc::clone(&lemmatizer);
            tokio::spawn(async move { lemmatizer.lemmatize(word) })
        })
        .collect();

    for (handle, word) in handles.into_iter().zip(["налог", "взнос"]) {
        assert_eq!(handle.await.unwrap().unwrap(), word);
    }
    assert_eq!(analyzer_starts(&program), 1);
}

#[test]
fn test_load_stopwords_from_files() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("common.tsv");
    let second = dir.path().join("domain.tsv");

    let mut file = std::fs::File::create(&first).unwrap();
    writeln!(file, "stopwords\nкак\nи\n").unwrap();
    let mut file = std::fs::File::create(&second).unwrap();
    writeln!(file, "id\tstopwords\n1\tпожалуйста\n").unwrap();

    let words = load_stopwords(&[first, second]).unwrap();

    assert_eq!(words, vec!["как", "и", "пожалуйста"]);
}

#[test]
fn test_load_stopwords_missing_column() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.tsv");
    std::fs::write(&path, "words\nкак\n").unwrap();

    let err = load_stopwords(&[path]).unwrap_err();
    assert!(matches!(err, NormalizeError::Stopwords(_)));
}
