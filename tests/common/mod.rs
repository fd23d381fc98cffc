//! Shared harness: builds the cascade from a YAML config and serves it on an ephemeral port.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use etalon::{
    AnswerTemplate, AppState, BuildContext, Candidate, ClassifiersFile, MockRetrievalBackend,
    Orchestrator, ScenarioTable, SysPubMapping, TableLemmatizer, build_classifiers,
    create_router_with_state,
};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub const PUB: i64 = 7;
pub const CLUSTERS: &str = "clusters";
pub const ANSWERS: &str = "answers";

pub const CLASSIFIERS_YAML: &str = r#"
classifiers:
  kosgu:
    class_name: RulePatternClassifier
    es_clusters_index: clusters
    es_answers_index: answers
  jaccard:
    class_name: JaccardClassifier
    score_threshold: 0.5
    stopwords_files: [stopwords.tsv]
    es_clusters_index: clusters
    es_answers_index: answers
  tfidf:
    class_name: TFIDFClassifier
    score_threshold: 0.5
    etalons_file: etalons.tsv
scenarios:
  prepend_to_all: [kosgu]
  default: [jaccard, tfidf]
  by_sys_id:
    9: [tfidf]
"#;

pub struct TestServer {
    pub addr: SocketAddr,
    pub backend: Arc<MockRetrievalBackend>,
    _data: TempDir,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub fn seeded_backend() -> Arc<MockRetrievalBackend> {
    let backend = Arc::new(MockRetrievalBackend::new());

    backend.insert_candidate(
        CLUSTERS,
        Candidate {
            id: 1,
            raw_cluster_text: "Как оплатить налог".to_string(),
            lemmatized_cluster_text: "оплатить налог".to_string(),
            parent_pub_list: [PUB].into_iter().collect(),
            topic: String::new(),
            short_answer_text: String::new(),
        },
    );
    backend.insert_candidate(
        CLUSTERS,
        Candidate {
            id: 226,
            raw_cluster_text: "КОСГУ 226 код".to_string(),
            lemmatized_cluster_text: "226 код".to_string(),
            parent_pub_list: [PUB].into_iter().collect(),
            topic: "КОСГУ робот".to_string(),
            short_answer_text: String::new(),
        },
    );

    backend.insert_answer(
        ANSWERS,
        AnswerTemplate {
            template_id: 1,
            template_text: "Оплатить налог можно онлайн".to_string(),
            pub_id: PUB,
        },
    );
    backend.insert_answer(
        ANSWERS,
        AnswerTemplate {
            template_id: 226,
            template_text: "Код 226 относится к прочим работам и услугам".to_string(),
            pub_id: PUB,
        },
    );

    backend
}

fn write_data_dir() -> TempDir {
    let data = tempfile::tempdir().expect("tempdir");
    std::fs::write(data.path().join("stopwords.tsv"), "stopwords\nкак\n").expect("stopwords");
    std::fs::write(
        data.path().join("etalons.tsv"),
        "label\tquery\ttemplateText\n\
         20\tсправка выдача\tСправку выдают в личном кабинете\n\
         30\tпенсия расчет\tРасчет пенсии доступен на портале\n",
    )
    .expect("etalons");
    data
}

pub async fn spawn_test_server(mapping: SysPubMapping) -> anyhow::Result<TestServer> {
    let data = write_data_dir();
    let backend = seeded_backend();

    let file = ClassifiersFile::parse(Path::new("classifiers.yml"), CLASSIFIERS_YAML)?;
    file.validate(data.path())?;

    let mut ctx = BuildContext::new(
        Arc::clone(&backend),
        Arc::new(TableLemmatizer::identity()),
        data.path(),
        data.path().join("models"),
    );
    let classifiers = build_classifiers(&mut ctx, &file)?;
    let orchestrator = Orchestrator::new(classifiers, ScenarioTable::from_section(&file.scenarios))?;

    let state = AppState::new(Arc::new(orchestrator), Arc::new(mapping), Arc::clone(&backend));
    let app = create_router_with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let handle = tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    Ok(TestServer {
        addr,
        backend,
        _data: data,
        handle,
    })
}

pub async fn search(server: &TestServer, body: serde_json::Value) -> (u16, String, serde_json::Value) {
    let response = reqwest::Client::new()
        .post(format!("{}/search", server.url()))
        .json(&body)
        .send()
        .await
        .expect("request");

    let status = response.status().as_u16();
    let header = response
        .headers()
        .get(etalon::gateway::ETALON_STATUS_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let json = response.json().await.expect("json body");
    (status, header, json)
}
