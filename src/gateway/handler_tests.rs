use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use axum::{Router, body::Body, http::Request, http::StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use super::handler::resolve_sys_id;
use super::payload::{Identifier, SearchRequest};
use super::*;
use crate::classifier::{Classifier, EtalonSource, JaccardClassifier};
use crate::config::SysPubMapping;
use crate::normalize::{TableLemmatizer, TextNormalizer};
use crate::retrieval::{AnswerTemplate, Candidate, MockRetrievalBackend};
use crate::scenario::{Orchestrator, ScenarioTable};

const PUB: i64 = 7;

fn seeded_backend() -> Arc<MockRetrievalBackend> {
    let backend = Arc::new(MockRetrievalBackend::new());
    backend.insert_candidate(
        "clusters",
        Candidate {
            id: 1,
            raw_cluster_text: "Как оплатить налог".to_string(),
            lemmatized_cluster_text: "оплата налог".to_string(),
            parent_pub_list: [PUB].into_iter().collect(),
            topic: String::new(),
            short_answer_text: String::new(),
        },
    );
    backend.insert_answer(
        "answers",
        AnswerTemplate {
            template_id: 1,
            template_text: "Оплатить налог можно онлайн".to_string(),
            pub_id: PUB,
        },
    );
    backend
}

fn create_test_router(backend: Arc<MockRetrievalBackend>, mapping: SysPubMapping) -> Router {
    let normalizer = TextNormalizer::new(Arc::new(TableLemmatizer::new([("оплатить", "оплата")])));
    let source = EtalonSource {
        backend: Arc::clone(&backend),
        clusters_index: "clusters".to_string(),
        answers_index: "answers".to_string(),
        max_hits: 300,
    };
    let jaccard: Arc<dyn Classifier> =
        Arc::new(JaccardClassifier::new("jaccard", normalizer, source, 0.6));

    let classifiers = BTreeMap::from([("jaccard".to_string(), jaccard)]);
    let table = ScenarioTable::new(
        Vec::new(),
        vec!["jaccard".to_string()],
        BTreeMap::from([("empty".to_string(), Vec::new())]),
    );
    let orchestrator = Orchestrator::new(classifiers, table).unwrap();

    create_router_with_state(AppState::new(Arc::new(orchestrator), Arc::new(mapping), backend))
}

async fn send_search_request(router: &Router, body: serde_json::Value) -> axum::response::Response {
    let request = Request::builder()
        .method("POST")
        .uri("/search")
        .header("Content-Type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap();

    router.clone().oneshot(request).await.unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn status_header(response: &axum::response::Response) -> &str {
    response
        .headers()
        .get(ETALON_STATUS_HEADER)
        .unwrap()
        .to_str()
        .unwrap()
}

#[tokio::test]
async fn test_search_match() {
    let router = create_test_router(seeded_backend(), SysPubMapping::default());

    let response = send_search_request(
        &router,
        serde_json::json!({ "pubid": PUB, "text": "Оплатить налог!" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(status_header(&response), "MATCHED");

    let body = body_json(response).await;
    assert_eq!(body["templateId"], 1);
    assert_eq!(body["templateText"], "Оплатить налог можно онлайн");
    assert_eq!(body["etalon_text"], "Как оплатить налог");
    assert_eq!(body["algorithm"], "Jaccard");
    assert_eq!(body["score"], 1.0);
}

#[tokio::test]
async fn test_search_accepts_numeric_and_string_chat_id() {
    let router = create_test_router(seeded_backend(), SysPubMapping::default());

    for chat_id in [serde_json::json!(42), serde_json::json!("chat-42")] {
        let response = send_search_request(
            &router,
            serde_json::json!({ "pubid": PUB, "chat_id": chat_id, "text": "Оплатить налог!" }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(status_header(&response), "MATCHED");
        assert_eq!(body_json(response).await["templateId"], 1);
    }
}

#[tokio::test]
async fn test_search_not_found() {
    let router = create_test_router(seeded_backend(), SysPubMapping::default());

    let response = send_search_request(
        &router,
        serde_json::json!({ "pubid": PUB, "sys_id": 3, "text": "справка о доходах" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(status_header(&response), "NOT_FOUND");

    let body = body_json(response).await;
    assert_eq!(body["status"], "not_found");
    assert_eq!(body["sys_id"], "3");
    assert_eq!(body["attempts"][0]["classifier"], "jaccard");
    assert_eq!(body["attempts"][0]["rejection"]["reason"], "empty_retrieval");
}

#[tokio::test]
async fn test_search_mapping_selects_scenario() {
    let mapping = SysPubMapping::parse(Path::new("mapping.json"), r#"{ "empty": [7] }"#).unwrap();
    let router = create_test_router(seeded_backend(), mapping);

    let response = send_search_request(
        &router,
        serde_json::json!({ "pubid": PUB, "text": "оплатить налог" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["sys_id"], "empty");
    assert_eq!(body["attempts"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_search_backend_unavailable() {
    let backend = seeded_backend();
    backend.set_unavailable(true);
    let router = create_test_router(backend, SysPubMapping::default());

    let response = send_search_request(
        &router,
        serde_json::json!({ "pubid": PUB, "text": "оплатить налог" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(status_header(&response), "backend_error");
}

#[tokio::test]
async fn test_search_rejects_invalid_schema() {
    let router = create_test_router(seeded_backend(), SysPubMapping::default());

    let response = send_search_request(&router, serde_json::json!({ "text": "налог" })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response =
        send_search_request(&router, serde_json::json!({ "pubid": PUB, "text": "   " })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["code"], 400);
}

#[tokio::test]
async fn test_health_endpoint() {
    let router = create_test_router(seeded_backend(), SysPubMapping::default());

    let request = Request::builder()
        .method("GET")
        .uri("/healthz")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(status_header(&response), "healthy");
    assert_eq!(body_json(response).await["status"], "ok");
}

#[tokio::test]
async fn test_ready_endpoint_reflects_backend() {
    let backend = seeded_backend();
    let router = create_test_router(Arc::clone(&backend), SysPubMapping::default());

    let ready = || {
        Request::builder()
            .method("GET")
            .uri("/ready")
            .body(Body::empty())
            .unwrap()
    };

    let response = router.clone().oneshot(ready()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["components"]["retrieval"], "ready");
    assert_eq!(body["components"]["classifiers"], 1);

    backend.set_unavailable(true);
    let response = router.oneshot(ready()).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(status_header(&response), "not_ready");
}

#[test]
fn test_resolve_sys_id_precedence() {
    let mapping = SysPubMapping::parse(Path::new("mapping.json"), r#"{ "12": [7] }"#).unwrap();
    let request = |sys_id: Option<Identifier>| SearchRequest {
        pubid: PUB,
        chat_id: None,
        userid: 0,
        sys_id,
        text: "налог".to_string(),
    };

    assert_eq!(resolve_sys_id(&request(Some(Identifier::Int(5))), &mapping), "5");
    assert_eq!(resolve_sys_id(&request(Some(Identifier::Str(" ".into()))), &mapping), "12");
    assert_eq!(resolve_sys_id(&request(None), &mapping), "12");
    assert_eq!(
        resolve_sys_id(&request(None), &SysPubMapping::default()),
        "default"
    );
}
