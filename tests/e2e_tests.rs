//! End-to-end HTTP tests over a YAML-configured cascade.

mod common;

use std::path::Path;

use etalon::SysPubMapping;
use serde_json::json;

use common::{PUB, search, spawn_test_server};

#[tokio::test]
async fn test_health_endpoint_returns_ok() {
    let server = spawn_test_server(SysPubMapping::default())
        .await
        .expect("Server should start");

    let response = reqwest::get(format!("{}/healthz", server.url()))
        .await
        .expect("Health check should succeed");

    assert!(response.status().is_success());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_prefix_rule_answers_first() {
    let server = spawn_test_server(SysPubMapping::default()).await.unwrap();

    let (status, header, body) =
        search(&server, json!({ "pubid": PUB, "text": "КОСГУ 226 код" })).await;

    assert_eq!(status, 200);
    assert_eq!(header, "MATCHED");
    assert_eq!(body["templateId"], 226);
    assert_eq!(body["algorithm"], "RulePattern");
    assert_eq!(body["score"], 1.0);
}

#[tokio::test]
async fn test_falls_through_to_jaccard() {
    let server = spawn_test_server(SysPubMapping::default()).await.unwrap();

    let (status, _, body) =
        search(&server, json!({ "pubid": PUB, "text": "Как оплатить налог?" })).await;

    assert_eq!(status, 200);
    assert_eq!(body["templateId"], 1);
    assert_eq!(body["templateText"], "Оплатить налог можно онлайн");
    assert_eq!(body["etalon_text"], "Как оплатить налог");
    assert_eq!(body["algorithm"], "Jaccard");
}

#[tokio::test]
async fn test_falls_through_to_tfidf() {
    let server = spawn_test_server(SysPubMapping::default()).await.unwrap();

    let (status, _, body) =
        search(&server, json!({ "pubid": PUB, "text": "справка выдача" })).await;

    assert_eq!(status, 200);
    assert_eq!(body["templateId"], 20);
    assert_eq!(body["templateText"], "Справку выдают в личном кабинете");
    assert_eq!(body["algorithm"], "TFIDF");
}

#[tokio::test]
async fn test_exhausted_cascade_lists_every_attempt() {
    let server = spawn_test_server(SysPubMapping::default()).await.unwrap();

    let (status, header, body) =
        search(&server, json!({ "pubid": PUB, "text": "погода завтра" })).await;

    assert_eq!(status, 404);
    assert_eq!(header, "NOT_FOUND");
    assert_eq!(body["sys_id"], "default");

    let attempted: Vec<&str> = body["attempts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["classifier"].as_str().unwrap())
        .collect();
    assert_eq!(attempted, vec!["kosgu", "jaccard", "tfidf"]);
}

#[tokio::test]
async fn test_sys_id_scenario_skips_default_chain() {
    let server = spawn_test_server(SysPubMapping::default()).await.unwrap();

    // Jaccard would match this text, but scenario 9 only runs the rule prefix and TF-IDF.
    let (status, _, body) = search(
        &server,
        json!({ "pubid": PUB, "sys_id": 9, "text": "оплатить налог" }),
    )
    .await;

    assert_eq!(status, 404);
    let attempted: Vec<&str> = body["attempts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["classifier"].as_str().unwrap())
        .collect();
    assert_eq!(attempted, vec!["kosgu", "tfidf"]);
}

#[tokio::test]
async fn test_mapping_routes_pub_to_scenario() {
    let mapping = SysPubMapping::parse(Path::new("mapping.json"), r#"{ "9": [7] }"#).unwrap();
    let server = spawn_test_server(mapping).await.unwrap();

    let (status, _, body) =
        search(&server, json!({ "pubid": PUB, "text": "пенсия расчет" })).await;

    assert_eq!(status, 200);
    assert_eq!(body["templateId"], 30);
    assert_eq!(body["algorithm"], "TFIDF");
}

#[tokio::test]
async fn test_backend_outage_is_bad_gateway() {
    let server = spawn_test_server(SysPubMapping::default()).await.unwrap();
    server.backend.set_unavailable(true);

    let (status, header, body) =
        search(&server, json!({ "pubid": PUB, "text": "оплатить налог" })).await;

    assert_eq!(status, 502);
    assert_eq!(header, "backend_error");
    assert_eq!(body["code"], 502);

    let ready = reqwest::get(format!("{}/ready", server.url())).await.unwrap();
    assert_eq!(ready.status().as_u16(), 503);
}
