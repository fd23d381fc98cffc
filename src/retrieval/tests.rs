use super::client::documents_from_response;
use super::*;
use serde_json::json;

fn candidate(id: i64, lem: &str, pubs: &[i64]) -> Candidate {
    Candidate {
        id,
        raw_cluster_text: format!("raw {id}"),
        lemmatized_cluster_text: lem.to_string(),
        parent_pub_list: pubs.iter().copied().collect(),
        topic: String::new(),
        short_answer_text: String::new(),
    }
}

#[test]
fn test_boolean_query_dsl() {
    let query = BooleanQuery::new()
        .must_match_phrase(fields::PARENT_PUB_LIST, 7)
        .must_match(fields::LEM_CLUSTER, "оплата налог");

    assert_eq!(
        query.to_json(),
        json!({
            "bool": {
                "must": [
                    { "match_phrase": { "ParentPubList": 7 } },
                    { "match": { "LemCluster": "оплата налог" } }
                ]
            }
        })
    );
    assert_eq!(query.predicates().len(), 2);
}

#[test]
fn test_answer_query_fields() {
    let query = answer_query(42, 7);
    let fields: Vec<&str> = query.predicates().iter().map(Predicate::field).collect();

    assert_eq!(fields, vec!["templateId", "pubId"]);
}

#[test]
fn test_candidate_from_index_document() {
    let doc = json!({
        "ID": 12,
        "Cluster": "Как оплатить налог?",
        "LemCluster": "оплата налог",
        "ParentPubList": [1, 7],
        "Topic": "Налоги",
        "ShortAnswerText": "Через личный кабинет"
    });

    let candidate: Candidate = serde_json::from_value(doc).unwrap();

    assert_eq!(candidate.id, 12);
    assert!(candidate.serves(7));
    assert!(!candidate.serves(3));
    assert_eq!(candidate.short_answer_text, "Через личный кабинет");
}

#[test]
fn test_candidate_optional_fields_default() {
    let candidate: Candidate = serde_json::from_value(json!({ "ID": 1 })).unwrap();

    assert!(candidate.parent_pub_list.is_empty());
    assert!(candidate.lemmatized_cluster_text.is_empty());
}

#[test]
fn test_documents_from_response() {
    let body = json!({
        "took": 3,
        "hits": {
            "total": { "value": 1 },
            "hits": [
                { "_index": "answers", "_source": { "templateId": 5, "templateText": "Ответ", "pubId": 7 } }
            ]
        }
    });

    let answers: Vec<AnswerTemplate> =
        documents_from_response("answers", &answer_query(5, 7), body).unwrap();

    assert_eq!(answers.len(), 1);
    assert_eq!(answers[0].template_text, "Ответ");
}

#[test]
fn test_documents_from_empty_response() {
    let body = json!({ "hits": { "hits": [] } });

    let err = documents_from_response::<Candidate>("clusters", &BooleanQuery::new(), body)
        .unwrap_err();

    assert!(err.is_empty_result());
}

#[test]
fn test_documents_from_malformed_response() {
    let err =
        documents_from_response::<Candidate>("clusters", &BooleanQuery::new(), json!({"x": 1}))
            .unwrap_err();

    assert!(matches!(err, RetrievalError::InvalidResponse { .. }));
}

#[test]
fn test_elastic_config_defaults() {
    let config = ElasticConfig::default();

    assert_eq!(config.url, "http://localhost:9200");
    assert_eq!(config.max_hits, crate::constants::DEFAULT_MAX_HITS);
    assert!(config.user.is_none());

    let config = ElasticConfig::new("http://es:9200").with_credentials("u", "p");
    assert_eq!(config.user.as_deref(), Some("u"));
}

#[tokio::test]
async fn test_mock_match_ranks_by_shared_tokens() {
    let backend = MockRetrievalBackend::new();
    backend.insert_candidate("clusters", candidate(1, "оплата", &[7]));
    backend.insert_candidate("clusters", candidate(2, "оплата налог", &[7]));
    backend.insert_candidate("clusters", candidate(3, "справка", &[7]));

    let query = BooleanQuery::new().must_match(fields::LEM_CLUSTER, "оплата налог");
    let hits = backend.search("clusters", &query, 10).await.unwrap();

    let ids: Vec<i64> = hits.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![2, 1]);
}

#[tokio::test]
async fn test_mock_array_membership_and_truncation() {
    let backend = MockRetrievalBackend::new();
    backend.insert_candidate("clusters", candidate(1, "налог", &[1]));
    backend.insert_candidate("clusters", candidate(2, "налог", &[7]));
    backend.insert_candidate("clusters", candidate(3, "налог", &[7, 8]));

    let query = BooleanQuery::new()
        .must_match(fields::LEM_CLUSTER, "налог")
        .must_match(fields::PARENT_PUB_LIST, 7);
    let hits = backend.search("clusters", &query, 1).await.unwrap();

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, 2);
    assert_eq!(backend.search_count(), 1);
}

#[tokio::test]
async fn test_mock_empty_and_missing_index() {
    let backend = MockRetrievalBackend::new();
    backend.create_index("clusters");

    let query = BooleanQuery::new().must_match(fields::LEM_CLUSTER, "налог");

    let err = backend.search("clusters", &query, 10).await.unwrap_err();
    assert!(err.is_empty_result());

    let err = backend.search("missing", &query, 10).await.unwrap_err();
    assert!(matches!(err, RetrievalError::IndexNotFound { .. }));
}

#[tokio::test]
async fn test_mock_lookup_answer() {
    let backend = MockRetrievalBackend::new();
    backend.insert_answer(
        "answers",
        AnswerTemplate {
            template_id: 5,
            template_text: "Для pub 1".to_string(),
            pub_id: 1,
        },
    );
    backend.insert_answer(
        "answers",
        AnswerTemplate {
            template_id: 5,
            template_text: "Для pub 7".to_string(),
            pub_id: 7,
        },
    );

    let answer = backend.lookup_answer("answers", 5, 7).await.unwrap();
    assert_eq!(answer.template_text, "Для pub 7");

    let err = backend.lookup_answer("answers", 6, 7).await.unwrap_err();
    assert!(err.is_empty_result());
}

#[tokio::test]
async fn test_mock_unavailable() {
    let backend = MockRetrievalBackend::new();
    backend.create_index("clusters");
    backend.set_unavailable(true);

    let err = backend
        .search("clusters", &BooleanQuery::new(), 10)
        .await
        .unwrap_err();
    assert!(matches!(err, RetrievalError::ConnectionFailed { .. }));
    assert!(backend.health_check().await.is_err());

    backend.set_unavailable(false);
    assert!(backend.health_check().await.is_ok());
}
