//! [`HttpKnowledgeClient`] against a fake store served by axum.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use fixhive::remote::HttpKnowledgeClient;
use fixhive_core::client::KnowledgeClient;
use fixhive_core::models::{Environment, SearchRequest, VoteRequest, VoteValue};
use serde_json::{json, Value};
use tokio::net::TcpListener;

#[derive(Clone, Default)]
struct FakeStore {
    seen: Arc<Mutex<Vec<(String, HeaderMap, Value)>>>,
}

async fn rpc(
    State(store): State<FakeStore>,
    Path(name): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, String) {
    store
        .seen
        .lock()
        .unwrap()
        .push((name.clone(), headers, body));

    match name.as_str() {
        "search_cases" => (
            StatusCode::OK,
            json!({
                "group": { "id": "g-1", "error_signature": "E: {x}", "total_reports": 2 },
                "variants": [{ "id": "v-1", "rank": 1, "success_rate": 0.5, "environment_match": 1.0, "score": 1 }]
            })
            .to_string(),
        ),
        "vote" => (StatusCode::OK, "not json".to_string()),
        _ => (
            StatusCode::UNAUTHORIZED,
            r#"{"message":"Invalid API key"}"#.to_string(),
        ),
    }
}

async fn start() -> (SocketAddr, FakeStore) {
    let store = FakeStore::default();
    let app = Router::new()
        .route("/rest/v1/rpc/{name}", post(rpc))
        .with_state(store.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (addr, store)
}

fn search_request() -> SearchRequest {
    SearchRequest {
        error_message: "E: boom".into(),
        error_signature: Some("E: {x}".into()),
        environment: Environment::new(Some("rust".into()), None, None),
        signature_hash: Some("abc".into()),
        limit: 5,
    }
}

#[tokio::test]
async fn search_sends_credentials_and_device_id() {
    let (addr, store) = start().await;
    let client = HttpKnowledgeClient::new(format!("http://{addr}/"), "secret-key", "dev-42").unwrap();

    let outcome = client.search(&search_request()).await.unwrap();
    assert_eq!(outcome.group.unwrap().id, "g-1");
    assert_eq!(outcome.variants[0].rank, 1);

    let seen = store.seen.lock().unwrap();
    let (name, headers, body) = &seen[0];
    assert_eq!(name, "search_cases");
    assert_eq!(headers["apikey"], "secret-key");
    assert_eq!(headers["authorization"], "Bearer secret-key");
    assert_eq!(body["device_id"], "dev-42");
    assert_eq!(body["limit"], 5);
    assert_eq!(body["environment"]["language"], "rust");
    assert_eq!(body["signature_hash"], "abc");
}

#[tokio::test]
async fn non_success_status_is_an_error() {
    let (addr, _) = start().await;
    let client = HttpKnowledgeClient::new(format!("http://{addr}"), "bad", "dev").unwrap();
    let request = fixhive_core::models::ReportRequest {
        error_message: "boom".into(),
        error_signature: "Error: {x}".into(),
        stack_trace: None,
        cause: None,
        solution: None,
        solution_steps: None,
        code_diff: None,
        environment: Environment::new(None, None, None),
        solved: true,
        used_variant_id: None,
        what_was_tried: None,
        time_spent: None,
    };
    let err = client.report(&request).await.unwrap_err();
    let message = err.to_string();
    assert!(message.contains("HTTP 401"), "{message}");
    assert!(message.contains("Invalid API key"), "{message}");
}

#[tokio::test]
async fn malformed_body_is_an_error() {
    let (addr, _) = start().await;
    let client = HttpKnowledgeClient::new(format!("http://{addr}"), "k", "dev").unwrap();
    let err = client
        .vote(&VoteRequest {
            variant_id: "v-1".into(),
            value: VoteValue::Up,
            reason: None,
        })
        .await
        .unwrap_err();
    assert!(err.to_string().contains("malformed response"));
}

#[tokio::test]
async fn unreachable_store_is_an_error() {
    // bind then drop to get a port nobody listens on
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = HttpKnowledgeClient::new(format!("http://{addr}"), "k", "dev").unwrap();
    let err = client.search(&search_request()).await.unwrap_err();
    assert!(err.to_string().contains("request to"));
}
