//! Integration tests for the prompt admin API

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use versa_prompts::{seeds::default_seeds, PromptManager};
use versa_server::server::build_router;
use versa_storage::{DatabaseConfig, StorageManager};

/// Test helper to create a router over a fresh in-memory store
async fn create_test_app(seed: bool) -> Router {
    let storage = StorageManager::new(&DatabaseConfig::in_memory())
        .await
        .expect("Failed to create in-memory storage");
    let manager = Arc::new(PromptManager::new(Arc::new(storage)));
    if seed {
        manager
            .initialize(&default_seeds(), false)
            .await
            .expect("Failed to seed prompts");
    }
    build_router(manager)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, bytes.to_vec())
}

async fn send_json(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let (status, bytes) = send(app, method, uri, body).await;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app(false).await;

    let (status, body) = send_json(&app, "GET", "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_create_activate_and_read_versions() {
    let app = create_test_app(false).await;
    let base = "/api/prompts/knowledge/rag_prompt";

    let (status, v1) = send_json(
        &app,
        "POST",
        &format!("{}/versions", base),
        Some(json!({"content": "Answer from {context}", "activate": true})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(v1["version"], 1);
    assert_eq!(v1["is_active"], true);
    assert_eq!(v1["variables"], json!([]));
    assert_eq!(v1["created_by"], "admin");

    let (status, v2) = send_json(
        &app,
        "POST",
        &format!("{}/versions", base),
        Some(json!({
            "content": "Answer strictly from {context}",
            "description": "stricter",
            "created_by": "alice",
            "variables": ["context", " context "]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(v2["version"], 2);
    assert_eq!(v2["variables"], json!(["context"]));
    assert_eq!(v2["is_active"], false);

    let (_, active) = send_json(&app, "GET", base, None).await;
    assert_eq!(active["version"], 1);

    let (status, activated) =
        send_json(&app, "POST", &format!("{}/versions/2/activate", base), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(activated["version"], 2);
    assert_eq!(activated["is_active"], true);

    let (_, history) = send_json(&app, "GET", &format!("{}/history", base), None).await;
    assert_eq!(history["total"], 2);
    assert_eq!(history["versions"][0]["version"], 2);
    assert_eq!(history["versions"][1]["is_active"], false);

    let (_, limited) = send_json(&app, "GET", &format!("{}/history?limit=1", base), None).await;
    assert_eq!(limited["total"], 1);

    let (status, v1) = send_json(&app, "GET", &format!("{}/versions/1", base), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v1["content"], "Answer from {context}");
}

#[tokio::test]
async fn test_error_statuses() {
    let app = create_test_app(false).await;

    let (status, body) = send_json(
        &app,
        "POST",
        "/api/prompts/knowledge/rag_prompt/versions",
        Some(json!({"content": "short"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("at least 10"));

    let (status, _) = send_json(
        &app,
        "POST",
        "/api/prompts/billing/invoice_prompt/versions",
        Some(json!({"content": "summarize the invoice"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send_json(
        &app,
        "POST",
        "/api/prompts/knowledge/rag_prompt/versions",
        Some(json!({"content": "Answer from {context}", "variables": ["{context}"]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send_json(&app, "GET", "/api/prompts/knowledge/rag_prompt", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());

    let (status, _) = send_json(
        &app,
        "POST",
        "/api/prompts/knowledge/rag_prompt/versions/3/activate",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send_json(&app, "POST", "/api/prompts/knowledge/rag_prompt/usage", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_usage_is_recorded_on_active_version() {
    let app = create_test_app(true).await;

    for _ in 0..3 {
        let (status, _) = send(&app, "POST", "/api/prompts/router/routing_prompt/usage", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    let (_, active) = send_json(&app, "GET", "/api/prompts/router/routing_prompt", None).await;
    assert_eq!(active["usage_count"], 3);

    let (_, stats) = send_json(&app, "GET", "/api/stats", None).await;
    assert_eq!(stats["total_usage"], 3);
    assert_eq!(stats["active_prompts"], 6);
}

#[tokio::test]
async fn test_listing_endpoints() {
    let app = create_test_app(true).await;

    let (_, agents) = send_json(&app, "GET", "/api/agents", None).await;
    assert_eq!(
        agents["agent_types"],
        json!(["conversational", "knowledge", "memory", "router", "web"])
    );
    assert!(agents["allowed"]
        .as_array()
        .unwrap()
        .contains(&json!("memory")));

    let (_, names) = send_json(&app, "GET", "/api/agents/knowledge/prompts", None).await;
    assert_eq!(names["prompt_names"], json!(["rag_prompt", "system_prompt"]));

    let (_, all) = send_json(&app, "GET", "/api/prompts", None).await;
    assert_eq!(all["total"], 6);

    let (_, knowledge) = send_json(&app, "GET", "/api/prompts?agent_type=knowledge", None).await;
    assert_eq!(knowledge["total"], 2);
}

#[tokio::test]
async fn test_export_is_plain_text() {
    let app = create_test_app(true).await;

    let (status, bytes) = send(&app, "GET", "/api/export", None).await;
    assert_eq!(status, StatusCode::OK);

    let text = String::from_utf8(bytes).unwrap();
    assert!(text.contains("PROMPT EXPORT"));
    assert!(text.contains("Total prompts: 6"));
    assert!(text.contains("Variables: context, question"));
    assert!(text.contains("# AGENT: KNOWLEDGE"));
}
