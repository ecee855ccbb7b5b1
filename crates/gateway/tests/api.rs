//! HTTP surface tests driven through the router with `oneshot`.

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use ic_domain::config::Config;
use ic_gateway::api;
use ic_gateway::state::AppState;
use ic_providers::ProviderRegistry;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use tower::ServiceExt;

use common::*;

fn app(state: &AppState) -> Router {
    api::router(state.clone()).with_state(state.clone())
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(state: &AppState, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app(state).oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn cat_script() -> Vec<ic_domain::error::Result<ic_providers::ChatResponse>> {
    vec![
        Ok(tools("resp_1", &[("call_1", "generate_image", r#"{"prompt":"a cat"}"#)])),
        Ok(text("resp_2", "Here's your cat.")),
    ]
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// POST /api/chat
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test]
async fn chat_returns_text_and_image() {
    let llm = Arc::new(ScriptedLlm::new(cat_script()));
    let images = Arc::new(MockImages::default());
    let state = app_state(&llm, &images);

    let (status, body) = send(&state, post_json("/api/chat", json!({ "message": "draw a cat" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["assistantResponse"], "Here's your cat.");
    assert_eq!(body["imageBase64"], generated_image("a cat").as_base64());
    assert_eq!(body["conversationId"], "default");
}

#[tokio::test]
async fn chat_text_only_has_null_image() {
    let llm = Arc::new(ScriptedLlm::new(vec![Ok(text("resp_1", "Hello!"))]));
    let images = Arc::new(MockImages::default());
    let state = app_state(&llm, &images);

    let (status, body) = send(
        &state,
        post_json("/api/chat", json!({ "message": "hi", "conversationId": "room-1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["assistantResponse"], "Hello!");
    assert!(body["imageBase64"].is_null());
    assert_eq!(body["conversationId"], "room-1");
    assert!(state.conversations.get("room-1").is_some());
}

#[tokio::test]
async fn chat_rejects_missing_or_blank_message() {
    let llm = Arc::new(ScriptedLlm::new(Vec::new()));
    let images = Arc::new(MockImages::default());
    let state = app_state(&llm, &images);

    for body in [json!({}), json!({ "message": "   " }), json!({ "message": null })] {
        let (status, resp) = send(&state, post_json("/api/chat", body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(resp["error"], "Message is required");
    }
    assert_eq!(llm.request_count(), 0);
}

#[tokio::test]
async fn chat_rejects_non_json_body() {
    let llm = Arc::new(ScriptedLlm::new(Vec::new()));
    let images = Arc::new(MockImages::default());
    let state = app_state(&llm, &images);

    let req = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("not json"))
        .unwrap();
    let (status, body) = send(&state, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn chat_rejects_bad_conversation_id() {
    let llm = Arc::new(ScriptedLlm::new(Vec::new()));
    let images = Arc::new(MockImages::default());
    let state = app_state(&llm, &images);

    let (status, _) = send(
        &state,
        post_json("/api/chat", json!({ "message": "hi", "conversationId": "../etc/passwd" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn chat_without_provider_is_503() {
    let state = AppState::new(
        Arc::new(Config::default()),
        ProviderRegistry::from_parts(None, None),
    );

    let (status, body) = send(&state, post_json("/api/chat", json!({ "message": "hi" }))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "no_llm_provider");
}

#[tokio::test]
async fn chat_model_failure_is_500_and_resets() {
    let llm = Arc::new(ScriptedLlm::new(vec![
        Ok(text("resp_1", "Hello!")),
        Err(provider_error("HTTP 500: upstream exploded")),
    ]));
    let images = Arc::new(MockImages::default());
    let state = app_state(&llm, &images);

    send(&state, post_json("/api/chat", json!({ "message": "hi" }))).await;
    let (status, body) = send(&state, post_json("/api/chat", json!({ "message": "again" }))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to process chat message");
    assert!(body["details"].as_str().unwrap().contains("upstream exploded"));
    assert!(state.conversations.get("default").is_none());
}

#[tokio::test]
async fn chat_busy_conversation_is_429() {
    let llm = Arc::new(ScriptedLlm::new(Vec::new()));
    let images = Arc::new(MockImages::default());
    let state = app_state(&llm, &images);

    // One turn running, one request queued behind it.
    let running = state.session_locks.acquire("default").await.unwrap();
    let locks = state.session_locks.clone();
    let queued = tokio::spawn(async move { locks.acquire("default").await.map(drop) });
    tokio::time::sleep(Duration::from_millis(20)).await;

    let (status, _) = send(&state, post_json("/api/chat", json!({ "message": "hi" }))).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(llm.request_count(), 0);

    drop(running);
    assert!(queued.await.unwrap().is_ok());
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Conversations
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test]
async fn conversation_lifecycle() {
    let llm = Arc::new(ScriptedLlm::new(cat_script()));
    let images = Arc::new(MockImages::default());
    let state = app_state(&llm, &images);

    let (status, _) = send(&state, get("/api/conversations/default")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    send(&state, post_json("/api/chat", json!({ "message": "draw a cat" }))).await;

    let (status, summary) = send(&state, get("/api/conversations/default")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["conversationId"], "default");
    assert_eq!(summary["lastTurnId"], "resp_2");
    assert_eq!(summary["hasImage"], true);
    assert_eq!(summary["turns"], 1);

    let (_, list) = send(&state, get("/api/conversations")).await;
    assert_eq!(list["count"], 1);
    assert_eq!(list["conversations"][0]["conversationId"], "default");

    let (status, reset) = send(&state, post_json("/api/conversations/default/reset", json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reset["reset"], true);
    assert_eq!(reset["existed"], true);

    let (status, _) = send(&state, get("/api/conversations/default")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn reset_unknown_conversation_reports_not_existed() {
    let llm = Arc::new(ScriptedLlm::new(Vec::new()));
    let images = Arc::new(MockImages::default());
    let state = app_state(&llm, &images);

    let (status, body) = send(&state, post_json("/api/conversations/nobody/reset", json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["conversationId"], "nobody");
    assert_eq!(body["existed"], false);
}

#[tokio::test]
async fn conversation_routes_reject_bad_ids() {
    let llm = Arc::new(ScriptedLlm::new(Vec::new()));
    let images = Arc::new(MockImages::default());
    let state = app_state(&llm, &images);
    let long = "a".repeat(129);

    for id in ["bad%20id", "%20default", "a.b", long.as_str()] {
        let (status, body) = send(&state, get(&format!("/api/conversations/{id}"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "get {id}");
        assert!(body["error"].as_str().unwrap().contains("conversation id"));

        let (status, _) = send(
            &state,
            post_json(&format!("/api/conversations/{id}/reset"), json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "reset {id}");
    }
    // Rejected resets never touch the lock map.
    assert_eq!(state.session_locks.session_count(), 0);
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Health & auth
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test]
async fn health_reports_provider_readiness() {
    let state = AppState::new(
        Arc::new(Config::default()),
        ProviderRegistry::from_parts(None, None),
    );
    let (status, body) = send(&state, get("/api/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["providerReady"], false);
    assert_eq!(body["conversations"], 0);
    assert!(body["llmProvider"].is_null());
    assert!(body["model"].is_null());
    assert!(body["imageProvider"].is_null());
}

#[tokio::test]
async fn health_names_configured_providers() {
    let llm = Arc::new(ScriptedLlm::new(vec![Ok(text("resp_1", "Hello!"))]));
    let images = Arc::new(MockImages::default());
    let state = app_state(&llm, &images);
    send(&state, post_json("/api/chat", json!({ "message": "hi" }))).await;

    let (status, body) = send(&state, get("/api/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["providerReady"], true);
    assert_eq!(body["llmProvider"], "scripted");
    assert_eq!(body["model"], "scripted-model");
    assert_eq!(body["imageProvider"], "mock-images");
    assert_eq!(body["conversations"], 1);
}

#[tokio::test]
async fn token_guards_api_but_not_health() {
    let llm = Arc::new(ScriptedLlm::new(vec![Ok(text("resp_1", "Hello!"))]));
    let images = Arc::new(MockImages::default());
    let mut state = app_state(&llm, &images);
    state.api_token_hash = Some(Sha256::digest(b"s3cret").to_vec());

    let (status, _) = send(&state, get("/api/health")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&state, post_json("/api/chat", json!({ "message": "hi" }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&state, get("/api/conversations")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let mut req = post_json("/api/chat", json!({ "message": "hi" }));
    req.headers_mut()
        .insert(header::AUTHORIZATION, "Bearer s3cret".parse().unwrap());
    let (status, body) = send(&state, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["assistantResponse"], "Hello!");
}
