//! End-to-end integration tests for agentdesk.
//!
//! These exercise the full pipeline from an HTTP request through the gateway,
//! request router, context assembly, and image normalization down to a
//! scripted provider.

use std::sync::{Arc, Mutex};

use agentdesk_agent::{AgentRegistry, RequestRouter};
use agentdesk_config::AppConfig;
use agentdesk_core::error::ProviderError;
use agentdesk_core::message::{ContentPart, Message, Role};
use agentdesk_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use agentdesk_gateway::{GatewayState, build_router};
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

// ── Mock Provider ────────────────────────────────────────────────────────

/// A mock provider that plays back scripted outcomes and records requests.
struct ScriptedProvider {
    script: Mutex<Vec<Result<String, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    fn new(script: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            script: Mutex::new(script),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn text(response: &str) -> Self {
        Self::new(vec![Ok(response.into())])
    }

    fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn request(&self, index: usize) -> ProviderRequest {
        self.requests.lock().unwrap()[index].clone()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "e2e_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut script = self.script.lock().unwrap();
        if script.is_empty() {
            panic!(
                "ScriptedProvider exhausted: call #{}",
                self.requests.lock().unwrap().len() + 1
            );
        }
        let model = request.model.clone();
        self.requests.lock().unwrap().push(request);
        script.remove(0).map(|text| ProviderResponse {
            message: Message::assistant(text),
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
            model,
        })
    }
}

fn upstream_error() -> ProviderError {
    ProviderError::ApiError {
        status_code: 502,
        message: "bad gateway".into(),
    }
}

fn app(provider: Arc<ScriptedProvider>) -> Router {
    let config = AppConfig {
        api_key: Some("gsk_e2e_test_key".into()),
        ..AppConfig::default()
    };
    let registry = Arc::new(AgentRegistry::from_config(&config));
    let router = RequestRouter::from_config(provider, registry, &config);
    let state = Arc::new(GatewayState::new(Arc::new(router), &config));
    build_router(state, &config.gateway)
}

async fn ask(app: Router, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
    let req = Request::builder()
        .method("POST")
        .uri("/agent/ask")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn last_user_message(request: &ProviderRequest) -> &Message {
    request
        .messages
        .iter()
        .rev()
        .find(|m| m.role == Role::User)
        .unwrap()
}

// ── Scenarios ────────────────────────────────────────────────────────────

#[tokio::test]
async fn web_agent_without_history_sends_query_unchanged() {
    let provider = Arc::new(ScriptedProvider::text("Paris is the capital of France."));
    let (status, json) = ask(
        app(provider.clone()),
        serde_json::json!({
            "agent": "web",
            "query": "What is the capital of France?",
            "messages": []
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["agent_used"], "web");
    assert_eq!(json["response"], "Paris is the capital of France.");
    assert_eq!(provider.calls(), 1);

    let request = provider.request(0);
    assert_eq!(request.messages.len(), 2);
    assert_eq!(request.messages[0].role, Role::System);
    assert!(request.messages[0].content.contains("Always cite sources"));
    assert_eq!(request.messages[1].content, "What is the capital of France?");
}

#[tokio::test]
async fn unknown_agent_falls_back_to_general() {
    let provider = Arc::new(ScriptedProvider::text("Hello!"));
    let (status, json) = ask(
        app(provider.clone()),
        serde_json::json!({"agent": "unknown_type", "query": "Hi"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["agent_used"], "general");
    assert_eq!(json["model_used"], "llama3-8b-8192");
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn empty_query_is_rejected_before_generation() {
    let provider = Arc::new(ScriptedProvider::new(vec![]));
    let (status, json) = ask(
        app(provider.clone()),
        serde_json::json!({"agent": "web", "query": ""}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["detail"].as_str().unwrap().contains("query"));
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn vision_request_strips_data_url_prefix() {
    let payload = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";
    let provider = Arc::new(ScriptedProvider::text("A single white pixel."));
    let (status, json) = ask(
        app(provider.clone()),
        serde_json::json!({
            "agent": "youtube",
            "query": "What is in this image?",
            "useVisionModel": true,
            "files": [{
                "type": "image",
                "name": "pixel.png",
                "data": format!("data:image/png;base64,{payload}")
            }]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["response"], "A single white pixel.");
    assert_eq!(json["model_used"], "meta-llama/llama-4-scout-17b-16e-instruct");

    let request = provider.request(0);
    let parts = &last_user_message(&request).parts;
    assert_eq!(
        parts[0],
        ContentPart::Text {
            text: "What is in this image?".into()
        }
    );
    assert_eq!(
        parts[1],
        ContentPart::ImageUrl {
            url: format!("data:image/png;base64,{payload}")
        }
    );
}

#[tokio::test]
async fn failed_generation_retries_once_without_history() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        Err(upstream_error()),
        Err(upstream_error()),
    ]));
    let (status, json) = ask(
        app(provider.clone()),
        serde_json::json!({
            "agent": "finance",
            "query": "How did AAPL close?",
            "messages": [
                {"role": "user", "content": "Tell me about Apple."},
                {"role": "assistant", "content": "Apple makes iPhones."},
                {"role": "user", "content": "And its stock?"}
            ]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json["detail"].as_str().unwrap().contains("bad gateway"));
    assert_eq!(provider.calls(), 2);

    let first = provider.request(0);
    assert!(last_user_message(&first).content.contains("Previous conversation:"));

    let retry = provider.request(1);
    assert_eq!(retry.messages.len(), 2);
    assert_eq!(last_user_message(&retry).content, "How did AAPL close?");
}

#[tokio::test]
async fn retry_recovers_with_bare_query() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        Err(upstream_error()),
        Ok("AAPL closed higher.".into()),
    ]));
    let (status, json) = ask(
        app(provider.clone()),
        serde_json::json!({
            "agent": "finance",
            "query": "How did AAPL close?",
            "messages": [
                {"role": "user", "content": "Tell me about Apple."},
                {"role": "assistant", "content": "Apple makes iPhones."}
            ]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["response"], "AAPL closed higher.");
    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn unreadable_images_degrade_to_text() {
    let provider = Arc::new(ScriptedProvider::text("I can only answer from text."));
    let (status, json) = ask(
        app(provider.clone()),
        serde_json::json!({
            "agent": "linkedin",
            "query": "Write a post about this chart",
            "useVisionModel": true,
            "files": [{"type": "image", "name": "chart.png", "data": "not-base64!"}]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["response"].as_str().unwrap().starts_with("⚠️"));
    assert_eq!(provider.calls(), 1);
    assert!(provider.request(0).messages[1].parts.is_empty());
}

#[tokio::test]
async fn catalog_and_health_round_out_the_api() {
    let provider = Arc::new(ScriptedProvider::new(vec![]));

    let req = Request::builder()
        .uri("/agents")
        .body(Body::empty())
        .unwrap();
    let response = app(provider.clone()).oneshot(req).await.unwrap();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    let ids: Vec<&str> = json["agents"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["id"].as_str().unwrap())
        .collect();
    assert_eq!(
        ids,
        vec!["general", "web", "finance", "youtube", "articles", "linkedin"]
    );

    let req = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = app(provider).oneshot(req).await.unwrap();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["has_groq_key"], true);
    assert_eq!(json["groq_key_prefix"], "gsk_e2e_...");
}
