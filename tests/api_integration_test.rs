use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use sentiment_aura::config::env::EnvConfig;
use sentiment_aura::app::with_middleware;
use sentiment_aura::config::toml_config::FileConfig;
use sentiment_aura::{
    build_router, AppConfig, CompletionClient, CompletionError, CompletionRequest,
    SentimentPipeline,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

const CANONICAL_REPLY: &str = r#"{"sentiment":"positive","score":0.9,"keywords":["love"],"attributes":{"intensity":0.8,"energy":0.7,"valence":0.9,"complexity":0.2}}"#;

#[derive(Clone)]
struct StubCompletion {
    reply: Option<String>,
    calls: Arc<AtomicUsize>,
}

impl StubCompletion {
    fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn unreachable() -> Self {
        Self {
            reply: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionClient for StubCompletion {
    async fn complete(&self, _request: &CompletionRequest) -> Result<String, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            Some(reply) => Ok(reply.clone()),
            None => Err(CompletionError::Status {
                status: 502,
                body: "bad gateway from 10.1.2.3".to_string(),
            }),
        }
    }
}

fn test_config() -> AppConfig {
    let env = EnvConfig {
        openai_api_key: Some("sk-test".to_string()),
        cors_allowed_origins: Some(vec![
            "http://localhost:5173".to_string(),
            "https://*.vercel.app".to_string(),
        ]),
        ..Default::default()
    };
    AppConfig::from_sources(FileConfig::default(), env, &Default::default()).unwrap()
}

fn create_test_app(stub: &StubCompletion) -> axum::Router {
    let config = test_config();
    let pipeline = SentimentPipeline::new(stub.clone(), &config);
    build_router(pipeline, &config).unwrap()
}

async fn send(app: &axum::Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(b) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_string(&b).unwrap()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn process(app: &axum::Router, text: &str) -> (StatusCode, Value) {
    send(app, Method::POST, "/process_text", Some(json!({ "text": text }))).await
}

#[tokio::test]
async fn test_root_describes_service() {
    let stub = StubCompletion::replying("{}");
    let app = create_test_app(&stub);

    let (status, body) = send(&app, Method::GET, "/", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "online");
    assert_eq!(body["service"], "Sentiment Aura API");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_health_is_idempotent_and_never_calls_upstream() {
    let stub = StubCompletion::unreachable();
    let app = create_test_app(&stub);

    let (status, first) = send(&app, Method::GET, "/health", None).await;
    let (_, second) = send(&app, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["status"], "healthy");
    assert_eq!(first["openai_configured"], true);
    assert_eq!(first["speech_configured"], false);
    assert_eq!(first, second);
    assert_eq!(stub.calls(), 0);
}

#[tokio::test]
async fn test_canonical_reply_round_trips_unchanged() {
    let stub = StubCompletion::replying(CANONICAL_REPLY);
    let app = create_test_app(&stub);

    let (status, body) = process(&app, "I love this!").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::from_str::<Value>(CANONICAL_REPLY).unwrap());
    assert_eq!(stub.calls(), 1);
}

#[tokio::test]
async fn test_empty_text_is_rejected_before_upstream() {
    let stub = StubCompletion::replying(CANONICAL_REPLY);
    let app = create_test_app(&stub);

    let (status, body) = process(&app, "").await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "Validation error");
    assert_eq!(body["detail"], "text must not be empty");
    assert_eq!(stub.calls(), 0);
}

#[tokio::test]
async fn test_malformed_body_is_validation_error() {
    let stub = StubCompletion::replying(CANONICAL_REPLY);
    let app = create_test_app(&stub);

    let (status, body) = send(&app, Method::POST, "/process_text", Some(json!({ "txt": "hi" }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "Validation error");

    let (status, _) = send(&app, Method::POST, "/process_text", Some(json!({ "text": 42 }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/process_text")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    assert_eq!(stub.calls(), 0);
}

#[tokio::test]
async fn test_invalid_json_reply_is_server_error_without_echo() {
    let stub = StubCompletion::replying("I think this text is quite positive overall.");
    let app = create_test_app(&stub);

    let secret_input = "my very private diary entry";
    let (status, body) = process(&app, secret_input).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Internal server error");
    assert_eq!(body["detail"], "Upstream response was not valid JSON");
    let rendered = body.to_string();
    assert!(!rendered.contains(secret_input));
    assert!(!rendered.contains("quite positive"));
}

#[tokio::test]
async fn test_missing_attributes_yield_empty_mapping() {
    let stub = StubCompletion::replying(r#"{"sentiment":"neutral","score":0.0,"keywords":["ok"]}"#);
    let app = create_test_app(&stub);

    let (status, body) = process(&app, "It is fine.").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["attributes"], json!({}));
    assert_eq!(body["keywords"], json!(["ok"]));
}

#[tokio::test]
async fn test_non_numeric_score_is_upstream_format_error() {
    let stub = StubCompletion::replying(r#"{"sentiment":"positive","score":"not-a-number"}"#);
    let app = create_test_app(&stub);

    let (status, body) = process(&app, "Great!").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Internal server error");
    assert_eq!(
        body["detail"],
        "Upstream response contained an invalid score field"
    );
    assert!(!body.to_string().contains("not-a-number"));
}

#[tokio::test]
async fn test_upstream_failure_is_generic_internal_error() {
    let stub = StubCompletion::unreachable();
    let app = create_test_app(&stub);

    let (status, body) = process(&app, "hello").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Internal server error", "detail": "Internal server error" }));
    assert_eq!(stub.calls(), 1);
}

#[tokio::test]
async fn test_unknown_route_returns_json_404() {
    let stub = StubCompletion::replying("{}");
    let app = create_test_app(&stub);

    let (status, body) = send(&app, Method::GET, "/does/not/exist", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Endpoint not found");
    assert_eq!(body["path"], "/does/not/exist");
}

#[tokio::test]
async fn test_wrong_method_returns_json_405() {
    let stub = StubCompletion::replying(CANONICAL_REPLY);
    let app = create_test_app(&stub);

    let (status, body) = send(&app, Method::GET, "/process_text", None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["error"], "Method not allowed");
    assert_eq!(body["detail"], "GET is not supported on /process_text");

    let (status, body) = send(&app, Method::DELETE, "/health", None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["error"], "Method not allowed");

    assert_eq!(stub.calls(), 0);
}

async fn explode() -> &'static str {
    panic!("handler exploded with secret state")
}

#[tokio::test]
async fn test_handler_panic_becomes_json_500() {
    let router = axum::Router::new().route("/explode", axum::routing::get(explode));
    let app = with_middleware(router, &test_config()).unwrap();

    let (status, body) = send(&app, Method::GET, "/explode", None).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Internal server error", "detail": "Internal server error" }));
}

#[tokio::test]
async fn test_cors_preflight_for_allowed_and_unknown_origins() {
    let stub = StubCompletion::replying("{}");
    let app = create_test_app(&stub);

    let preflight = |origin: &str| {
        Request::builder()
            .method(Method::OPTIONS)
            .uri("/process_text")
            .header(header::ORIGIN, origin)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
            .body(Body::empty())
            .unwrap()
    };

    let response = app
        .clone()
        .oneshot(preflight("https://sentiment-aura-pr-12.vercel.app"))
        .await
        .unwrap();
    let headers = response.headers();
    assert_eq!(
        headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "https://sentiment-aura-pr-12.vercel.app"
    );
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");

    let response = app
        .clone()
        .oneshot(preflight("https://attacker.example"))
        .await
        .unwrap();
    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}

#[tokio::test]
async fn test_concurrent_requests_are_independent() {
    let stub = StubCompletion::replying(CANONICAL_REPLY);
    let app = create_test_app(&stub);

    let mut tasks = tokio::task::JoinSet::new();
    for i in 0..8 {
        let app = app.clone();
        tasks.spawn(async move { process(&app, &format!("message {}", i)).await });
    }

    while let Some(joined) = tasks.join_next().await {
        let (status, body) = joined.unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["sentiment"], "positive");
    }
    assert_eq!(stub.calls(), 8);
}
