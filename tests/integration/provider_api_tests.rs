/*!
 * Integration tests for the completion client against a local fake server
 */

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::net::TcpListener;

use doc_translator::app_config::TranslationConfig;
use doc_translator::errors::{ProviderError, TranslationError};
use doc_translator::translation::{TranslationService, Translator};

type SeenRequests = Arc<Mutex<Vec<(Option<String>, Value)>>>;

/// What the fake server answers and what it saw; the last reply repeats
#[derive(Clone)]
struct FakeServer {
    replies: Arc<Mutex<VecDeque<(StatusCode, Value)>>>,
    seen: SeenRequests,
}

async fn completions(
    State(server): State<FakeServer>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    server.seen.lock().unwrap().push((auth, body));
    let mut replies = server.replies.lock().unwrap();
    let (status, reply) = if replies.len() > 1 {
        replies.pop_front().unwrap()
    } else {
        replies[0].clone()
    };
    (status, Json(reply))
}

/// Start a fake completion server and return its base URL with the shared request log
async fn start_server(status: StatusCode, reply: Value) -> (String, SeenRequests) {
    start_scripted_server(vec![(status, reply)]).await
}

/// Like `start_server`, answering with each reply in turn
async fn start_scripted_server(replies: Vec<(StatusCode, Value)>) -> (String, SeenRequests) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let state = FakeServer {
        replies: Arc::new(Mutex::new(replies.into())),
        seen: seen.clone(),
    };
    let app = Router::new()
        .route("/v1/chat/completions", post(completions))
        .with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}/v1", addr), seen)
}

fn completion(content: &str) -> Value {
    json!({
        "choices": [{ "message": { "role": "assistant", "content": content } }],
        "usage": { "prompt_tokens": 12, "completion_tokens": 4, "total_tokens": 16 }
    })
}

fn service(endpoint: &str) -> TranslationService {
    retrying_service(endpoint, 0)
}

fn retrying_service(endpoint: &str, retry_count: u32) -> TranslationService {
    let config = TranslationConfig {
        endpoint: endpoint.to_string(),
        api_key: "test-key".to_string(),
        retry_count,
        retry_backoff_ms: 1,
        ..TranslationConfig::default()
    };
    TranslationService::new(&config)
}

/// Test a successful completion is trimmed and the request carries the configured settings
#[tokio::test]
async fn test_translate_withSuccessfulCompletion_shouldReturnTrimmedText() {
    let (endpoint, seen) = start_server(StatusCode::OK, completion("  Bonjour le monde \n")).await;

    let translated = service(&endpoint).translate("Hello world", "fr").await.unwrap();

    assert_eq!(translated, "Bonjour le monde");
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    let (auth, body) = &seen[0];
    assert_eq!(auth.as_deref(), Some("Bearer test-key"));
    let defaults = TranslationConfig::default();
    assert_eq!(body["model"], defaults.model);
    assert_eq!(body["max_tokens"], defaults.max_tokens);
    assert!((body["temperature"].as_f64().unwrap() - defaults.temperature as f64).abs() < 1e-6);
    assert_eq!(body["messages"][0]["role"], "system");
    let user = body["messages"][1]["content"].as_str().unwrap();
    assert!(user.contains("French"));
    assert!(user.ends_with("Hello world"));
}

/// Test a rejected key surfaces as an authentication error
#[tokio::test]
async fn test_translate_withUnauthorized_shouldReturnAuthenticationError() {
    let (endpoint, _) = start_server(StatusCode::UNAUTHORIZED, json!({"error": "bad key"})).await;

    let result = service(&endpoint).translate("Hello", "de").await;

    assert!(matches!(
        result,
        Err(TranslationError::Provider(ProviderError::AuthenticationError(_)))
    ));
}

/// Test rate limiting is reported and not retried by default
#[tokio::test]
async fn test_translate_withRateLimit_shouldFailWithoutRetry() {
    let (endpoint, seen) = start_server(StatusCode::TOO_MANY_REQUESTS, json!({"error": "slow down"})).await;

    let result = service(&endpoint).translate("Hello", "es").await;

    assert!(matches!(
        result,
        Err(TranslationError::Provider(ProviderError::RateLimitExceeded(_)))
    ));
    assert_eq!(seen.lock().unwrap().len(), 1);
}

/// Test server errors carry their status code
#[tokio::test]
async fn test_translate_withServerError_shouldReturnApiError() {
    let (endpoint, _) = start_server(StatusCode::INTERNAL_SERVER_ERROR, json!({"error": "boom"})).await;

    let result = service(&endpoint).translate("Hello", "it").await;

    match result {
        Err(TranslationError::Provider(ProviderError::ApiError { status_code, .. })) => {
            assert_eq!(status_code, 500)
        }
        other => panic!("expected an API error, got {:?}", other),
    }
}

/// Test a blank completion counts as a failure
#[tokio::test]
async fn test_translate_withBlankCompletion_shouldReturnEmptyResponse() {
    let (endpoint, _) = start_server(StatusCode::OK, completion("   ")).await;

    let result = service(&endpoint).translate("Hello", "fr").await;

    assert!(matches!(result, Err(TranslationError::EmptyResponse)));
}

/// Test a response without choices is a parse error
#[tokio::test]
async fn test_translate_withNoChoices_shouldReturnParseError() {
    let (endpoint, _) = start_server(StatusCode::OK, json!({"choices": []})).await;

    let result = service(&endpoint).translate("Hello", "fr").await;

    assert!(matches!(
        result,
        Err(TranslationError::Provider(ProviderError::ParseError(_)))
    ));
}

/// Test an unreachable endpoint is a connection error
#[tokio::test]
async fn test_translate_withClosedPort_shouldReturnConnectionError() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let result = service(&format!("http://{}/v1", addr)).translate("Hello", "fr").await;

    assert!(matches!(
        result,
        Err(TranslationError::Provider(ProviderError::ConnectionError(_)))
    ));
}

/// Test a transient server error is retried and the second answer used
#[tokio::test]
async fn test_translate_withRetryAfterServiceUnavailable_shouldSucceed() {
    let (endpoint, seen) = start_scripted_server(vec![
        (StatusCode::SERVICE_UNAVAILABLE, json!({"error": "warming up"})),
        (StatusCode::OK, completion("Hallo")),
    ])
    .await;

    let translated = retrying_service(&endpoint, 2).translate("Hello", "de").await.unwrap();

    assert_eq!(translated, "Hallo");
    assert_eq!(seen.lock().unwrap().len(), 2);
}

/// Test retries stop once the configured count is used up
#[tokio::test]
async fn test_translate_withPersistentServerError_shouldGiveUpAfterRetries() {
    let (endpoint, seen) = start_server(StatusCode::BAD_GATEWAY, json!({"error": "down"})).await;

    let result = retrying_service(&endpoint, 2).translate("Hello", "de").await;

    assert!(matches!(
        result,
        Err(TranslationError::Provider(ProviderError::ApiError { status_code: 502, .. }))
    ));
    assert_eq!(seen.lock().unwrap().len(), 3);
}

/// Test a client error is not retried
#[tokio::test]
async fn test_translate_withBadRequest_shouldNotRetry() {
    let (endpoint, seen) = start_scripted_server(vec![
        (StatusCode::BAD_REQUEST, json!({"error": "bad input"})),
        (StatusCode::OK, completion("never sent")),
    ])
    .await;

    let result = retrying_service(&endpoint, 2).translate("Hello", "de").await;

    assert!(matches!(
        result,
        Err(TranslationError::Provider(ProviderError::ApiError { status_code: 400, .. }))
    ));
    assert_eq!(seen.lock().unwrap().len(), 1);
}
