//! HTTP behaviour of the Gemini backend against a mock server.

use std::time::Duration;

use civic_core::{Error, GenerationBackend, Priority};
use civic_inference::{AnalysisSource, GeminiBackend, GeminiConfig, ReportAnalyzer};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GENERATE_PATH: &str = "/models/gemini-pro-latest:generateContent";

fn config(server: &MockServer, keys: &[&str]) -> GeminiConfig {
    GeminiConfig {
        base_url: server.uri(),
        backoff_base: Duration::from_millis(1),
        ..Default::default()
    }
    .with_keys(keys.iter().copied())
}

fn reply(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "candidates": [{"content": {"parts": [{"text": text}], "role": "model"}}]
    }))
}

fn rate_limited() -> ResponseTemplate {
    ResponseTemplate::new(429).set_body_json(serde_json::json!({
        "error": {"code": 429, "message": "Resource has been exhausted", "status": "RESOURCE_EXHAUSTED"}
    }))
}

#[tokio::test]
async fn test_request_shape_and_key_parameter() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(query_param("key", "k1"))
        .and(body_json(serde_json::json!({
            "contents": [{"parts": [{"text": "hello"}]}]
        })))
        .respond_with(reply("hi there"))
        .expect(1)
        .mount(&server)
        .await;

    let backend = GeminiBackend::new(config(&server, &["k1"])).unwrap();
    assert_eq!(backend.generate("hello").await.unwrap(), "hi there");
    assert_eq!(backend.model_name(), "gemini-pro-latest");
}

#[tokio::test]
async fn test_rate_limit_rotates_to_next_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(query_param("key", "k1"))
        .respond_with(rate_limited())
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(query_param("key", "k2"))
        .respond_with(reply("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let backend = GeminiBackend::new(config(&server, &["k1", "k2"])).unwrap();
    assert_eq!(backend.generate("prompt").await.unwrap(), "ok");
    assert_eq!(backend.current_key_index(), 1);
}

#[tokio::test]
async fn test_rate_limit_retries_are_bounded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(rate_limited())
        .expect(4)
        .mount(&server)
        .await;

    let backend = GeminiBackend::new(config(&server, &["only"])).unwrap();
    match backend.generate("prompt").await {
        Err(Error::RateLimited(msg)) => {
            assert!(msg.contains("Rate limit"), "{}", msg);
            assert!(msg.contains("Resource has been exhausted"), "{}", msg);
        }
        other => panic!("expected RateLimited, got {:?}", other),
    }
}

#[tokio::test]
async fn test_server_error_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .expect(1)
        .mount(&server)
        .await;

    let backend = GeminiBackend::new(config(&server, &["k1", "k2"])).unwrap();
    let err = backend.generate("prompt").await.unwrap_err();
    assert!(err.to_string().contains("500"), "{}", err);
    assert_eq!(backend.current_key_index(), 0);
}

#[tokio::test]
async fn test_invalid_key_is_config_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": {"code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = GeminiBackend::new(config(&server, &["bad"])).unwrap();
    let err = backend.generate("prompt").await.unwrap_err();
    assert!(err.to_string().contains("API key not valid"));
}

#[tokio::test]
async fn test_no_candidates_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&server)
        .await;

    let backend = GeminiBackend::new(config(&server, &["k1"])).unwrap();
    assert!(matches!(
        backend.generate("prompt").await,
        Err(Error::AiUnavailable(_))
    ));
}

#[tokio::test]
async fn test_analyzer_over_http_with_fenced_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(reply(
            "```json\n{\"category\": \"Lighting\", \"priority\": \"high\", \"title\": \"Street lamp out on 5th Ave\", \"description\": \"\"}\n```",
        ))
        .mount(&server)
        .await;

    let analyzer = ReportAnalyzer::new(GeminiBackend::new(config(&server, &["k1"])).unwrap());
    let result = analyzer
        .analyze_report("lamp", "The lamp on 5th avenue is dark", "40.741895, -73.989308")
        .await;

    assert_eq!(result.category, "Lighting");
    assert_eq!(result.priority, Priority::High);
    assert_eq!(result.title, "Street lamp out on 5th Ave");
    assert_eq!(result.description, "The lamp on 5th avenue is dark");
    assert_eq!(result.source, AnalysisSource::Structured);
}

#[tokio::test]
async fn test_analyzer_with_unreachable_endpoint_uses_defaults() {
    let backend = GeminiBackend::new(GeminiConfig {
        base_url: "http://127.0.0.1:1".to_string(),
        max_retries: 0,
        timeout: Duration::from_secs(5),
        ..Default::default()
    })
    .unwrap();
    let analyzer = ReportAnalyzer::new(backend);

    let result = analyzer
        .analyze_report("Broken bench", "Bench in the park is broken", "")
        .await;

    assert_eq!(result.category, "");
    assert_eq!(result.priority, Priority::Medium);
    assert_eq!(result.title, "Broken bench");
    assert_eq!(result.description, "Bench in the park is broken");
    assert_eq!(result.confidence, 0.0);
}
