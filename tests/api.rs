//! API endpoint integration tests

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use tower::ServiceExt;

use vocal_gateway::api::{routes, ApiState};
use vocal_gateway::providers::{SpeakerChain, SpeechSynthesizer};
use vocal_gateway::session::SessionManager;
use vocal_gateway::turn::Orchestrator;

mod common;
use common::{MockLlm, MockStt, MockTts};

/// Build a test API router over the given orchestrator
fn build_test_router(orchestrator: Orchestrator) -> axum::Router {
    let sessions = Arc::new(SessionManager::new(
        None,
        orchestrator.clone(),
        Duration::from_secs(60),
    ));
    routes::router(Arc::new(ApiState {
        orchestrator,
        sessions,
    }))
}

fn chain(tts: Arc<MockTts>) -> Arc<SpeakerChain> {
    let providers: Vec<Arc<dyn SpeechSynthesizer>> = vec![tts];
    Arc::new(SpeakerChain::new(providers).expect("non-empty chain"))
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("readable body");
    serde_json::from_slice(&bytes).expect("JSON body")
}

fn multipart_body(field_name: &str) -> (String, Vec<u8>) {
    let boundary = "vocal-test-boundary";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"{field_name}\"; filename=\"clip.webm\"\r\n\
         Content-Type: audio/webm\r\n\r\n\
         fake-webm-bytes\r\n\
         --{boundary}--\r\n"
    );
    (
        format!("multipart/form-data; boundary={boundary}"),
        body.into_bytes(),
    )
}

#[tokio::test]
async fn status_endpoint_reports_running() {
    let app = build_test_router(Orchestrator::new(None, None, None));

    let response = app
        .oneshot(Request::builder().uri("/status").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "Voice Assistant API running");
}

#[tokio::test]
async fn transcribe_returns_transcript() {
    let stt = MockStt::new("hello from the microphone");
    let app = build_test_router(Orchestrator::new(Some(stt.clone()), None, None));

    let (content_type, body) = multipart_body("audio");
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/transcribe")
                .header(header::CONTENT_TYPE, content_type)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["text"], "hello from the microphone");
    assert_eq!(stt.call_count(), 1);
}

#[tokio::test]
async fn transcribe_without_audio_field_is_400() {
    let stt = MockStt::new("never used");
    let app = build_test_router(Orchestrator::new(Some(stt.clone()), None, None));

    let (content_type, body) = multipart_body("attachment");
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/transcribe")
                .header(header::CONTENT_TYPE, content_type)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "No audio file provided");
    assert_eq!(stt.call_count(), 0);
}

#[tokio::test]
async fn chat_returns_reply() {
    let llm = MockLlm::new("nice to meet you");
    let app = build_test_router(Orchestrator::new(None, Some(llm.clone()), None));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/chat")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"text":"hello","language":"en"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["response"], "nice to meet you");
    assert_eq!(llm.seen_inputs(), vec!["hello".to_string()]);
}

#[tokio::test]
async fn chat_with_blank_text_is_400() {
    let llm = MockLlm::new("never used");
    let app = build_test_router(Orchestrator::new(None, Some(llm.clone()), None));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/chat")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"text":"   "}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "No text provided");
    assert_eq!(llm.call_count(), 0);
}

#[tokio::test]
async fn speak_returns_sanitized_audio() {
    let tts = MockTts::healthy("tts", vec![3, 3, 3]);
    let app = build_test_router(Orchestrator::new(None, None, Some(chain(tts.clone()))));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/speak")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"text":"**Hello**, *world*!"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok()),
        Some("audio/mpeg")
    );
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(bytes.as_ref(), &[3, 3, 3]);
    // Markdown is stripped before the text reaches the synthesizer.
    assert_eq!(tts.spoken(), vec!["Hello, world!".to_string()]);
}

#[tokio::test]
async fn unconfigured_capability_is_500_with_payload() {
    let app = build_test_router(Orchestrator::new(None, None, None));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/chat")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"text":"hello"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["error"], "language model not configured");
}

#[tokio::test]
async fn connect_without_signaling_is_500() {
    let app = build_test_router(Orchestrator::new(None, None, None));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/connect")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["error"], "signaling service not configured");
}
