mod common;

use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use lexchat::backend::{HttpBackend, QaBackend};
use lexchat::message::{Confidence, Role};

fn backend(server: &MockServer) -> HttpBackend {
    HttpBackend::new(&common::backend_config(&server.uri())).expect("create backend")
}

#[tokio::test]
async fn test_ask_posts_question_and_parses_answer() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/ask"))
        .and(body_json(json!({
            "question": "Apa itu PKWT?",
            "session_id": "s-1"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "answer": "PKWT adalah perjanjian kerja waktu tertentu [1].",
            "citations": [{
                "regulation": "UU 13/2003",
                "article": "Pasal 56",
                "url": "https://peraturan.go.id/uu-13-2003",
                "chunk_id": "c-9"
            }],
            "confidence": "high",
            "confidence_score": 0.91,
            "processing_time_ms": 1250,
            "session_id": "s-1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let answer = backend(&server)
        .ask("Apa itu PKWT?", Some("s-1"))
        .await
        .expect("ask succeeds");

    assert_eq!(answer.session_id.as_deref(), Some("s-1"));
    assert_eq!(answer.citations.len(), 1);
    assert_eq!(answer.citations[0].label(), "UU 13/2003 Pasal 56");
    assert_eq!(answer.citations[0].extra.get("chunk_id"), Some(&json!("c-9")));

    let message = answer.to_message();
    assert_eq!(message.role, Role::Assistant);
    assert_eq!(message.confidence, Some(Confidence::High));
    assert_eq!(message.processing_time_ms, Some(1250));
}

#[tokio::test]
async fn test_ask_without_session_omits_field() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/ask"))
        .and(body_json(json!({ "question": "Halo" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "answer": "Halo juga."
        })))
        .expect(1)
        .mount(&server)
        .await;

    let answer = backend(&server).ask("Halo", None).await.expect("ask succeeds");
    assert_eq!(answer.answer, "Halo juga.");
    assert!(answer.citations.is_empty());
    assert_eq!(answer.session_id, None);
}

#[tokio::test]
async fn test_ask_server_error_is_reported() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/ask"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let err = backend(&server)
        .ask("Apa itu PKWT?", None)
        .await
        .expect_err("500 should fail");
    let text = format!("{:#}", err);
    assert!(text.contains("500"), "unexpected error: {}", text);
    assert!(text.contains("boom"), "unexpected error: {}", text);
}

#[tokio::test]
async fn test_ask_malformed_body_is_reported() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/ask"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    assert!(backend(&server).ask("q", None).await.is_err());
}

#[tokio::test]
async fn test_chat_history_converts_messages() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/chat/history/s-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "session_id": "s-1",
            "messages": [
                { "role": "user", "content": "Apa itu PHK?" },
                { "role": "system", "content": "hidden" },
                { "role": "assistant", "content": "Pemutusan hubungan kerja [1]." }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let history = backend(&server)
        .chat_history("s-1")
        .await
        .expect("history succeeds");
    assert_eq!(history.session_id, "s-1");

    let messages = history.into_messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, Role::User);
    assert_eq!(messages[1].content, "Pemutusan hubungan kerja [1].");
}

#[tokio::test]
async fn test_chat_history_not_found_is_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/chat/history/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    assert!(backend(&server).chat_history("missing").await.is_err());
}

#[tokio::test]
async fn test_delete_session_calls_endpoint() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/api/chat/sessions/s-1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    backend(&server)
        .delete_session("s-1")
        .await
        .expect("delete succeeds");
}

#[tokio::test]
async fn test_delete_session_failure_is_error() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/api/chat/sessions/s-1"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    assert!(backend(&server).delete_session("s-1").await.is_err());
}
