mod common;

use std::time::Duration;

use common::{chat_server, completion, config_for, mount_models, settle, REPLY, UNREACHABLE};
use lemonade_core::config::INITIAL_PROMPT;
use lemonade_core::session::{NO_MODEL_WARNING, NO_RESPONSE};
use lemonade_core::{ChatMessage, ChatRole, ConnectionStatus, SessionController, SessionPhase};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_connect_discovers_model_and_greets() {
    let server = MockServer::start().await;
    mount_models(&server, &["m1"]).await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_json(json!({
            "model": "m1",
            "messages": [{ "role": "user", "content": INITIAL_PROMPT }],
            "stream": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(REPLY)))
        .expect(1)
        .mount(&server)
        .await;

    let mut session = SessionController::new(config_for(&server.uri()));
    assert_eq!(session.status(), ConnectionStatus::Unknown);
    settle(&mut session).await;

    assert_eq!(session.status(), ConnectionStatus::Connected);
    assert_eq!(session.phase(), SessionPhase::ChatReady);
    assert_eq!(session.selected_model(), Some("m1"));
    assert_eq!(
        session.transcript(),
        &[ChatMessage::user(INITIAL_PROMPT), ChatMessage::assistant(REPLY)]
    );
}

#[tokio::test]
async fn test_no_model_blocks_sending() {
    let server = MockServer::start().await;
    mount_models(&server, &[]).await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(REPLY)))
        .expect(0)
        .mount(&server)
        .await;

    let mut session = SessionController::new(config_for(&server.uri()));
    settle(&mut session).await;

    assert_eq!(session.phase(), SessionPhase::Blocked);
    assert_eq!(session.transcript(), &[ChatMessage::assistant(NO_MODEL_WARNING)]);

    assert!(!session.send_message("hi"));
    assert_eq!(session.transcript().len(), 1);
}

#[tokio::test]
async fn test_reply_follows_its_prompt() {
    let server = chat_server(Duration::ZERO).await;
    let mut session = SessionController::new(config_for(&server.uri()));
    settle(&mut session).await;

    assert!(session.send_message("hi"));
    settle(&mut session).await;

    let transcript = session.transcript();
    let n = transcript.len();
    assert_eq!(n, 4);
    assert_eq!(transcript[n - 2], ChatMessage::user("hi"));
    assert_eq!(transcript[n - 1].role, ChatRole::Assistant);
    assert_eq!(transcript[n - 1].content, REPLY);
}

#[tokio::test]
async fn test_blank_prompt_is_ignored() {
    let server = chat_server(Duration::ZERO).await;
    let mut session = SessionController::new(config_for(&server.uri()));
    settle(&mut session).await;

    assert!(!session.send_message("   \n"));
    assert!(!session.is_pending());
    assert_eq!(session.transcript().len(), 2);
}

#[tokio::test]
async fn test_second_send_while_pending_is_dropped() {
    let server = chat_server(Duration::from_millis(200)).await;
    let mut session = SessionController::new(config_for(&server.uri()));
    settle(&mut session).await;
    let before = session.transcript().len();

    assert!(session.send_message("one"));
    assert!(session.is_pending());
    assert!(!session.send_message("two"));
    assert_eq!(session.transcript().len(), before + 1);

    settle(&mut session).await;
    let transcript = session.transcript();
    assert_eq!(transcript.len(), before + 2);
    assert_eq!(transcript[before], ChatMessage::user("one"));
    assert_eq!(transcript[before + 1], ChatMessage::assistant(REPLY));
}

#[tokio::test]
async fn test_chat_error_becomes_assistant_message() {
    let server = MockServer::start().await;
    mount_models(&server, &["m1"]).await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("model is loading"))
        .mount(&server)
        .await;

    let mut session = SessionController::new(config_for(&server.uri()));
    settle(&mut session).await;

    assert_eq!(session.phase(), SessionPhase::ChatReady);
    assert!(!session.is_pending());
    let last = session.transcript().last().unwrap();
    assert_eq!(last.role, ChatRole::Assistant);
    assert!(last.content.starts_with("Error:"), "{}", last.content);
    assert!(last.content.contains("503"), "{}", last.content);
    assert!(last.content.contains("model is loading"), "{}", last.content);
}

#[tokio::test]
async fn test_unreachable_chat_endpoint_becomes_assistant_message() {
    let server = MockServer::start().await;
    mount_models(&server, &["m1"]).await;

    // The mock's host:port turns into userinfo, so chat goes to port 1
    let mut config = config_for(&server.uri());
    config.endpoints.chat = "@127.0.0.1:1/v1/chat/completions".to_string();

    let mut session = SessionController::new(config);
    settle(&mut session).await;

    assert_eq!(session.phase(), SessionPhase::ChatReady);
    assert!(!session.is_pending());
    assert_eq!(session.transcript().len(), 2);
    let last = session.transcript().last().unwrap();
    assert_eq!(last.role, ChatRole::Assistant);
    assert!(last.content.starts_with("Error: Could not connect"), "{}", last.content);

    // The session stays usable after a failed send
    assert!(session.send_message("still there?"));
    settle(&mut session).await;
    assert_eq!(session.transcript().len(), 4);
}

#[tokio::test]
async fn test_unexpected_shape_uses_placeholder() {
    let server = MockServer::start().await;
    mount_models(&server, &["m1"]).await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let mut session = SessionController::new(config_for(&server.uri()));
    settle(&mut session).await;

    assert_eq!(
        session.transcript(),
        &[ChatMessage::user(INITIAL_PROMPT), ChatMessage::assistant(NO_RESPONSE)]
    );
}

#[tokio::test]
async fn test_reset_reseeds_greeting_exchange() {
    let server = chat_server(Duration::ZERO).await;
    let mut session = SessionController::new(config_for(&server.uri()));
    settle(&mut session).await;

    assert!(session.send_message("hi"));
    settle(&mut session).await;
    assert_eq!(session.transcript().len(), 4);

    session.reset_conversation();
    assert!(session.transcript().is_empty());
    assert!(!session.is_settled());

    settle(&mut session).await;
    assert_eq!(
        session.transcript(),
        &[ChatMessage::user(INITIAL_PROMPT), ChatMessage::assistant(REPLY)]
    );
}

#[tokio::test]
async fn test_reset_discards_inflight_reply() {
    let server = chat_server(Duration::from_millis(150)).await;
    let mut session = SessionController::new(config_for(&server.uri()));
    settle(&mut session).await;

    assert!(session.send_message("slow"));
    session.reset_conversation();
    assert!(!session.is_pending());

    settle(&mut session).await;
    // Give the superseded reply a chance to arrive, then drain it
    tokio::time::sleep(Duration::from_millis(300)).await;
    loop {
        let next = tokio::time::timeout(Duration::from_millis(50), session.next_event()).await;
        match next {
            Ok(Some(event)) => session.apply(event),
            _ => break,
        }
    }

    assert_eq!(
        session.transcript(),
        &[ChatMessage::user(INITIAL_PROMPT), ChatMessage::assistant(REPLY)]
    );
}

#[tokio::test]
async fn test_latest_address_wins() {
    let server = chat_server(Duration::ZERO).await;

    let mut session = SessionController::new(config_for(UNREACHABLE));
    session.set_address(&server.uri());
    assert_eq!(session.status(), ConnectionStatus::Unknown);
    settle(&mut session).await;
    assert_eq!(session.status(), ConnectionStatus::Connected);
    assert_eq!(session.address(), server.uri());

    session.set_address(UNREACHABLE);
    assert_eq!(session.status(), ConnectionStatus::Unknown);
    assert_eq!(session.selected_model(), None);
    settle(&mut session).await;
    assert_eq!(session.status(), ConnectionStatus::Failed);
}

#[tokio::test]
async fn test_failed_probe_then_retry_with_draft() {
    let server = chat_server(Duration::ZERO).await;

    let mut session = SessionController::new(config_for(UNREACHABLE));
    settle(&mut session).await;
    assert_eq!(session.phase(), SessionPhase::Failed);
    let detail = session.error_detail().unwrap();
    assert!(detail.contains("/v1/models") && detail.contains("/v1/health"), "{}", detail);

    session.set_address_draft(server.uri());
    session.retry();
    assert_eq!(session.status(), ConnectionStatus::Unknown);
    assert_eq!(session.error_detail(), None);

    settle(&mut session).await;
    assert_eq!(session.phase(), SessionPhase::ChatReady);
    assert_eq!(session.transcript().len(), 2);
}
