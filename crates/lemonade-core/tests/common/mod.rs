#![allow(dead_code)]

use std::time::Duration;

use lemonade_core::{Config, SessionController};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Nothing listens here, so connections are refused
pub const UNREACHABLE: &str = "http://127.0.0.1:1";

pub const REPLY: &str = "Hi! I'm a local model.";

pub fn config_for(address: &str) -> Config {
    Config {
        server_address: address.to_string(),
        reset_delay_ms: 10,
        ..Config::new()
    }
}

pub async fn mount_models(server: &MockServer, ids: &[&str]) {
    let data: Vec<_> = ids.iter().map(|id| json!({ "id": id, "object": "model" })).collect();
    Mock::given(method("GET"))
        .and(path("/v1/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "object": "list", "data": data })))
        .mount(server)
        .await;
}

pub fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    })
}

pub async fn mount_chat(server: &MockServer, delay: Duration) {
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion(REPLY))
                .set_delay(delay),
        )
        .mount(server)
        .await;
}

/// A server with one model that answers every prompt
pub async fn chat_server(delay: Duration) -> MockServer {
    let server = MockServer::start().await;
    mount_models(&server, &["m1"]).await;
    mount_chat(&server, delay).await;
    server
}

/// Apply events until nothing is in flight
pub async fn settle(session: &mut SessionController) {
    tokio::time::timeout(Duration::from_secs(10), async {
        while !session.is_settled() {
            let event = session.next_event().await.expect("event channel closed");
            session.apply(event);
        }
    })
    .await
    .expect("session did not settle");
}
