//! Mock Discord REST API for testing notification delivery

use serde_json::{json, Value};
use wiremock::{
    matchers::{header, method, path, path_regex},
    Mock, MockServer, ResponseTemplate,
};

pub const TEST_BOT_TOKEN: &str = "test-bot-token";

/// Captured Discord API request
#[derive(Debug, Clone)]
pub struct DiscordRequest {
    pub method: String,
    pub path: String,
    pub body: Option<Value>,
}

pub struct MockDiscordServer {
    pub server: MockServer,
    pub base_url: String,
}

impl MockDiscordServer {
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let base_url = server.uri();
        Self { server, base_url }
    }

    /// Message creation returns the given id
    pub async fn mock_create(&self, channel: &str, message_id: &str) {
        Mock::given(method("POST"))
            .and(path(format!("/channels/{}/messages", channel)))
            .and(header("Authorization", format!("Bot {}", TEST_BOT_TOKEN).as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": message_id,
                "channel_id": channel
            })))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_edit(&self, channel: &str, message_id: &str, status: u16) {
        Mock::given(method("PATCH"))
            .and(path(format!("/channels/{}/messages/{}", channel, message_id)))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({ "id": message_id })))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_delete(&self, channel: &str, message_id: &str, status: u16) {
        Mock::given(method("DELETE"))
            .and(path(format!("/channels/{}/messages/{}", channel, message_id)))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_rename(&self, target: &str, status: u16) {
        Mock::given(method("PATCH"))
            .and(path(format!("/channels/{}", target)))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({ "id": target })))
            .mount(&self.server)
            .await;
    }

    /// Every channel call fails with the given status
    pub async fn mock_failure(&self, status: u16) {
        Mock::given(path_regex(r"^/channels/.*"))
            .respond_with(
                ResponseTemplate::new(status)
                    .set_body_json(json!({ "message": "Missing Access", "code": 50001 })),
            )
            .mount(&self.server)
            .await;
    }

    pub async fn requests(&self) -> Vec<DiscordRequest> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .map(|req| DiscordRequest {
                method: req.method.to_string(),
                path: req.url.path().to_string(),
                body: serde_json::from_slice(&req.body).ok(),
            })
            .collect()
    }

    pub async fn request_count(&self) -> usize {
        self.requests().await.len()
    }
}
