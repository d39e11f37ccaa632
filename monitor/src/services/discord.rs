// File: monitor/src/services/discord.rs
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::notification_service::{MessageRef, NotificationSink};
use super::render::MessageContent;
use crate::config::DiscordConfig;
use crate::constants::notifications;
use crate::errors::SinkError;

#[derive(Debug, Deserialize)]
struct CreatedMessage {
    id: String,
}

/// Notification sink backed by the Discord REST API
pub struct DiscordSink {
    client: Client,
    api_base: String,
    bot_token: String,
}

impl DiscordSink {
    pub fn new(config: &DiscordConfig) -> Result<Self, SinkError> {
        let client = Client::builder()
            .timeout(notifications::SINK_REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SinkError::RequestFailed {
                operation: "create HTTP client".to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            bot_token: config.bot_token.clone(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.api_base, path))
            .header("Authorization", format!("Bot {}", self.bot_token))
    }

    async fn send(&self, operation: &str, request: RequestBuilder) -> Result<Response, SinkError> {
        let response = request.send().await.map_err(|e| SinkError::RequestFailed {
            operation: operation.to_string(),
            reason: e.to_string(),
        })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SinkError::Rejected {
                operation: operation.to_string(),
                status,
                body,
            });
        }

        debug!("Discord {} succeeded", operation);
        Ok(response)
    }
}

/// Discord embed payload for one summary message.
pub fn embed_payload(content: &MessageContent) -> Value {
    let fields: Vec<Value> = content
        .fields
        .iter()
        .map(|f| json!({ "name": f.name, "value": f.value, "inline": false }))
        .collect();

    json!({
        "embeds": [{
            "title": content.title,
            "description": content.description,
            "color": content.color,
            "fields": fields,
            "timestamp": content.timestamp.to_rfc3339(),
        }]
    })
}

#[async_trait]
impl NotificationSink for DiscordSink {
    async fn create_message(
        &self,
        channel: &str,
        content: &MessageContent,
    ) -> Result<MessageRef, SinkError> {
        let operation = "create_message";
        let response = self
            .send(
                operation,
                self.request(Method::POST, &format!("/channels/{}/messages", channel))
                    .json(&embed_payload(content)),
            )
            .await?;

        let created: CreatedMessage =
            response
                .json()
                .await
                .map_err(|e| SinkError::InvalidResponse {
                    operation: operation.to_string(),
                    reason: e.to_string(),
                })?;

        Ok(MessageRef {
            channel_id: channel.to_string(),
            message_id: created.id,
        })
    }

    async fn edit_message(
        &self,
        message: &MessageRef,
        content: &MessageContent,
    ) -> Result<(), SinkError> {
        let path = format!(
            "/channels/{}/messages/{}",
            message.channel_id, message.message_id
        );
        self.send(
            "edit_message",
            self.request(Method::PATCH, &path).json(&embed_payload(content)),
        )
        .await?;
        Ok(())
    }

    async fn delete_message(&self, message: &MessageRef) -> Result<(), SinkError> {
        let path = format!(
            "/channels/{}/messages/{}",
            message.channel_id, message.message_id
        );
        self.send("delete_message", self.request(Method::DELETE, &path))
            .await?;
        Ok(())
    }

    async fn rename_label(&self, target: &str, text: &str) -> Result<(), SinkError> {
        self.send(
            "rename_label",
            self.request(Method::PATCH, &format!("/channels/{}", target))
                .json(&json!({ "name": text })),
        )
        .await?;
        Ok(())
    }
}
