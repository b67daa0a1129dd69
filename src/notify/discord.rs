//! Discord REST notification sink
//!
//! Uses the bot-token authenticated REST API directly: a channel lookup to
//! confirm the destination exists and a multipart message create for each
//! announcement.

use crate::error::{HeraldError, Result};
use crate::notify::sink::NotificationSink;
use crate::types::{ChannelId, ChannelInfo, Notification};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde_json::json;
use std::time::Duration;
use tracing::debug;

/// Sink posting messages to Discord channels
pub struct DiscordSink {
    api_base: String,
    token: String,
    http: Client,
}

impl DiscordSink {
    pub fn new(api_base: impl Into<String>, token: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(
                "DiscordBot (https://github.com/lobby-herald, ",
                env!("CARGO_PKG_VERSION"),
                ")"
            ))
            .build()
            .map_err(|e| HeraldError::SinkRequestFailed {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token: token.into(),
            http,
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    fn auth_header(&self) -> String {
        format!("Bot {}", self.token)
    }

    fn build_form(notification: Notification) -> Result<Form> {
        let attachments = match &notification.attachment {
            Some(image) => json!([{ "id": 0, "filename": image.file_name }]),
            None => json!([]),
        };
        let payload = json!({
            "content": notification.content,
            "attachments": attachments,
        });

        let mut form = Form::new().text("payload_json", payload.to_string());
        if let Some(image) = notification.attachment {
            let part = Part::bytes(image.png)
                .file_name(image.file_name)
                .mime_str("image/png")
                .map_err(|e| HeraldError::SinkRequestFailed {
                    message: format!("Failed to build attachment: {}", e),
                })?;
            form = form.part("files[0]", part);
        }

        Ok(form)
    }
}

#[async_trait]
impl NotificationSink for DiscordSink {
    async fn resolve_channel(&self, channel_id: &ChannelId) -> Result<Option<ChannelInfo>> {
        let resp = self
            .http
            .get(self.api_url(&format!("/channels/{}", channel_id)))
            .header(reqwest::header::AUTHORIZATION, self.auth_header())
            .send()
            .await
            .map_err(|e| HeraldError::SinkRequestFailed {
                message: format!("Channel lookup failed: {}", e),
            })?;

        match resp.status() {
            StatusCode::NOT_FOUND => {
                debug!("Channel {} not found", channel_id);
                Ok(None)
            }
            status if status.is_success() => {
                let channel: ChannelInfo =
                    resp.json().await.map_err(|e| HeraldError::SinkRequestFailed {
                        message: format!("Failed to decode channel: {}", e),
                    })?;
                Ok(Some(channel))
            }
            status => {
                let body = resp.text().await.unwrap_or_default();
                Err(HeraldError::SinkRejected {
                    status: status.as_u16(),
                    body,
                }
                .into())
            }
        }
    }

    async fn publish(&self, channel_id: &ChannelId, notification: Notification) -> Result<()> {
        let form = Self::build_form(notification)?;

        let resp = self
            .http
            .post(self.api_url(&format!("/channels/{}/messages", channel_id)))
            .header(reqwest::header::AUTHORIZATION, self.auth_header())
            .multipart(form)
            .send()
            .await
            .map_err(|e| HeraldError::SinkRequestFailed {
                message: format!("Message create failed: {}", e),
            })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(HeraldError::SinkRejected {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        debug!("Published message to channel {}", channel_id);
        Ok(())
    }
}
