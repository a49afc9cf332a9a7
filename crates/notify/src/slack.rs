//! Slack incoming-webhook sink

use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;

use career_assistant_config::NotificationConfig;
use career_assistant_core::{
    Error, NotificationChannel, NotificationMessage, NotificationSink, Result,
};

/// Posts Block Kit payloads to a Slack incoming webhook.
///
/// Webhook URL format: `https://hooks.slack.com/services/T.../B.../xxx`
pub struct SlackWebhookSink {
    client: reqwest::Client,
    timeout: Duration,
}

impl SlackWebhookSink {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Configuration(e.to_string()))?;
        Ok(Self { client, timeout })
    }

    pub fn from_settings(settings: &NotificationConfig) -> Result<Self> {
        Self::new(Duration::from_millis(settings.timeout_ms))
    }

    fn payload(message: &NotificationMessage) -> serde_json::Value {
        if message.blocks.is_empty() {
            json!({ "text": message.text })
        } else {
            json!({ "text": message.text, "blocks": message.blocks })
        }
    }
}

#[async_trait]
impl NotificationSink for SlackWebhookSink {
    async fn send(
        &self,
        channel: &NotificationChannel,
        message: &NotificationMessage,
    ) -> Result<()> {
        let response = self
            .client
            .post(&channel.webhook_url)
            .json(&Self::payload(message))
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(channel = %channel.name, error = %e, "Webhook delivery failed");
                if e.is_timeout() {
                    Error::Timeout(self.timeout.as_millis() as u64)
                } else {
                    Error::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            tracing::warn!(
                channel = %channel.name,
                status = status.as_u16(),
                detail = %detail,
                "Webhook rejected message"
            );
            return Err(Error::Upstream {
                status: status.as_u16(),
                detail,
            });
        }

        tracing::debug!(channel = %channel.name, "Notification delivered");
        Ok(())
    }
}
