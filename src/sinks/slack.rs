// ABOUTME: Slack-style incoming-webhook NotificationSink.
// ABOUTME: Posts the run report as a plain text message.

use async_trait::async_trait;

use super::{NotificationSink, SinkError};

/// Posts run reports to a Slack incoming webhook.
pub struct SlackNotifier {
    client: reqwest::Client,
    webhook_url: String,
}

impl SlackNotifier {
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            webhook_url: webhook_url.into(),
        }
    }
}

#[async_trait]
impl NotificationSink for SlackNotifier {
    async fn notify(&self, report: &str) -> Result<(), SinkError> {
        let response = self
            .client
            .post(&self.webhook_url)
            .json(&serde_json::json!({ "text": report }))
            .send()
            .await
            .map_err(|e| SinkError::Notify(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SinkError::Notify(format!(
                "webhook answered {}",
                response.status()
            )));
        }

        Ok(())
    }
}
