use anyhow::{Context, Result, bail};
use tracing::info;

/// Operator-facing alert channel.
///
/// Deliveries are best-effort: the scheduler logs failures and keeps
/// monitoring, same policy as the metrics sink.
#[async_trait::async_trait]
pub trait NotificationChannel: Send + Sync {
    async fn notify(&self, message: &str) -> Result<()>;
}

/// Posts messages to a Slack-compatible incoming webhook
pub struct SlackWebhookChannel {
    client: reqwest::Client,
    webhook_url: String,
}

impl SlackWebhookChannel {
    pub fn new(webhook_url: String) -> Self {
        Self { client: reqwest::Client::new(), webhook_url }
    }
}

#[async_trait::async_trait]
impl NotificationChannel for SlackWebhookChannel {
    async fn notify(&self, message: &str) -> Result<()> {
        let payload = serde_json::json!({ "text": message });

        let response = self
            .client
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await
            .context("webhook request failed")?;

        let status = response.status();
        if !status.is_success() {
            bail!("webhook rejected with status {}", status.as_u16());
        }

        Ok(())
    }
}

/// Fallback channel used when no webhook is configured
pub struct LogChannel;

#[async_trait::async_trait]
impl NotificationChannel for LogChannel {
    async fn notify(&self, message: &str) -> Result<()> {
        info!("{message}");
        Ok(())
    }
}
