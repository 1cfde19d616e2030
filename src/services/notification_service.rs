use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value as JsonValue};
use uuid::Uuid;

/// In-app notification delivery. Always invoked post-commit, fire-and-forget.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(
        &self,
        user_id: Uuid,
        title: &str,
        body: &str,
        context: JsonValue,
    ) -> anyhow::Result<()>;
}

/// Posts notifications to the delivery gateway webhook.
#[derive(Clone)]
pub struct HttpNotificationService {
    client: Client,
    webhook_url: String,
    secret: String,
}

impl HttpNotificationService {
    pub fn new(webhook_url: String, secret: String, client: Client) -> Self {
        Self {
            client,
            webhook_url,
            secret,
        }
    }
}

#[async_trait]
impl NotificationSink for HttpNotificationService {
    async fn notify(
        &self,
        user_id: Uuid,
        title: &str,
        body: &str,
        context: JsonValue,
    ) -> anyhow::Result<()> {
        self.client
            .post(&self.webhook_url)
            .header("X-Webhook-Secret", &self.secret)
            .json(&json!({
                "user_id": user_id,
                "title": title,
                "body": body,
                "context": context,
            }))
            .send()
            .await?
            .error_for_status()?;
        tracing::info!(%user_id, title, "notification delivered");
        Ok(())
    }
}
