use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value as JsonValue};

/// Out-of-band messaging (credential delivery, interview links). Templates
/// are named server-side; this side only supplies parameters.
#[async_trait]
pub trait MessagingChannel: Send + Sync {
    async fn send_templated_message(
        &self,
        phone: &str,
        template: &str,
        params: JsonValue,
    ) -> anyhow::Result<()>;
}

#[derive(Clone)]
pub struct HttpMessagingService {
    client: Client,
    webhook_url: String,
    secret: String,
}

impl HttpMessagingService {
    pub fn new(webhook_url: String, secret: String, client: Client) -> Self {
        Self {
            client,
            webhook_url,
            secret,
        }
    }
}

#[async_trait]
impl MessagingChannel for HttpMessagingService {
    async fn send_templated_message(
        &self,
        phone: &str,
        template: &str,
        params: JsonValue,
    ) -> anyhow::Result<()> {
        self.client
            .post(&self.webhook_url)
            .header("X-Webhook-Secret", &self.secret)
            .json(&json!({
                "phone": phone,
                "template": template,
                "params": params,
            }))
            .send()
            .await?
            .error_for_status()?;
        tracing::info!(template, "templated message sent");
        Ok(())
    }
}
