use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use uuid::Uuid;

/// Kick-off request for the external CV analysis pipeline. Results come back
/// later through the engine's analysis callback.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisRequest {
    pub application_id: Uuid,
    pub candidate_id: Uuid,
    pub job_id: Uuid,
    pub resume_url: String,
    pub callback_url: String,
}

#[async_trait]
pub trait AnalysisClient: Send + Sync {
    async fn trigger_analysis(&self, request: AnalysisRequest) -> anyhow::Result<()>;
}

#[derive(Clone)]
pub struct HttpAnalysisService {
    client: Client,
    base_url: String,
    secret: String,
}

impl HttpAnalysisService {
    pub fn new(base_url: String, secret: String, client: Client) -> Self {
        Self {
            client,
            base_url,
            secret,
        }
    }
}

#[async_trait]
impl AnalysisClient for HttpAnalysisService {
    async fn trigger_analysis(&self, request: AnalysisRequest) -> anyhow::Result<()> {
        self.client
            .post(format!("{}/analyze", self.base_url))
            .header("X-Webhook-Secret", &self.secret)
            .json(&request)
            .send()
            .await?
            .error_for_status()?;
        tracing::info!(application_id = %request.application_id, "analysis triggered");
        Ok(())
    }
}
