use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Authorization collaborator. Unlike the other external calls this one runs
/// before the transaction and its `Forbidden` flows straight to the caller.
#[async_trait]
pub trait OwnershipGate: Send + Sync {
    async fn verify_ownership(
        &self,
        resource_id: Uuid,
        acting_user_id: Uuid,
        role: &str,
        organization_id: Uuid,
    ) -> Result<()>;
}

#[derive(Clone)]
pub struct HttpOwnershipService {
    client: Client,
    base_url: String,
    secret: String,
}

impl HttpOwnershipService {
    pub fn new(base_url: String, secret: String, client: Client) -> Self {
        Self {
            client,
            base_url,
            secret,
        }
    }
}

#[async_trait]
impl OwnershipGate for HttpOwnershipService {
    async fn verify_ownership(
        &self,
        resource_id: Uuid,
        acting_user_id: Uuid,
        role: &str,
        organization_id: Uuid,
    ) -> Result<()> {
        let response = self
            .client
            .post(format!("{}/verify", self.base_url))
            .header("X-Webhook-Secret", &self.secret)
            .json(&json!({
                "resource_id": resource_id,
                "user_id": acting_user_id,
                "role": role,
                "organization_id": organization_id,
            }))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else if status == reqwest::StatusCode::FORBIDDEN {
            Err(Error::Forbidden(
                "You do not have access to this application".to_string(),
            ))
        } else {
            Err(Error::Internal(format!(
                "Ownership check returned unexpected status {}",
                status
            )))
        }
    }
}
