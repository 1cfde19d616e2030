use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub role: Option<String>,
}

/// Issues the session token handed to an anonymous applicant together with
/// their one-time credentials.
#[derive(Clone)]
pub struct SessionService {
    jwt_secret: String,
    ttl_hours: i64,
}

impl SessionService {
    pub fn new(jwt_secret: String, ttl_hours: i64) -> Self {
        Self {
            jwt_secret,
            ttl_hours,
        }
    }

    pub fn issue_token(&self, user_id: Uuid, role: &str) -> Result<String> {
        let exp = (Utc::now() + Duration::hours(self.ttl_hours)).timestamp() as usize;
        let claims = Claims {
            sub: user_id.to_string(),
            exp,
            role: Some(role.to_string()),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )?;
        Ok(token)
    }
}
