use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::Serialize;
use serde_json::{json, Value as JsonValue};

/// Result of provisioning an interview room: what the candidate needs to join.
#[derive(Debug, Clone)]
pub struct RoomGrant {
    pub room_name: String,
    pub join_token: String,
    pub url: String,
}

#[async_trait]
pub trait RoomProvisioner: Send + Sync {
    async fn create_room(
        &self,
        room_name: &str,
        metadata: JsonValue,
        owner_tag: &str,
        participant_name: &str,
    ) -> anyhow::Result<RoomGrant>;
}

#[derive(Serialize)]
struct VideoGrant<'a> {
    #[serde(rename = "roomCreate", skip_serializing_if = "std::ops::Not::not")]
    room_create: bool,
    #[serde(rename = "roomJoin", skip_serializing_if = "std::ops::Not::not")]
    room_join: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    room: Option<&'a str>,
}

#[derive(Serialize)]
struct LiveKitClaims<'a> {
    iss: &'a str,
    sub: &'a str,
    exp: i64,
    nbf: i64,
    video: VideoGrant<'a>,
}

/// LiveKit-backed provisioning: create the room over the server API, then
/// mint a scoped join token for the candidate.
#[derive(Clone)]
pub struct LiveKitRoomService {
    client: Client,
    host: String,
    api_key: String,
    api_secret: String,
}

impl LiveKitRoomService {
    pub fn new(host: String, api_key: String, api_secret: String, client: Client) -> Self {
        Self {
            client,
            host,
            api_key,
            api_secret,
        }
    }

    fn access_token(&self, identity: &str, grant: VideoGrant<'_>) -> anyhow::Result<String> {
        let now = Utc::now().timestamp();
        let claims = LiveKitClaims {
            iss: &self.api_key,
            sub: identity,
            exp: now + 6 * 3600,
            nbf: now - 10,
            video: grant,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.api_secret.as_bytes()),
        )?;
        Ok(token)
    }
}

#[async_trait]
impl RoomProvisioner for LiveKitRoomService {
    async fn create_room(
        &self,
        room_name: &str,
        metadata: JsonValue,
        owner_tag: &str,
        participant_name: &str,
    ) -> anyhow::Result<RoomGrant> {
        let admin_token = self.access_token(
            owner_tag,
            VideoGrant {
                room_create: true,
                room_join: false,
                room: None,
            },
        )?;
        self.client
            .post(format!("{}/twirp/livekit.RoomService/CreateRoom", self.host))
            .bearer_auth(&admin_token)
            .json(&json!({
                "name": room_name,
                "metadata": metadata.to_string(),
                "empty_timeout": 600,
            }))
            .send()
            .await?
            .error_for_status()?;

        let join_token = self.access_token(
            participant_name,
            VideoGrant {
                room_create: false,
                room_join: true,
                room: Some(room_name),
            },
        )?;
        tracing::info!(room = room_name, "interview room created");
        Ok(RoomGrant {
            room_name: room_name.to_string(),
            join_token,
            url: self.host.clone(),
        })
    }
}
