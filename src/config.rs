use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub webhook_secret: String,
    pub notification_webhook_url: String,
    pub messaging_webhook_url: String,
    pub analysis_service_url: String,
    pub analysis_callback_url: String,
    pub ownership_service_url: String,
    pub livekit_host: String,
    pub livekit_api_key: String,
    pub livekit_api_secret: String,
    pub session_ttl_hours: i64,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            database_url: get_env("DATABASE_URL")?,
            jwt_secret: get_env("JWT_SECRET")?,
            webhook_secret: get_env("WEBHOOK_SECRET")?,
            notification_webhook_url: get_env("NOTIFICATION_WEBHOOK_URL")?,
            messaging_webhook_url: get_env("MESSAGING_WEBHOOK_URL")?,
            analysis_service_url: get_env("ANALYSIS_SERVICE_URL")?,
            analysis_callback_url: get_env("ANALYSIS_CALLBACK_URL")?,
            ownership_service_url: get_env("OWNERSHIP_SERVICE_URL")?,
            livekit_host: get_env("LIVEKIT_HOST")?,
            livekit_api_key: get_env("LIVEKIT_API_KEY")?,
            livekit_api_secret: get_env("LIVEKIT_API_SECRET")?,
            session_ttl_hours: env::var("SESSION_TTL_HOURS")
                .ok()
                .map(|raw| {
                    raw.parse()
                        .map_err(|e| Error::Config(format!("Invalid value for SESSION_TTL_HOURS: {}", e)))
                })
                .transpose()?
                .unwrap_or(24),
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}
