pub mod config;
pub mod dto;
pub mod error;
pub mod models;
pub mod services;
pub mod store;
pub mod utils;

use std::sync::Arc;

use reqwest::Client;
use sqlx::PgPool;

use crate::services::analysis_service::HttpAnalysisService;
use crate::services::audit_service::PgAuditService;
use crate::services::dispatcher::Dispatcher;
use crate::services::identity_service::IdentityService;
use crate::services::lifecycle_service::LifecycleService;
use crate::services::messaging_service::HttpMessagingService;
use crate::services::notification_service::HttpNotificationService;
use crate::services::ownership_service::HttpOwnershipService;
use crate::services::room_service::LiveKitRoomService;
use crate::services::session_service::SessionService;
use crate::store::pg::PgStore;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub lifecycle_service: LifecycleService,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        let config = crate::config::get_config();
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap();

        let store = Arc::new(PgStore::new(pool.clone()));
        let lifecycle_service = LifecycleService::new(
            store,
            IdentityService::new(),
            SessionService::new(config.jwt_secret.clone(), config.session_ttl_hours),
            Arc::new(HttpOwnershipService::new(
                config.ownership_service_url.clone(),
                config.webhook_secret.clone(),
                http_client.clone(),
            )),
            Arc::new(HttpNotificationService::new(
                config.notification_webhook_url.clone(),
                config.webhook_secret.clone(),
                http_client.clone(),
            )),
            Arc::new(HttpMessagingService::new(
                config.messaging_webhook_url.clone(),
                config.webhook_secret.clone(),
                http_client.clone(),
            )),
            Arc::new(HttpAnalysisService::new(
                config.analysis_service_url.clone(),
                config.webhook_secret.clone(),
                http_client.clone(),
            )),
            Arc::new(LiveKitRoomService::new(
                config.livekit_host.clone(),
                config.livekit_api_key.clone(),
                config.livekit_api_secret.clone(),
                http_client,
            )),
            Arc::new(PgAuditService::new(pool.clone())),
            Dispatcher::background(),
            config.analysis_callback_url.clone(),
        );

        Self {
            pool,
            lifecycle_service,
        }
    }
}
