#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use recruitflow::error::{Error, Result};
use recruitflow::models::audit::AuditEvent;
use recruitflow::models::job::{Job, JobStatus};
use recruitflow::models::user::User;
use recruitflow::services::analysis_service::{AnalysisClient, AnalysisRequest};
use recruitflow::services::audit_service::AuditSink;
use recruitflow::services::dispatcher::Dispatcher;
use recruitflow::services::identity_service::IdentityService;
use recruitflow::services::lifecycle_service::LifecycleService;
use recruitflow::services::messaging_service::MessagingChannel;
use recruitflow::services::notification_service::NotificationSink;
use recruitflow::services::ownership_service::OwnershipGate;
use recruitflow::services::room_service::{RoomGrant, RoomProvisioner};
use recruitflow::services::session_service::SessionService;
use recruitflow::store::memory::MemoryStore;

#[derive(Default)]
pub struct CapturingNotifier {
    pub sent: Mutex<Vec<(Uuid, String, String, JsonValue)>>,
}

#[async_trait]
impl NotificationSink for CapturingNotifier {
    async fn notify(
        &self,
        user_id: Uuid,
        title: &str,
        body: &str,
        context: JsonValue,
    ) -> anyhow::Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((user_id, title.to_string(), body.to_string(), context));
        Ok(())
    }
}

#[derive(Default)]
pub struct CapturingMessenger {
    pub sent: Mutex<Vec<(String, String, JsonValue)>>,
}

#[async_trait]
impl MessagingChannel for CapturingMessenger {
    async fn send_templated_message(
        &self,
        phone: &str,
        template: &str,
        params: JsonValue,
    ) -> anyhow::Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((phone.to_string(), template.to_string(), params));
        Ok(())
    }
}

#[derive(Default)]
pub struct CapturingAnalysis {
    pub requests: Mutex<Vec<AnalysisRequest>>,
}

#[async_trait]
impl AnalysisClient for CapturingAnalysis {
    async fn trigger_analysis(&self, request: AnalysisRequest) -> anyhow::Result<()> {
        self.requests.lock().unwrap().push(request);
        Ok(())
    }
}

pub struct StubRooms {
    pub fail: bool,
    pub created: Mutex<Vec<String>>,
}

impl StubRooms {
    pub fn working() -> Self {
        Self {
            fail: false,
            created: Mutex::new(Vec::new()),
        }
    }

    pub fn broken() -> Self {
        Self {
            fail: true,
            created: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl RoomProvisioner for StubRooms {
    async fn create_room(
        &self,
        room_name: &str,
        _metadata: JsonValue,
        _owner_tag: &str,
        _participant_name: &str,
    ) -> anyhow::Result<RoomGrant> {
        self.created.lock().unwrap().push(room_name.to_string());
        if self.fail {
            anyhow::bail!("video backend unavailable");
        }
        Ok(RoomGrant {
            room_name: room_name.to_string(),
            join_token: "join-token".to_string(),
            url: "https://livekit.example.com".to_string(),
        })
    }
}

#[derive(Default)]
pub struct CapturingAudit {
    pub events: Mutex<Vec<AuditEvent>>,
}

impl CapturingAudit {
    pub fn actions(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.action.clone())
            .collect()
    }
}

#[async_trait]
impl AuditSink for CapturingAudit {
    async fn record(&self, event: AuditEvent) -> anyhow::Result<()> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

pub struct AllowAllOwnership;

#[async_trait]
impl OwnershipGate for AllowAllOwnership {
    async fn verify_ownership(
        &self,
        _resource_id: Uuid,
        _acting_user_id: Uuid,
        _role: &str,
        _organization_id: Uuid,
    ) -> Result<()> {
        Ok(())
    }
}

pub struct DenyingOwnership;

#[async_trait]
impl OwnershipGate for DenyingOwnership {
    async fn verify_ownership(
        &self,
        _resource_id: Uuid,
        _acting_user_id: Uuid,
        _role: &str,
        _organization_id: Uuid,
    ) -> Result<()> {
        Err(Error::Forbidden(
            "You do not have access to this application".to_string(),
        ))
    }
}

mockall::mock! {
    pub Ownership {}

    #[async_trait]
    impl OwnershipGate for Ownership {
        async fn verify_ownership(
            &self,
            resource_id: Uuid,
            acting_user_id: Uuid,
            role: &str,
            organization_id: Uuid,
        ) -> Result<()>;
    }
}

pub struct Harness {
    pub store: MemoryStore,
    pub service: LifecycleService,
    pub notifier: Arc<CapturingNotifier>,
    pub messenger: Arc<CapturingMessenger>,
    pub analysis: Arc<CapturingAnalysis>,
    pub rooms: Arc<StubRooms>,
    pub audit: Arc<CapturingAudit>,
}

pub const CALLBACK_URL: &str = "https://api.example.com/callbacks/analysis";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn harness(store: MemoryStore) -> Harness {
    harness_with(store, Arc::new(AllowAllOwnership), StubRooms::working())
}

pub fn harness_with(
    store: MemoryStore,
    ownership: Arc<dyn OwnershipGate>,
    rooms: StubRooms,
) -> Harness {
    init_tracing();
    let notifier = Arc::new(CapturingNotifier::default());
    let messenger = Arc::new(CapturingMessenger::default());
    let analysis = Arc::new(CapturingAnalysis::default());
    let rooms = Arc::new(rooms);
    let audit = Arc::new(CapturingAudit::default());

    let service = LifecycleService::new(
        Arc::new(store.clone()),
        IdentityService::new(),
        SessionService::new("test_secret_key".to_string(), 24),
        ownership,
        Arc::clone(&notifier) as Arc<dyn NotificationSink>,
        Arc::clone(&messenger) as Arc<dyn MessagingChannel>,
        Arc::clone(&analysis) as Arc<dyn AnalysisClient>,
        Arc::clone(&rooms) as Arc<dyn RoomProvisioner>,
        Arc::clone(&audit) as Arc<dyn AuditSink>,
        Dispatcher::inline(),
        CALLBACK_URL.to_string(),
    );

    Harness {
        store,
        service,
        notifier,
        messenger,
        analysis,
        rooms,
        audit,
    }
}

pub fn job_for(organization_id: Uuid) -> Job {
    let now = Utc::now();
    Job {
        id: Uuid::new_v4(),
        organization_id,
        title: "Backend Engineer".to_string(),
        status: JobStatus::Active,
        deadline: Some(now + Duration::days(30)),
        applicant_count: 0,
        created_at: now,
        updated_at: now,
    }
}

pub fn user_with(email: &str, role: &str, organization_id: Option<Uuid>) -> User {
    let now = Utc::now();
    User {
        id: Uuid::new_v4(),
        email: email.to_string(),
        name: "Test User".to_string(),
        phone: Some("+962791234567".to_string()),
        password_hash: "$argon2id$test-hash".to_string(),
        role: role.to_string(),
        organization_id,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}
