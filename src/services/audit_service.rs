use async_trait::async_trait;
use sqlx::PgPool;

use crate::models::audit::AuditEvent;

/// Where lifecycle operations report what happened. Passed into the engine at
/// construction; recording runs post-commit and a sink failure never fails
/// the operation that produced the event.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, event: AuditEvent) -> anyhow::Result<()>;
}

#[derive(Clone)]
pub struct PgAuditService {
    pool: PgPool,
}

impl PgAuditService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditSink for PgAuditService {
    async fn record(&self, event: AuditEvent) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO audit_logs (actor_id, action, entity_type, entity_id, changes)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(event.actor_id)
        .bind(&event.action)
        .bind(&event.entity_type)
        .bind(event.entity_id)
        .bind(&event.changes)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

/// Sink that only writes to the log stream. Useful where no database is
/// wired up, e.g. local tooling.
#[derive(Clone, Default)]
pub struct TracingAuditService;

#[async_trait]
impl AuditSink for TracingAuditService {
    async fn record(&self, event: AuditEvent) -> anyhow::Result<()> {
        tracing::info!(
            actor = ?event.actor_id,
            action = %event.action,
            entity_type = %event.entity_type,
            entity_id = %event.entity_id,
            "audit event"
        );
        Ok(())
    }
}
