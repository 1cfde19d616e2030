use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "job_status", rename_all = "UPPERCASE")]
pub enum JobStatus {
    Active,
    Paused,
    Closed,
    Expired,
    Deleted,
}

impl JobStatus {
    /// Postings in these states no longer accept applications.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, JobStatus::Closed | JobStatus::Expired | JobStatus::Deleted)
    }
}

/// Job postings are owned by the CRUD layer; this engine only reads them and
/// bumps the applicant counter inside the application transaction.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Job {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub title: String,
    pub status: JobStatus,
    pub deadline: Option<DateTime<Utc>>,
    pub applicant_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
