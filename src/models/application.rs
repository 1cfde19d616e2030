use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::status::ApplicationStatus;

/// One candidate's submission against one job posting. The applicant_* fields
/// are the snapshot captured at submission time; they never change even when
/// CV analysis later rewrites the candidate's profile.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Application {
    pub id: Uuid,
    pub job_id: Uuid,
    pub candidate_id: Uuid,
    pub status: ApplicationStatus,
    pub applicant_name: String,
    pub applicant_email: Option<String>,
    pub applicant_phone: Option<String>,
    pub applicant_linkedin: Option<String>,
    pub cover_letter: Option<String>,
    pub resume_url: Option<String>,
    pub expected_salary: Option<Decimal>,
    pub notice_period: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub interviewed_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub analysis_score: Option<f64>,
    pub analysis_result: Option<JsonValue>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload; status always starts at PENDING.
#[derive(Debug, Clone)]
pub struct NewApplication {
    pub job_id: Uuid,
    pub candidate_id: Uuid,
    pub applicant_name: String,
    pub applicant_email: Option<String>,
    pub applicant_phone: Option<String>,
    pub applicant_linkedin: Option<String>,
    pub cover_letter: Option<String>,
    pub resume_url: Option<String>,
    pub expected_salary: Option<Decimal>,
    pub notice_period: Option<String>,
}

/// Which per-stage timestamp a committed transition stamps, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageTimestamp {
    Reviewed,
    Interviewed,
    Rejected,
    Accepted,
}

impl StageTimestamp {
    pub fn for_target(status: ApplicationStatus) -> Option<StageTimestamp> {
        match status {
            ApplicationStatus::Reviewed => Some(StageTimestamp::Reviewed),
            ApplicationStatus::Interviewed => Some(StageTimestamp::Interviewed),
            ApplicationStatus::Rejected => Some(StageTimestamp::Rejected),
            ApplicationStatus::Hired => Some(StageTimestamp::Accepted),
            _ => None,
        }
    }
}

/// Post-commit read joining the rows the dashboard renders alongside an
/// application. Staleness is acceptable here; consistency-critical reads go
/// through the transaction instead.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationDetail {
    pub application: Application,
    pub job_title: String,
    pub candidate_name: String,
    pub candidate_email: String,
}
