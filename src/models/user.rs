use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub organization_id: Option<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Roles allowed to act on applications that belong to someone else.
pub fn is_elevated_role(role: &str) -> bool {
    ["hr", "admin", "system"]
        .iter()
        .any(|r| r.eq_ignore_ascii_case(role))
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub password_hash: String,
    pub role: String,
    pub organization_id: Option<Uuid>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CandidateProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub resume_url: Option<String>,
    pub summary: Option<String>,
    pub skills: Vec<String>,
    pub linkedin_url: Option<String>,
    pub portfolio_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewProfile {
    pub user_id: Uuid,
    pub resume_url: Option<String>,
    pub linkedin_url: Option<String>,
}

/// Partial update applied by the analysis callback. Absent fields are left
/// untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfilePatch {
    pub resume_url: Option<String>,
    pub summary: Option<String>,
    pub skills: Option<Vec<String>>,
    pub linkedin_url: Option<String>,
    pub portfolio_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WorkExperience {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub company: String,
    pub title: String,
    pub start_date: Option<chrono::NaiveDate>,
    pub end_date: Option<chrono::NaiveDate>,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewWorkExperience {
    pub company: String,
    pub title: String,
    pub start_date: Option<chrono::NaiveDate>,
    pub end_date: Option<chrono::NaiveDate>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Education {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub institution: String,
    pub degree: Option<String>,
    pub field_of_study: Option<String>,
    pub start_date: Option<chrono::NaiveDate>,
    pub end_date: Option<chrono::NaiveDate>,
}

#[derive(Debug, Clone)]
pub struct NewEducation {
    pub institution: String,
    pub degree: Option<String>,
    pub field_of_study: Option<String>,
    pub start_date: Option<chrono::NaiveDate>,
    pub end_date: Option<chrono::NaiveDate>,
}
