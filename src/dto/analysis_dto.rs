use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;
use validator::Validate;

/// Inbound payload from the CV analysis service. Every extracted attribute is
/// an explicit optional field; the free-form result blob is stored opaquely on
/// the application but never applied to the identity or profile.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AnalysisCallback {
    pub application_id: Uuid,
    #[validate(range(min = 0.0, max = 100.0))]
    pub score: f64,
    pub result: Option<JsonValue>,
    #[validate(nested)]
    pub extracted: Option<ExtractedCandidateInfo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ExtractedCandidateInfo {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
    #[validate(length(max = 5000))]
    pub summary: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[validate(url)]
    pub linkedin_url: Option<String>,
    #[validate(url)]
    pub portfolio_url: Option<String>,
    #[validate(url)]
    pub resume_url: Option<String>,
    #[serde(default)]
    pub work_experiences: Vec<ExtractedWorkExperience>,
    #[serde(default)]
    pub educations: Vec<ExtractedEducation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedWorkExperience {
    pub company: String,
    pub title: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedEducation {
    pub institution: String,
    pub degree: Option<String>,
    pub field_of_study: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}
