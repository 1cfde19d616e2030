use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::application::ApplicationDetail;
use crate::models::note::NoteVisibility;

/// Authenticated submission. When `candidate_id` is absent the acting user is
/// the candidate; submitting for someone else requires an elevated role.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateApplicationInput {
    pub job_id: Uuid,
    pub candidate_id: Option<Uuid>,
    #[validate(length(max = 10000))]
    pub cover_letter: Option<String>,
    #[validate(url)]
    pub resume_url: Option<String>,
    pub expected_salary: Option<Decimal>,
    #[validate(length(max = 100))]
    pub notice_period: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub applicant_name: Option<String>,
    #[validate(email)]
    pub applicant_email: Option<String>,
    pub applicant_phone: Option<String>,
    #[validate(url)]
    pub applicant_linkedin: Option<String>,
}

/// Application from someone with no account yet. Email and phone are each
/// optional; whichever is present must be well formed.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AnonymousApplicationInput {
    pub job_id: Uuid,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
    #[validate(url)]
    pub linkedin: Option<String>,
    #[validate(length(max = 10000))]
    pub cover_letter: Option<String>,
    #[validate(url)]
    pub resume_url: Option<String>,
    pub expected_salary: Option<Decimal>,
    #[validate(length(max = 100))]
    pub notice_period: Option<String>,
}

/// What the anonymous applicant gets back: the stored application plus the
/// one-time credentials for the account that was provisioned inline.
#[derive(Debug, Clone, Serialize)]
pub struct AnonymousApplicationResponse {
    pub application: ApplicationDetail,
    pub email: String,
    pub password: String,
    pub access_token: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateNoteInput {
    pub application_id: Uuid,
    #[validate(length(min = 1, max = 5000))]
    pub text: String,
    pub visibility: NoteVisibility,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateNoteInput {
    #[validate(length(min = 1, max = 5000))]
    pub text: Option<String>,
    pub visibility: Option<NoteVisibility>,
}
