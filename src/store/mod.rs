use async_trait::async_trait;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::error::Result;
use crate::models::application::{
    Application, ApplicationDetail, NewApplication, StageTimestamp,
};
use crate::models::job::Job;
use crate::models::note::{ApplicationNote, NewNote, NoteVisibility};
use crate::models::status::ApplicationStatus;
use crate::models::user::{
    CandidateProfile, NewEducation, NewProfile, NewUser, NewWorkExperience, ProfilePatch, User,
};

pub mod memory;
pub mod pg;

/// Transactional relational store behind the lifecycle engine. Plain methods
/// are single-statement reads/writes where staleness or lost races are
/// acceptable; everything consistency-critical goes through [`StoreTx`].
#[async_trait]
pub trait Store: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn StoreTx>>;

    async fn application_by_id(&self, id: Uuid) -> Result<Option<Application>>;
    async fn application_detail(&self, id: Uuid) -> Result<Option<ApplicationDetail>>;
    async fn applications_for_job(&self, job_id: Uuid) -> Result<Vec<Application>>;
    async fn applications_for_candidate(&self, candidate_id: Uuid) -> Result<Vec<Application>>;

    async fn job_by_id(&self, id: Uuid) -> Result<Option<Job>>;
    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>>;
    async fn staff_user_ids(&self, organization_id: Uuid) -> Result<Vec<Uuid>>;

    async fn note_by_id(&self, id: Uuid) -> Result<Option<ApplicationNote>>;
    async fn notes_for_application(&self, application_id: Uuid) -> Result<Vec<ApplicationNote>>;

    /// Appends one line to the application's operational notes. Used by the
    /// room-provisioning failure path, which runs after the status transition
    /// has already committed.
    async fn append_operational_note(&self, application_id: Uuid, line: &str) -> Result<()>;
}

/// One open transaction. Dropping without [`StoreTx::commit`] rolls back every
/// write made through it.
#[async_trait]
pub trait StoreTx: Send {
    async fn job_for_update(&mut self, id: Uuid) -> Result<Option<Job>>;
    async fn user_by_email(&mut self, email: &str) -> Result<Option<User>>;
    async fn user_by_id(&mut self, id: Uuid) -> Result<Option<User>>;
    async fn insert_user(&mut self, user: NewUser) -> Result<User>;
    async fn insert_profile(&mut self, profile: NewProfile) -> Result<CandidateProfile>;
    async fn profile_by_user(&mut self, user_id: Uuid) -> Result<Option<CandidateProfile>>;

    async fn application_exists(&mut self, job_id: Uuid, candidate_id: Uuid) -> Result<bool>;
    async fn insert_application(&mut self, application: NewApplication) -> Result<Application>;

    /// Row-locked read; the status a transition is validated against must be
    /// the one this returns, not an earlier snapshot.
    async fn application_for_update(&mut self, id: Uuid) -> Result<Option<Application>>;
    async fn update_application_status(
        &mut self,
        id: Uuid,
        status: ApplicationStatus,
        stage: Option<StageTimestamp>,
    ) -> Result<Application>;
    async fn set_application_analysis(
        &mut self,
        id: Uuid,
        score: f64,
        result: Option<JsonValue>,
        status: ApplicationStatus,
    ) -> Result<Application>;
    async fn delete_application(&mut self, id: Uuid) -> Result<bool>;

    /// `None` fields are left untouched.
    async fn update_user_contact(
        &mut self,
        user_id: Uuid,
        email: Option<&str>,
        name: Option<&str>,
        phone: Option<&str>,
    ) -> Result<()>;
    async fn update_profile(&mut self, profile_id: Uuid, patch: ProfilePatch) -> Result<()>;
    async fn replace_work_history(
        &mut self,
        profile_id: Uuid,
        work_experiences: Vec<NewWorkExperience>,
        educations: Vec<NewEducation>,
    ) -> Result<()>;

    async fn increment_applicant_count(&mut self, job_id: Uuid) -> Result<()>;

    async fn insert_note(&mut self, note: NewNote) -> Result<ApplicationNote>;
    async fn update_note(
        &mut self,
        id: Uuid,
        text: Option<&str>,
        visibility: Option<NoteVisibility>,
    ) -> Result<ApplicationNote>;
    async fn delete_note(&mut self, id: Uuid) -> Result<bool>;

    async fn commit(self: Box<Self>) -> Result<()>;
}
