use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value as JsonValue;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::application::{
    Application, ApplicationDetail, NewApplication, StageTimestamp,
};
use crate::models::job::Job;
use crate::models::note::{ApplicationNote, NewNote, NoteVisibility};
use crate::models::status::ApplicationStatus;
use crate::models::user::{
    CandidateProfile, Education, NewEducation, NewProfile, NewUser, NewWorkExperience,
    ProfilePatch, User, WorkExperience,
};
use crate::services::identity_service::DUPLICATE_IDENTITY_MESSAGE;
use crate::store::{Store, StoreTx};

#[derive(Default, Clone)]
struct MemState {
    jobs: HashMap<Uuid, Job>,
    users: HashMap<Uuid, User>,
    profiles: HashMap<Uuid, CandidateProfile>,
    applications: HashMap<Uuid, Application>,
    notes: HashMap<Uuid, ApplicationNote>,
    work_experiences: HashMap<Uuid, WorkExperience>,
    educations: HashMap<Uuid, Education>,
}

/// In-process backend. Transactions take an owned lock on the whole state and
/// commit by swapping a staged copy back in, so writers serialize and every
/// `*_for_update` read observes the latest committed row — the same guarantee
/// the engine gets from row locking in Postgres. Backs the test-suite and
/// local development.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed_job(&self, job: Job) {
        self.state.lock().await.jobs.insert(job.id, job);
    }

    pub async fn seed_user(&self, user: User) {
        self.state.lock().await.users.insert(user.id, user);
    }

    pub async fn seed_profile(&self, profile: CandidateProfile) {
        self.state.lock().await.profiles.insert(profile.id, profile);
    }

    pub async fn application_count(&self) -> usize {
        self.state.lock().await.applications.len()
    }

    pub async fn user_count(&self) -> usize {
        self.state.lock().await.users.len()
    }

    pub async fn profile_count(&self) -> usize {
        self.state.lock().await.profiles.len()
    }

    pub async fn find_user_by_email(&self, email: &str) -> Option<User> {
        self.state
            .lock()
            .await
            .users
            .values()
            .find(|u| u.email == email)
            .cloned()
    }

    pub async fn profile_for_user(&self, user_id: Uuid) -> Option<CandidateProfile> {
        self.state
            .lock()
            .await
            .profiles
            .values()
            .find(|p| p.user_id == user_id)
            .cloned()
    }

    pub async fn work_experiences_for(&self, profile_id: Uuid) -> Vec<WorkExperience> {
        self.state
            .lock()
            .await
            .work_experiences
            .values()
            .filter(|w| w.profile_id == profile_id)
            .cloned()
            .collect()
    }

    pub async fn educations_for(&self, profile_id: Uuid) -> Vec<Education> {
        self.state
            .lock()
            .await
            .educations
            .values()
            .filter(|e| e.profile_id == profile_id)
            .cloned()
            .collect()
    }
}

pub struct MemoryTx {
    staged: MemState,
    guard: OwnedMutexGuard<MemState>,
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(MemoryTx { staged, guard }))
    }

    async fn application_by_id(&self, id: Uuid) -> Result<Option<Application>> {
        Ok(self.state.lock().await.applications.get(&id).cloned())
    }

    async fn application_detail(&self, id: Uuid) -> Result<Option<ApplicationDetail>> {
        let state = self.state.lock().await;
        let Some(application) = state.applications.get(&id).cloned() else {
            return Ok(None);
        };
        let job_title = state
            .jobs
            .get(&application.job_id)
            .map(|j| j.title.clone())
            .unwrap_or_default();
        let (candidate_name, candidate_email) = state
            .users
            .get(&application.candidate_id)
            .map(|u| (u.name.clone(), u.email.clone()))
            .unwrap_or_default();
        Ok(Some(ApplicationDetail {
            application,
            job_title,
            candidate_name,
            candidate_email,
        }))
    }

    async fn applications_for_job(&self, job_id: Uuid) -> Result<Vec<Application>> {
        let state = self.state.lock().await;
        let mut rows: Vec<Application> = state
            .applications
            .values()
            .filter(|a| a.job_id == job_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn applications_for_candidate(&self, candidate_id: Uuid) -> Result<Vec<Application>> {
        let state = self.state.lock().await;
        let mut rows: Vec<Application> = state
            .applications
            .values()
            .filter(|a| a.candidate_id == candidate_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn job_by_id(&self, id: Uuid) -> Result<Option<Job>> {
        Ok(self.state.lock().await.jobs.get(&id).cloned())
    }

    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.state.lock().await.users.get(&id).cloned())
    }

    async fn staff_user_ids(&self, organization_id: Uuid) -> Result<Vec<Uuid>> {
        let state = self.state.lock().await;
        let mut ids: Vec<Uuid> = state
            .users
            .values()
            .filter(|u| {
                u.organization_id == Some(organization_id)
                    && u.is_active
                    && matches!(u.role.as_str(), "hr" | "admin")
            })
            .map(|u| u.id)
            .collect();
        ids.sort();
        Ok(ids)
    }

    async fn note_by_id(&self, id: Uuid) -> Result<Option<ApplicationNote>> {
        Ok(self.state.lock().await.notes.get(&id).cloned())
    }

    async fn notes_for_application(&self, application_id: Uuid) -> Result<Vec<ApplicationNote>> {
        let state = self.state.lock().await;
        let mut rows: Vec<ApplicationNote> = state
            .notes
            .values()
            .filter(|n| n.application_id == application_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(rows)
    }

    async fn append_operational_note(&self, application_id: Uuid, line: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        let application = state.applications.get_mut(&application_id).ok_or_else(|| {
            Error::NotFound(format!("Application {} not found", application_id))
        })?;
        match &mut application.notes {
            Some(notes) if !notes.is_empty() => {
                notes.push('\n');
                notes.push_str(line);
            }
            _ => application.notes = Some(line.to_string()),
        }
        application.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn job_for_update(&mut self, id: Uuid) -> Result<Option<Job>> {
        Ok(self.staged.jobs.get(&id).cloned())
    }

    async fn user_by_email(&mut self, email: &str) -> Result<Option<User>> {
        Ok(self
            .staged
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn user_by_id(&mut self, id: Uuid) -> Result<Option<User>> {
        Ok(self.staged.users.get(&id).cloned())
    }

    async fn insert_user(&mut self, user: NewUser) -> Result<User> {
        if self.staged.users.values().any(|u| u.email == user.email) {
            return Err(Error::Conflict(DUPLICATE_IDENTITY_MESSAGE.to_string()));
        }
        let now = Utc::now();
        let row = User {
            id: Uuid::new_v4(),
            email: user.email,
            name: user.name,
            phone: user.phone,
            password_hash: user.password_hash,
            role: user.role,
            organization_id: user.organization_id,
            is_active: user.is_active,
            created_at: now,
            updated_at: now,
        };
        self.staged.users.insert(row.id, row.clone());
        Ok(row)
    }

    async fn insert_profile(&mut self, profile: NewProfile) -> Result<CandidateProfile> {
        let now = Utc::now();
        let row = CandidateProfile {
            id: Uuid::new_v4(),
            user_id: profile.user_id,
            resume_url: profile.resume_url,
            summary: None,
            skills: Vec::new(),
            linkedin_url: profile.linkedin_url,
            portfolio_url: None,
            created_at: now,
            updated_at: now,
        };
        self.staged.profiles.insert(row.id, row.clone());
        Ok(row)
    }

    async fn profile_by_user(&mut self, user_id: Uuid) -> Result<Option<CandidateProfile>> {
        Ok(self
            .staged
            .profiles
            .values()
            .find(|p| p.user_id == user_id)
            .cloned())
    }

    async fn application_exists(&mut self, job_id: Uuid, candidate_id: Uuid) -> Result<bool> {
        Ok(self
            .staged
            .applications
            .values()
            .any(|a| a.job_id == job_id && a.candidate_id == candidate_id))
    }

    async fn insert_application(&mut self, application: NewApplication) -> Result<Application> {
        if self
            .staged
            .applications
            .values()
            .any(|a| a.job_id == application.job_id && a.candidate_id == application.candidate_id)
        {
            return Err(Error::Conflict(
                "You have already applied for this job".to_string(),
            ));
        }
        let now = Utc::now();
        let row = Application {
            id: Uuid::new_v4(),
            job_id: application.job_id,
            candidate_id: application.candidate_id,
            status: ApplicationStatus::Pending,
            applicant_name: application.applicant_name,
            applicant_email: application.applicant_email,
            applicant_phone: application.applicant_phone,
            applicant_linkedin: application.applicant_linkedin,
            cover_letter: application.cover_letter,
            resume_url: application.resume_url,
            expected_salary: application.expected_salary,
            notice_period: application.notice_period,
            reviewed_at: None,
            interviewed_at: None,
            rejected_at: None,
            accepted_at: None,
            analysis_score: None,
            analysis_result: None,
            notes: None,
            created_at: now,
            updated_at: now,
        };
        self.staged.applications.insert(row.id, row.clone());
        Ok(row)
    }

    async fn application_for_update(&mut self, id: Uuid) -> Result<Option<Application>> {
        Ok(self.staged.applications.get(&id).cloned())
    }

    async fn update_application_status(
        &mut self,
        id: Uuid,
        status: ApplicationStatus,
        stage: Option<StageTimestamp>,
    ) -> Result<Application> {
        let now = Utc::now();
        let application = self
            .staged
            .applications
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("Application {} not found", id)))?;
        application.status = status;
        match stage {
            Some(StageTimestamp::Reviewed) => application.reviewed_at = Some(now),
            Some(StageTimestamp::Interviewed) => application.interviewed_at = Some(now),
            Some(StageTimestamp::Rejected) => application.rejected_at = Some(now),
            Some(StageTimestamp::Accepted) => application.accepted_at = Some(now),
            None => {}
        }
        application.updated_at = now;
        Ok(application.clone())
    }

    async fn set_application_analysis(
        &mut self,
        id: Uuid,
        score: f64,
        result: Option<JsonValue>,
        status: ApplicationStatus,
    ) -> Result<Application> {
        let application = self
            .staged
            .applications
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("Application {} not found", id)))?;
        application.analysis_score = Some(score);
        application.analysis_result = result;
        application.status = status;
        application.updated_at = Utc::now();
        Ok(application.clone())
    }

    async fn delete_application(&mut self, id: Uuid) -> Result<bool> {
        let removed = self.staged.applications.remove(&id).is_some();
        if removed {
            self.staged.notes.retain(|_, n| n.application_id != id);
        }
        Ok(removed)
    }

    async fn update_user_contact(
        &mut self,
        user_id: Uuid,
        email: Option<&str>,
        name: Option<&str>,
        phone: Option<&str>,
    ) -> Result<()> {
        let user = self
            .staged
            .users
            .get_mut(&user_id)
            .ok_or_else(|| Error::NotFound(format!("User {} not found", user_id)))?;
        if let Some(email) = email {
            user.email = email.to_string();
        }
        if let Some(name) = name {
            user.name = name.to_string();
        }
        if let Some(phone) = phone {
            user.phone = Some(phone.to_string());
        }
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn update_profile(&mut self, profile_id: Uuid, patch: ProfilePatch) -> Result<()> {
        let profile = self
            .staged
            .profiles
            .get_mut(&profile_id)
            .ok_or_else(|| Error::NotFound(format!("Profile {} not found", profile_id)))?;
        if let Some(resume_url) = patch.resume_url {
            profile.resume_url = Some(resume_url);
        }
        if let Some(summary) = patch.summary {
            profile.summary = Some(summary);
        }
        if let Some(skills) = patch.skills {
            profile.skills = skills;
        }
        if let Some(linkedin_url) = patch.linkedin_url {
            profile.linkedin_url = Some(linkedin_url);
        }
        if let Some(portfolio_url) = patch.portfolio_url {
            profile.portfolio_url = Some(portfolio_url);
        }
        profile.updated_at = Utc::now();
        Ok(())
    }

    async fn replace_work_history(
        &mut self,
        profile_id: Uuid,
        work_experiences: Vec<NewWorkExperience>,
        educations: Vec<NewEducation>,
    ) -> Result<()> {
        self.staged
            .work_experiences
            .retain(|_, w| w.profile_id != profile_id);
        self.staged.educations.retain(|_, e| e.profile_id != profile_id);
        for w in work_experiences {
            let row = WorkExperience {
                id: Uuid::new_v4(),
                profile_id,
                company: w.company,
                title: w.title,
                start_date: w.start_date,
                end_date: w.end_date,
                description: w.description,
            };
            self.staged.work_experiences.insert(row.id, row);
        }
        for e in educations {
            let row = Education {
                id: Uuid::new_v4(),
                profile_id,
                institution: e.institution,
                degree: e.degree,
                field_of_study: e.field_of_study,
                start_date: e.start_date,
                end_date: e.end_date,
            };
            self.staged.educations.insert(row.id, row);
        }
        Ok(())
    }

    async fn increment_applicant_count(&mut self, job_id: Uuid) -> Result<()> {
        let job = self
            .staged
            .jobs
            .get_mut(&job_id)
            .ok_or_else(|| Error::NotFound(format!("Job {} not found", job_id)))?;
        job.applicant_count += 1;
        job.updated_at = Utc::now();
        Ok(())
    }

    async fn insert_note(&mut self, note: NewNote) -> Result<ApplicationNote> {
        let now = Utc::now();
        let row = ApplicationNote {
            id: Uuid::new_v4(),
            application_id: note.application_id,
            author_id: note.author_id,
            text: note.text,
            visibility: note.visibility,
            created_at: now,
            updated_at: now,
        };
        self.staged.notes.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_note(
        &mut self,
        id: Uuid,
        text: Option<&str>,
        visibility: Option<NoteVisibility>,
    ) -> Result<ApplicationNote> {
        let note = self
            .staged
            .notes
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("Note {} not found", id)))?;
        if let Some(text) = text {
            note.text = text.to_string();
        }
        if let Some(visibility) = visibility {
            note.visibility = visibility;
        }
        note.updated_at = Utc::now();
        Ok(note.clone())
    }

    async fn delete_note(&mut self, id: Uuid) -> Result<bool> {
        Ok(self.staged.notes.remove(&id).is_some())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let mut guard = self.guard;
        *guard = self.staged;
        Ok(())
    }
}
