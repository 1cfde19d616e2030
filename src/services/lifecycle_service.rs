use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::dto::analysis_dto::AnalysisCallback;
use crate::dto::application_dto::{
    AnonymousApplicationInput, AnonymousApplicationResponse, CreateApplicationInput,
    CreateNoteInput, UpdateNoteInput,
};
use crate::error::{Error, Result};
use crate::models::application::{
    Application, ApplicationDetail, NewApplication, StageTimestamp,
};
use crate::models::audit::AuditEvent;
use crate::models::note::ApplicationNote;
use crate::models::status::{validate_transition, ApplicationStatus};
use crate::models::user::is_elevated_role;
use crate::services::analysis_service::{AnalysisClient, AnalysisRequest};
use crate::services::audit_service::AuditSink;
use crate::services::dispatcher::Dispatcher;
use crate::services::identity_service::{
    IdentityService, ProvisionRequest, DUPLICATE_IDENTITY_MESSAGE,
};
use crate::services::messaging_service::MessagingChannel;
use crate::services::notification_service::NotificationSink;
use crate::services::ownership_service::OwnershipGate;
use crate::services::room_service::RoomProvisioner;
use crate::services::session_service::SessionService;
use crate::store::Store;
use crate::utils::{time, validation};

/// The application lifecycle engine. Owns the transaction boundary of every
/// mutating operation; everything that talks to the outside world runs after
/// commit through the dispatcher and can never corrupt committed state.
#[derive(Clone)]
pub struct LifecycleService {
    store: Arc<dyn Store>,
    identity_service: IdentityService,
    session_service: SessionService,
    ownership: Arc<dyn OwnershipGate>,
    notifier: Arc<dyn NotificationSink>,
    messenger: Arc<dyn MessagingChannel>,
    analysis: Arc<dyn AnalysisClient>,
    rooms: Arc<dyn RoomProvisioner>,
    audit: Arc<dyn AuditSink>,
    dispatcher: Dispatcher,
    analysis_callback_url: String,
}

impl LifecycleService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<dyn Store>,
        identity_service: IdentityService,
        session_service: SessionService,
        ownership: Arc<dyn OwnershipGate>,
        notifier: Arc<dyn NotificationSink>,
        messenger: Arc<dyn MessagingChannel>,
        analysis: Arc<dyn AnalysisClient>,
        rooms: Arc<dyn RoomProvisioner>,
        audit: Arc<dyn AuditSink>,
        dispatcher: Dispatcher,
        analysis_callback_url: String,
    ) -> Self {
        Self {
            store,
            identity_service,
            session_service,
            ownership,
            notifier,
            messenger,
            analysis,
            rooms,
            audit,
            dispatcher,
            analysis_callback_url,
        }
    }

    /// Authenticated submission. Staff may submit on behalf of a candidate;
    /// anyone else only for themselves.
    pub async fn create(
        &self,
        input: CreateApplicationInput,
        acting_user: Option<Uuid>,
    ) -> Result<Application> {
        input.validate()?;
        let candidate_id = input
            .candidate_id
            .or(acting_user)
            .ok_or_else(|| Error::Validation("A candidate must be specified".to_string()))?;
        let phone = input
            .applicant_phone
            .as_deref()
            .map(validation::normalize_phone)
            .transpose()?;

        let mut tx = self.store.begin().await?;

        if let Some(actor) = acting_user {
            if actor != candidate_id {
                let actor_row = tx
                    .user_by_id(actor)
                    .await?
                    .ok_or_else(|| Error::NotFound(format!("User {} not found", actor)))?;
                if !is_elevated_role(&actor_row.role) {
                    return Err(Error::Forbidden(
                        "Only organization staff may submit an application for another user"
                            .to_string(),
                    ));
                }
            }
        }

        let job = tx
            .job_for_update(input.job_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Job {} not found", input.job_id)))?;
        let candidate = tx
            .user_by_id(candidate_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("User {} not found", candidate_id)))?;
        if tx.application_exists(job.id, candidate_id).await? {
            return Err(Error::Conflict(
                "You have already applied for this job".to_string(),
            ));
        }

        let application = tx
            .insert_application(NewApplication {
                job_id: job.id,
                candidate_id,
                applicant_name: input
                    .applicant_name
                    .unwrap_or_else(|| candidate.name.clone()),
                applicant_email: input
                    .applicant_email
                    .or_else(|| Some(candidate.email.clone())),
                applicant_phone: phone.or_else(|| candidate.phone.clone()),
                applicant_linkedin: input.applicant_linkedin,
                cover_letter: input.cover_letter,
                resume_url: input.resume_url,
                expected_salary: input.expected_salary,
                notice_period: input.notice_period,
            })
            .await?;
        tx.increment_applicant_count(job.id).await?;
        tx.commit().await?;

        tracing::info!(application_id = %application.id, job_id = %job.id, "application created");
        self.record_audit(
            AuditEvent::application(acting_user, "application.created", application.id)
                .with_changes(json!({ "job_id": job.id, "candidate_id": candidate_id })),
        )
        .await;
        self.notify_staff(job.organization_id, &job.title, &application)
            .await;
        if application.resume_url.is_some() {
            self.trigger_analysis(&application).await;
        }
        Ok(application)
    }

    /// Submission from someone with no account. Job validity, duplicate-email
    /// guard, identity provisioning, the application row, and the applicant
    /// counter all commit or roll back as one unit; nothing external happens
    /// before the commit.
    pub async fn create_anonymous(
        &self,
        input: AnonymousApplicationInput,
    ) -> Result<AnonymousApplicationResponse> {
        input.validate()?;
        let phone = input
            .phone
            .as_deref()
            .map(validation::normalize_phone)
            .transpose()?;

        let mut tx = self.store.begin().await?;

        let job = tx
            .job_for_update(input.job_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Job {} not found", input.job_id)))?;
        if job.status.is_unavailable() {
            return Err(Error::Conflict(
                "This job is no longer accepting applications".to_string(),
            ));
        }
        if let Some(deadline) = job.deadline {
            if time::now() > deadline {
                return Err(Error::Conflict(
                    "The application deadline for this job has passed".to_string(),
                ));
            }
        }

        if let Some(email) = input.email.as_deref() {
            if tx.user_by_email(email).await?.is_some() {
                return Err(Error::Conflict(DUPLICATE_IDENTITY_MESSAGE.to_string()));
            }
        }

        let provisioned = self
            .identity_service
            .provision(
                &mut *tx,
                ProvisionRequest {
                    name: &input.name,
                    email: input.email.as_deref(),
                    phone: phone.as_deref(),
                    linkedin: input.linkedin.as_deref(),
                    resume_url: input.resume_url.as_deref(),
                },
            )
            .await?;

        // Snapshot exactly what the applicant supplied; the profile may be
        // rewritten later by CV analysis, the snapshot may not.
        let application = tx
            .insert_application(NewApplication {
                job_id: job.id,
                candidate_id: provisioned.user.id,
                applicant_name: input.name.clone(),
                applicant_email: input.email.clone(),
                applicant_phone: phone.clone(),
                applicant_linkedin: input.linkedin.clone(),
                cover_letter: input.cover_letter,
                resume_url: input.resume_url,
                expected_salary: input.expected_salary,
                notice_period: input.notice_period,
            })
            .await?;
        tx.increment_applicant_count(job.id).await?;
        tx.commit().await?;

        tracing::info!(
            application_id = %application.id,
            candidate_id = %provisioned.user.id,
            "anonymous application created"
        );
        let access_token = self
            .session_service
            .issue_token(provisioned.user.id, &provisioned.user.role)?;

        self.record_audit(
            AuditEvent::application(None, "application.created_anonymous", application.id)
                .with_changes(json!({
                    "job_id": job.id,
                    "candidate_id": provisioned.user.id,
                })),
        )
        .await;
        if application.resume_url.is_some() {
            self.trigger_analysis(&application).await;
        }
        if validation::is_usable_phone(provisioned.user.phone.as_deref()) {
            let messenger = Arc::clone(&self.messenger);
            let phone = provisioned.user.phone.clone().unwrap_or_default();
            let email = provisioned.user.email.clone();
            let password = provisioned.password.clone();
            self.dispatcher
                .dispatch("send_credentials", async move {
                    messenger
                        .send_templated_message(
                            &phone,
                            "account_credentials",
                            json!({ "email": email, "password": password }),
                        )
                        .await
                })
                .await;
        }
        self.notify_staff(job.organization_id, &job.title, &application)
            .await;

        let detail = self
            .store
            .application_detail(application.id)
            .await?
            .ok_or_else(|| Error::Internal("Application missing after commit".to_string()))?;
        Ok(AnonymousApplicationResponse {
            application: detail,
            email: provisioned.user.email,
            password: provisioned.password,
            access_token,
        })
    }

    /// Staff-initiated transition. The current status is re-read under a row
    /// lock in the same transaction that writes, so a concurrent update turns
    /// into a rejected transition instead of a lost one.
    pub async fn update_status(
        &self,
        application_id: Uuid,
        new_status: ApplicationStatus,
        acting_user: Option<Uuid>,
    ) -> Result<Application> {
        let current = self
            .store
            .application_by_id(application_id)
            .await?
            .ok_or_else(|| {
                Error::NotFound(format!("Application {} not found", application_id))
            })?;
        if let Some(actor) = acting_user {
            self.check_ownership(&current, actor).await?;
        }

        let mut tx = self.store.begin().await?;
        let application = tx
            .application_for_update(application_id)
            .await?
            .ok_or_else(|| {
                Error::NotFound(format!("Application {} not found", application_id))
            })?;

        if application.status == new_status {
            // Same-status request is a no-op update: no stage timestamp, no
            // notification.
            drop(tx);
            return Ok(application);
        }

        validate_transition(application.status, new_status)?;
        let previous = application.status;
        let updated = tx
            .update_application_status(
                application_id,
                new_status,
                StageTimestamp::for_target(new_status),
            )
            .await?;
        tx.commit().await?;

        tracing::info!(
            application_id = %application_id,
            from = %previous,
            to = %new_status,
            "application status changed"
        );
        self.record_audit(
            AuditEvent::application(acting_user, "application.status_changed", application_id)
                .with_changes(json!({ "from": previous, "to": new_status })),
        )
        .await;
        self.dispatch_status_effects(&updated).await;
        Ok(updated)
    }

    /// Inbound result from the CV analysis pipeline. Forces ANALYZED without
    /// consulting the transition table — the external system is asserting
    /// completion, not requesting a move — but never overwrites a terminal
    /// decision.
    pub async fn update_analysis(&self, callback: AnalysisCallback) -> Result<Application> {
        callback.validate()?;

        let mut tx = self.store.begin().await?;
        let application = tx
            .application_for_update(callback.application_id)
            .await?
            .ok_or_else(|| {
                Error::NotFound(format!("Application {} not found", callback.application_id))
            })?;
        if application.status.is_terminal() {
            return Err(Error::InvalidTransition {
                from: application.status,
                to: ApplicationStatus::Analyzed,
            });
        }

        let updated = tx
            .set_application_analysis(
                application.id,
                callback.score,
                callback.result.clone(),
                ApplicationStatus::Analyzed,
            )
            .await?;

        let mut enriched_contact: Option<(Option<String>, String)> = None;
        if let Some(extracted) = &callback.extracted {
            let user = tx
                .user_by_id(application.candidate_id)
                .await?
                .ok_or_else(|| {
                    Error::NotFound(format!("User {} not found", application.candidate_id))
                })?;

            // A malformed extracted phone is dropped; the scores must still
            // land.
            let extracted_phone = extracted.phone.as_deref().and_then(|raw| {
                match validation::normalize_phone(raw) {
                    Ok(normalized) => Some(normalized),
                    Err(_) => {
                        tracing::warn!(
                            application_id = %application.id,
                            "discarding malformed extracted phone"
                        );
                        None
                    }
                }
            });

            let email_update = if validation::is_placeholder_email(&user.email) {
                extracted.email.as_deref()
            } else {
                None
            };
            let name_update = if validation::is_placeholder_email(&user.email) {
                extracted.name.as_deref()
            } else {
                None
            };
            let phone_update = match user.phone.as_deref() {
                Some(stored) if !validation::is_placeholder_phone(stored) => None,
                _ => extracted_phone.as_deref(),
            };
            if email_update.is_some() || name_update.is_some() || phone_update.is_some() {
                tx.update_user_contact(user.id, email_update, name_update, phone_update)
                    .await?;
            }

            let profile = match tx.profile_by_user(user.id).await? {
                Some(profile) => profile,
                None => {
                    tx.insert_profile(crate::models::user::NewProfile {
                        user_id: user.id,
                        resume_url: extracted.resume_url.clone(),
                        linkedin_url: extracted.linkedin_url.clone(),
                    })
                    .await?
                }
            };
            tx.update_profile(
                profile.id,
                crate::models::user::ProfilePatch {
                    resume_url: extracted.resume_url.clone(),
                    summary: extracted.summary.clone(),
                    skills: (!extracted.skills.is_empty()).then(|| extracted.skills.clone()),
                    linkedin_url: extracted.linkedin_url.clone(),
                    portfolio_url: extracted.portfolio_url.clone(),
                },
            )
            .await?;

            if !extracted.work_experiences.is_empty() || !extracted.educations.is_empty() {
                let work = extracted
                    .work_experiences
                    .iter()
                    .map(|w| crate::models::user::NewWorkExperience {
                        company: w.company.clone(),
                        title: w.title.clone(),
                        start_date: w.start_date,
                        end_date: w.end_date,
                        description: w.description.clone(),
                    })
                    .collect();
                let education = extracted
                    .educations
                    .iter()
                    .map(|e| crate::models::user::NewEducation {
                        institution: e.institution.clone(),
                        degree: e.degree.clone(),
                        field_of_study: e.field_of_study.clone(),
                        start_date: e.start_date,
                        end_date: e.end_date,
                    })
                    .collect();
                tx.replace_work_history(profile.id, work, education).await?;
            }

            let fresh = tx
                .user_by_id(user.id)
                .await?
                .ok_or_else(|| Error::NotFound(format!("User {} not found", user.id)))?;
            enriched_contact = Some((fresh.phone.clone(), fresh.email.clone()));
        }
        tx.commit().await?;

        tracing::info!(
            application_id = %updated.id,
            score = callback.score,
            "analysis result recorded"
        );
        self.record_audit(
            AuditEvent::application(None, "application.analysis_recorded", updated.id)
                .with_changes(json!({ "score": callback.score })),
        )
        .await;

        if let Some((phone, email)) = enriched_contact {
            if validation::is_usable_phone(phone.as_deref())
                && !validation::is_placeholder_email(&email)
            {
                let messenger = Arc::clone(&self.messenger);
                let phone = phone.unwrap_or_default();
                self.dispatcher
                    .dispatch("notify_profile_completed", async move {
                        messenger
                            .send_templated_message(
                                &phone,
                                "profile_completed",
                                json!({ "email": email }),
                            )
                            .await
                    })
                    .await;
            }
        }
        Ok(updated)
    }

    /// Hard delete, ownership-gated. Returns whether a row was removed and
    /// audits only when one was.
    pub async fn remove(&self, application_id: Uuid, acting_user: Option<Uuid>) -> Result<bool> {
        let Some(application) = self.store.application_by_id(application_id).await? else {
            return Ok(false);
        };
        if let Some(actor) = acting_user {
            self.check_ownership(&application, actor).await?;
        }

        let mut tx = self.store.begin().await?;
        let removed = tx.delete_application(application_id).await?;
        tx.commit().await?;

        if removed {
            tracing::info!(application_id = %application_id, "application removed");
            self.record_audit(AuditEvent::application(
                acting_user,
                "application.removed",
                application_id,
            ))
            .await;
        }
        Ok(removed)
    }

    pub async fn get_application(&self, application_id: Uuid) -> Result<Application> {
        self.store
            .application_by_id(application_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Application {} not found", application_id)))
    }

    pub async fn application_detail(&self, application_id: Uuid) -> Result<ApplicationDetail> {
        self.store
            .application_detail(application_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Application {} not found", application_id)))
    }

    pub async fn applications_for_job(&self, job_id: Uuid) -> Result<Vec<Application>> {
        self.store.applications_for_job(job_id).await
    }

    pub async fn applications_for_candidate(&self, candidate_id: Uuid) -> Result<Vec<Application>> {
        self.store.applications_for_candidate(candidate_id).await
    }

    pub async fn notes_for_application(
        &self,
        application_id: Uuid,
    ) -> Result<Vec<ApplicationNote>> {
        self.store.notes_for_application(application_id).await
    }

    pub async fn add_note(&self, input: CreateNoteInput, author: Uuid) -> Result<ApplicationNote> {
        input.validate()?;
        let application = self.get_application(input.application_id).await?;
        self.check_ownership(&application, author).await?;

        let mut tx = self.store.begin().await?;
        let note = tx
            .insert_note(crate::models::note::NewNote {
                application_id: application.id,
                author_id: author,
                text: input.text,
                visibility: input.visibility,
            })
            .await?;
        tx.commit().await?;
        Ok(note)
    }

    pub async fn update_note(
        &self,
        note_id: Uuid,
        input: UpdateNoteInput,
        acting_user: Uuid,
    ) -> Result<ApplicationNote> {
        input.validate()?;
        let note = self
            .store
            .note_by_id(note_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Note {} not found", note_id)))?;
        if note.author_id != acting_user {
            let application = self.get_application(note.application_id).await?;
            self.check_ownership(&application, acting_user).await?;
        }

        let mut tx = self.store.begin().await?;
        let updated = tx
            .update_note(note_id, input.text.as_deref(), input.visibility)
            .await?;
        tx.commit().await?;
        Ok(updated)
    }

    pub async fn delete_note(&self, note_id: Uuid, acting_user: Uuid) -> Result<bool> {
        let Some(note) = self.store.note_by_id(note_id).await? else {
            return Ok(false);
        };
        if note.author_id != acting_user {
            let application = self.get_application(note.application_id).await?;
            self.check_ownership(&application, acting_user).await?;
        }

        let mut tx = self.store.begin().await?;
        let removed = tx.delete_note(note_id).await?;
        tx.commit().await?;
        Ok(removed)
    }

    async fn check_ownership(&self, application: &Application, actor: Uuid) -> Result<()> {
        let job = self
            .store
            .job_by_id(application.job_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Job {} not found", application.job_id)))?;
        self.ownership
            .verify_ownership(application.id, actor, "staff", job.organization_id)
            .await
    }

    async fn record_audit(&self, event: AuditEvent) {
        let audit = Arc::clone(&self.audit);
        self.dispatcher
            .dispatch("record_audit", async move { audit.record(event).await })
            .await;
    }

    async fn notify_staff(
        &self,
        organization_id: Uuid,
        job_title: &str,
        application: &Application,
    ) {
        let store = Arc::clone(&self.store);
        let notifier = Arc::clone(&self.notifier);
        let job_title = job_title.to_string();
        let applicant = application.applicant_name.clone();
        let application_id = application.id;
        self.dispatcher
            .dispatch("notify_staff", async move {
                let staff = store.staff_user_ids(organization_id).await?;
                for user_id in staff {
                    notifier
                        .notify(
                            user_id,
                            "New application received",
                            &format!("{} applied for {}", applicant, job_title),
                            json!({ "application_id": application_id }),
                        )
                        .await?;
                }
                Ok(())
            })
            .await;
    }

    async fn trigger_analysis(&self, application: &Application) {
        let Some(resume_url) = application.resume_url.clone() else {
            return;
        };
        let analysis = Arc::clone(&self.analysis);
        let request = AnalysisRequest {
            application_id: application.id,
            candidate_id: application.candidate_id,
            job_id: application.job_id,
            resume_url,
            callback_url: self.analysis_callback_url.clone(),
        };
        self.dispatcher
            .dispatch("trigger_analysis", async move {
                analysis.trigger_analysis(request).await
            })
            .await;
    }

    async fn dispatch_status_effects(&self, application: &Application) {
        let job_title = match self.store.job_by_id(application.job_id).await {
            Ok(Some(job)) => job.title,
            _ => "the position".to_string(),
        };

        if let Some((title, body)) = status_message(application.status, &job_title) {
            let notifier = Arc::clone(&self.notifier);
            let candidate_id = application.candidate_id;
            let context = json!({
                "application_id": application.id,
                "status": application.status,
            });
            self.dispatcher
                .dispatch("notify_candidate", async move {
                    notifier.notify(candidate_id, title, &body, context).await
                })
                .await;
        }

        if application.status == ApplicationStatus::Interviewed {
            self.provision_interview_room(application, &job_title).await;
        }
    }

    /// Best-effort room setup after an INTERVIEWED transition has committed.
    /// A provisioning failure is written into the application's operational
    /// notes so staff can see it; it never reaches the caller.
    async fn provision_interview_room(&self, application: &Application, job_title: &str) {
        let room_name = format!("interview-{}-{}", application.id, time::now().timestamp());
        let store = Arc::clone(&self.store);
        let rooms = Arc::clone(&self.rooms);
        let notifier = Arc::clone(&self.notifier);
        let messenger = Arc::clone(&self.messenger);
        let application_id = application.id;
        let candidate_id = application.candidate_id;
        let participant = application.applicant_name.clone();
        let phone = application.applicant_phone.clone();
        let job_title = job_title.to_string();

        self.dispatcher
            .dispatch("provision_interview_room", async move {
                let metadata = json!({ "application_id": application_id });
                match rooms
                    .create_room(&room_name, metadata, "recruitflow", &participant)
                    .await
                {
                    Ok(grant) => {
                        notifier
                            .notify(
                                candidate_id,
                                "Your interview room is ready",
                                &format!(
                                    "Join your interview for {} in room {}.",
                                    job_title, grant.room_name
                                ),
                                json!({
                                    "room": grant.room_name,
                                    "token": grant.join_token,
                                    "url": grant.url,
                                }),
                            )
                            .await?;
                        if validation::is_usable_phone(phone.as_deref()) {
                            messenger
                                .send_templated_message(
                                    phone.as_deref().unwrap_or_default(),
                                    "interview_invitation",
                                    json!({
                                        "room": grant.room_name,
                                        "token": grant.join_token,
                                        "url": grant.url,
                                    }),
                                )
                                .await?;
                        }
                        Ok(())
                    }
                    Err(err) => {
                        tracing::error!(
                            application_id = %application_id,
                            error = ?err,
                            "interview room provisioning failed"
                        );
                        store
                            .append_operational_note(
                                application_id,
                                &format!("Interview room provisioning failed: {:#}", err),
                            )
                            .await?;
                        Ok(())
                    }
                }
            })
            .await;
    }
}

/// Fixed candidate-facing wording per target status. Statuses without an
/// entry produce no notification.
fn status_message(
    status: ApplicationStatus,
    job_title: &str,
) -> Option<(&'static str, String)> {
    match status {
        ApplicationStatus::Reviewed => Some((
            "Application reviewed",
            format!("Your application for {} has been reviewed.", job_title),
        )),
        ApplicationStatus::Shortlisted => Some((
            "You have been shortlisted",
            format!("Good news! You have been shortlisted for {}.", job_title),
        )),
        ApplicationStatus::Interviewed => Some((
            "Interview stage",
            format!(
                "Your application for {} has moved to the interview stage.",
                job_title
            ),
        )),
        ApplicationStatus::Offered => Some((
            "Offer extended",
            format!("You have received an offer for {}.", job_title),
        )),
        ApplicationStatus::Hired => Some((
            "Congratulations",
            format!("You have been hired for {}!", job_title),
        )),
        ApplicationStatus::Rejected => Some((
            "Application update",
            format!(
                "Your application for {} was not successful this time.",
                job_title
            ),
        )),
        ApplicationStatus::Pending
        | ApplicationStatus::Analyzed
        | ApplicationStatus::Withdrawn => None,
    }
}
