mod support;

use std::sync::Arc;

use uuid::Uuid;

use recruitflow::dto::application_dto::CreateApplicationInput;
use recruitflow::error::Error;
use recruitflow::models::job::Job;
use recruitflow::models::status::ApplicationStatus;
use recruitflow::models::user::User;
use recruitflow::store::memory::MemoryStore;
use recruitflow::store::Store;
use support::{harness, harness_with, job_for, user_with, Harness, StubRooms, CALLBACK_URL};

async fn seeded() -> (Harness, Job, User, User) {
    let store = MemoryStore::new();
    let org = Uuid::new_v4();
    let job = job_for(org);
    let candidate = user_with("candidate@example.com", "candidate", None);
    let staff = user_with("hr@example.com", "hr", Some(org));
    store.seed_job(job.clone()).await;
    store.seed_user(candidate.clone()).await;
    store.seed_user(staff.clone()).await;
    (harness(store), job, candidate, staff)
}

fn create_input(job_id: Uuid, resume_url: Option<&str>) -> CreateApplicationInput {
    CreateApplicationInput {
        job_id,
        candidate_id: None,
        cover_letter: Some("I would like to apply.".to_string()),
        resume_url: resume_url.map(str::to_string),
        expected_salary: None,
        notice_period: Some("1 month".to_string()),
        applicant_name: None,
        applicant_email: None,
        applicant_phone: None,
        applicant_linkedin: None,
    }
}

#[tokio::test]
async fn create_returns_pending_and_triggers_analysis() {
    let (h, job, candidate, staff) = seeded().await;

    let application = h
        .service
        .create(
            create_input(job.id, Some("https://cdn.example.com/cv.pdf")),
            Some(candidate.id),
        )
        .await
        .unwrap();

    assert_eq!(application.status, ApplicationStatus::Pending);
    assert_eq!(application.candidate_id, candidate.id);
    // Snapshot fields default from the candidate record.
    assert_eq!(application.applicant_email.as_deref(), Some("candidate@example.com"));

    let requests = h.analysis.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].application_id, application.id);
    assert_eq!(requests[0].resume_url, "https://cdn.example.com/cv.pdf");
    assert_eq!(requests[0].callback_url, CALLBACK_URL);
    drop(requests);

    let notified: Vec<Uuid> = h
        .notifier
        .sent
        .lock()
        .unwrap()
        .iter()
        .map(|(user, _, _, _)| *user)
        .collect();
    assert_eq!(notified, vec![staff.id]);

    let stored_job = h.store.job_by_id(job.id).await.unwrap().unwrap();
    assert_eq!(stored_job.applicant_count, 1);
    assert!(h.audit.actions().contains(&"application.created".to_string()));
}

#[tokio::test]
async fn create_without_resume_skips_analysis() {
    let (h, job, candidate, _) = seeded().await;
    h.service
        .create(create_input(job.id, None), Some(candidate.id))
        .await
        .unwrap();
    assert!(h.analysis.requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn duplicate_application_is_a_conflict() {
    let (h, job, candidate, _) = seeded().await;
    h.service
        .create(create_input(job.id, None), Some(candidate.id))
        .await
        .unwrap();

    let err = h
        .service
        .create(create_input(job.id, None), Some(candidate.id))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));
    assert_eq!(h.store.application_count().await, 1);
}

#[tokio::test]
async fn cross_account_submission_requires_elevated_role() {
    let (h, job, candidate, staff) = seeded().await;
    let other = user_with("other@example.com", "candidate", None);
    h.store.seed_user(other.clone()).await;

    let mut input = create_input(job.id, None);
    input.candidate_id = Some(candidate.id);
    let err = h
        .service
        .create(input.clone(), Some(other.id))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Forbidden(_)));
    assert_eq!(h.store.application_count().await, 0);

    h.service.create(input, Some(staff.id)).await.unwrap();
    assert_eq!(h.store.application_count().await, 1);
}

#[tokio::test]
async fn update_status_stamps_stage_timestamp_and_notifies_candidate() {
    let (h, job, candidate, _) = seeded().await;
    let application = h
        .service
        .create(create_input(job.id, None), Some(candidate.id))
        .await
        .unwrap();
    h.notifier.sent.lock().unwrap().clear();

    let updated = h
        .service
        .update_status(application.id, ApplicationStatus::Reviewed, None)
        .await
        .unwrap();

    assert_eq!(updated.status, ApplicationStatus::Reviewed);
    assert!(updated.reviewed_at.is_some());
    assert!(updated.interviewed_at.is_none());

    let sent = h.notifier.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    let (user, title, body, _) = &sent[0];
    assert_eq!(*user, candidate.id);
    assert_eq!(title, "Application reviewed");
    assert!(body.contains("Backend Engineer"));
    drop(sent);

    assert!(h
        .audit
        .actions()
        .contains(&"application.status_changed".to_string()));
}

#[tokio::test]
async fn invalid_transition_is_rejected_verbatim() {
    let (h, job, candidate, _) = seeded().await;
    let application = h
        .service
        .create(create_input(job.id, None), Some(candidate.id))
        .await
        .unwrap();

    let err = h
        .service
        .update_status(application.id, ApplicationStatus::Hired, None)
        .await
        .unwrap_err();
    match err {
        Error::InvalidTransition { from, to } => {
            assert_eq!(from, ApplicationStatus::Pending);
            assert_eq!(to, ApplicationStatus::Hired);
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let reloaded = h.service.get_application(application.id).await.unwrap();
    assert_eq!(reloaded.status, ApplicationStatus::Pending);
}

#[tokio::test]
async fn same_status_update_is_a_noop() {
    let (h, job, candidate, _) = seeded().await;
    let application = h
        .service
        .create(create_input(job.id, None), Some(candidate.id))
        .await
        .unwrap();
    h.notifier.sent.lock().unwrap().clear();

    let unchanged = h
        .service
        .update_status(application.id, ApplicationStatus::Pending, None)
        .await
        .unwrap();
    assert_eq!(unchanged.status, ApplicationStatus::Pending);
    assert!(unchanged.reviewed_at.is_none());
    assert!(h.notifier.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn terminal_states_cannot_move_again() {
    let (h, job, candidate, _) = seeded().await;
    let application = h
        .service
        .create(create_input(job.id, None), Some(candidate.id))
        .await
        .unwrap();
    h.service
        .update_status(application.id, ApplicationStatus::Rejected, None)
        .await
        .unwrap();

    for target in [
        ApplicationStatus::Reviewed,
        ApplicationStatus::Interviewed,
        ApplicationStatus::Hired,
    ] {
        let err = h
            .service
            .update_status(application.id, target, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTransition { .. }));
    }
}

#[tokio::test]
async fn concurrent_updates_race_to_a_single_winner() {
    let (h, job, candidate, _) = seeded().await;
    let application = h
        .service
        .create(create_input(job.id, None), Some(candidate.id))
        .await
        .unwrap();
    h.service
        .update_status(application.id, ApplicationStatus::Reviewed, None)
        .await
        .unwrap();

    // Both calls start from REVIEWED. Whichever commits first determines the
    // row's state; the loser must be validated against that state, not the
    // snapshot it started from.
    let (first, second) = tokio::join!(
        h.service
            .update_status(application.id, ApplicationStatus::Rejected, None),
        h.service
            .update_status(application.id, ApplicationStatus::Shortlisted, None),
    );

    let winner = first.expect("first writer should commit");
    assert_eq!(winner.status, ApplicationStatus::Rejected);
    match second.expect_err("second writer should observe the committed status") {
        Error::InvalidTransition { from, to } => {
            assert_eq!(from, ApplicationStatus::Rejected);
            assert_eq!(to, ApplicationStatus::Shortlisted);
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let reloaded = h.service.get_application(application.id).await.unwrap();
    assert_eq!(reloaded.status, ApplicationStatus::Rejected);
}

#[tokio::test]
async fn interview_transition_provisions_room() {
    let (h, job, candidate, _) = seeded().await;
    let application = h
        .service
        .create(create_input(job.id, None), Some(candidate.id))
        .await
        .unwrap();
    h.service
        .update_status(application.id, ApplicationStatus::Reviewed, None)
        .await
        .unwrap();
    h.notifier.sent.lock().unwrap().clear();

    h.service
        .update_status(application.id, ApplicationStatus::Interviewed, None)
        .await
        .unwrap();

    let created = h.rooms.created.lock().unwrap();
    assert_eq!(created.len(), 1);
    assert!(created[0].starts_with(&format!("interview-{}-", application.id)));
    drop(created);

    let sent = h.notifier.sent.lock().unwrap();
    assert!(sent
        .iter()
        .any(|(user, title, _, _)| *user == candidate.id
            && title == "Your interview room is ready"));
    drop(sent);

    // Candidate phone is usable, so the join link also goes out as a message.
    let messages = h.messenger.sent.lock().unwrap();
    assert!(messages
        .iter()
        .any(|(_, template, _)| template == "interview_invitation"));
}

#[tokio::test]
async fn room_provisioning_failure_lands_in_notes_not_in_the_caller() {
    let store = MemoryStore::new();
    let org = Uuid::new_v4();
    let job = job_for(org);
    let candidate = user_with("candidate@example.com", "candidate", None);
    store.seed_job(job.clone()).await;
    store.seed_user(candidate.clone()).await;
    let h = harness_with(store, Arc::new(support::AllowAllOwnership), StubRooms::broken());

    let application = h
        .service
        .create(create_input(job.id, None), Some(candidate.id))
        .await
        .unwrap();
    h.service
        .update_status(application.id, ApplicationStatus::Reviewed, None)
        .await
        .unwrap();

    let updated = h
        .service
        .update_status(application.id, ApplicationStatus::Interviewed, None)
        .await
        .expect("transition must commit even when provisioning fails");
    assert_eq!(updated.status, ApplicationStatus::Interviewed);
    assert!(updated.interviewed_at.is_some());

    let reloaded = h.service.get_application(application.id).await.unwrap();
    assert_eq!(reloaded.status, ApplicationStatus::Interviewed);
    let notes = reloaded.notes.expect("failure must be recorded in notes");
    assert!(notes.contains("Interview room provisioning failed"));
}

#[tokio::test]
async fn denied_ownership_blocks_status_update() {
    let store = MemoryStore::new();
    let org = Uuid::new_v4();
    let job = job_for(org);
    let candidate = user_with("candidate@example.com", "candidate", None);
    store.seed_job(job.clone()).await;
    store.seed_user(candidate.clone()).await;
    let h = harness_with(
        store,
        Arc::new(support::DenyingOwnership),
        StubRooms::working(),
    );

    let application = h
        .service
        .create(create_input(job.id, None), Some(candidate.id))
        .await
        .unwrap();
    let err = h
        .service
        .update_status(
            application.id,
            ApplicationStatus::Reviewed,
            Some(Uuid::new_v4()),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Forbidden(_)));

    let reloaded = h.service.get_application(application.id).await.unwrap();
    assert_eq!(reloaded.status, ApplicationStatus::Pending);
}

#[tokio::test]
async fn ownership_gate_receives_the_jobs_organization() {
    let store = MemoryStore::new();
    let org = Uuid::new_v4();
    let job = job_for(org);
    let candidate = user_with("candidate@example.com", "candidate", None);
    store.seed_job(job.clone()).await;
    store.seed_user(candidate.clone()).await;

    let actor = Uuid::new_v4();
    let mut gate = support::MockOwnership::new();
    gate.expect_verify_ownership()
        .withf(move |_, acting, role, organization| {
            *acting == actor && role == "staff" && *organization == org
        })
        .times(1)
        .returning(|_, _, _, _| Ok(()));

    let h = harness_with(store, Arc::new(gate), StubRooms::working());
    let application = h
        .service
        .create(create_input(job.id, None), Some(candidate.id))
        .await
        .unwrap();
    h.service
        .update_status(application.id, ApplicationStatus::Reviewed, Some(actor))
        .await
        .unwrap();
}

#[tokio::test]
async fn remove_reports_whether_a_row_went_away() {
    let (h, job, candidate, _) = seeded().await;
    let application = h
        .service
        .create(create_input(job.id, None), Some(candidate.id))
        .await
        .unwrap();

    assert!(h.service.remove(application.id, None).await.unwrap());
    assert!(!h.service.remove(application.id, None).await.unwrap());
    assert_eq!(h.store.application_count().await, 0);

    let removals = h
        .audit
        .actions()
        .iter()
        .filter(|a| *a == "application.removed")
        .count();
    assert_eq!(removals, 1);
}

#[tokio::test]
async fn queries_list_by_job_and_candidate() {
    let (h, job, candidate, _) = seeded().await;
    let application = h
        .service
        .create(create_input(job.id, None), Some(candidate.id))
        .await
        .unwrap();

    let by_job = h.service.applications_for_job(job.id).await.unwrap();
    assert_eq!(by_job.len(), 1);
    assert_eq!(by_job[0].id, application.id);

    let by_candidate = h
        .service
        .applications_for_candidate(candidate.id)
        .await
        .unwrap();
    assert_eq!(by_candidate.len(), 1);

    let detail = h.service.application_detail(application.id).await.unwrap();
    assert_eq!(detail.job_title, "Backend Engineer");
    assert_eq!(detail.candidate_email, "candidate@example.com");
}
