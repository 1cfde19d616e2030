use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::config::get_config;
use crate::error::{Error, Result};
use crate::models::application::{
    Application, ApplicationDetail, NewApplication, StageTimestamp,
};
use crate::models::job::Job;
use crate::models::note::{ApplicationNote, NewNote, NoteVisibility};
use crate::models::status::ApplicationStatus;
use crate::models::user::{
    CandidateProfile, NewEducation, NewProfile, NewUser, NewWorkExperience, ProfilePatch, User,
};
use crate::services::identity_service::DUPLICATE_IDENTITY_MESSAGE;
use crate::store::{Store, StoreTx};

pub async fn create_pool() -> Result<PgPool> {
    let config = get_config();
    let pool = PgPoolOptions::new()
        .max_connections(50)
        .acquire_timeout(std::time::Duration::from_secs(30))
        .connect(&config.database_url)
        .await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| Error::Internal(format!("Migration failed: {}", e)))?;
    Ok(())
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

pub struct PgTx {
    tx: Transaction<'static, Postgres>,
}

fn unique_violation(err: &sqlx::Error, constraint: &str) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.constraint() == Some(constraint))
}

#[derive(sqlx::FromRow)]
struct ApplicationDetailRow {
    #[sqlx(flatten)]
    application: Application,
    job_title: String,
    candidate_name: String,
    candidate_email: String,
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTx { tx }))
    }

    async fn application_by_id(&self, id: Uuid) -> Result<Option<Application>> {
        let row = sqlx::query_as::<_, Application>("SELECT * FROM applications WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn application_detail(&self, id: Uuid) -> Result<Option<ApplicationDetail>> {
        let row = sqlx::query_as::<_, ApplicationDetailRow>(
            r#"
            SELECT a.*, j.title AS job_title, u.name AS candidate_name, u.email AS candidate_email
            FROM applications a
            JOIN jobs j ON j.id = a.job_id
            JOIN users u ON u.id = a.candidate_id
            WHERE a.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| ApplicationDetail {
            application: r.application,
            job_title: r.job_title,
            candidate_name: r.candidate_name,
            candidate_email: r.candidate_email,
        }))
    }

    async fn applications_for_job(&self, job_id: Uuid) -> Result<Vec<Application>> {
        let rows = sqlx::query_as::<_, Application>(
            "SELECT * FROM applications WHERE job_id = $1 ORDER BY created_at DESC",
        )
        .bind(job_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn applications_for_candidate(&self, candidate_id: Uuid) -> Result<Vec<Application>> {
        let rows = sqlx::query_as::<_, Application>(
            "SELECT * FROM applications WHERE candidate_id = $1 ORDER BY created_at DESC",
        )
        .bind(candidate_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn job_by_id(&self, id: Uuid) -> Result<Option<Job>> {
        let row = sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn staff_user_ids(&self, organization_id: Uuid) -> Result<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id FROM users
            WHERE organization_id = $1 AND is_active AND role IN ('hr', 'admin')
            ORDER BY id
            "#,
        )
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    async fn note_by_id(&self, id: Uuid) -> Result<Option<ApplicationNote>> {
        let row =
            sqlx::query_as::<_, ApplicationNote>("SELECT * FROM application_notes WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row)
    }

    async fn notes_for_application(&self, application_id: Uuid) -> Result<Vec<ApplicationNote>> {
        let rows = sqlx::query_as::<_, ApplicationNote>(
            "SELECT * FROM application_notes WHERE application_id = $1 ORDER BY created_at ASC",
        )
        .bind(application_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn append_operational_note(&self, application_id: Uuid, line: &str) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE applications
            SET notes = CASE WHEN notes IS NULL OR notes = '' THEN $2
                        ELSE notes || E'\n' || $2 END,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(application_id)
        .bind(line)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!(
                "Application {} not found",
                application_id
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl StoreTx for PgTx {
    async fn job_for_update(&mut self, id: Uuid) -> Result<Option<Job>> {
        let row = sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row)
    }

    async fn user_by_email(&mut self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row)
    }

    async fn user_by_id(&mut self, id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row)
    }

    async fn insert_user(&mut self, user: NewUser) -> Result<User> {
        let row = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, name, phone, password_hash, role, organization_id, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.phone)
        .bind(&user.password_hash)
        .bind(&user.role)
        .bind(user.organization_id)
        .bind(user.is_active)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|err| {
            if unique_violation(&err, "users_email_key") {
                Error::Conflict(DUPLICATE_IDENTITY_MESSAGE.to_string())
            } else {
                Error::from(err)
            }
        })?;
        Ok(row)
    }

    async fn insert_profile(&mut self, profile: NewProfile) -> Result<CandidateProfile> {
        let row = sqlx::query_as::<_, CandidateProfile>(
            r#"
            INSERT INTO candidate_profiles (user_id, resume_url, linkedin_url)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(profile.user_id)
        .bind(&profile.resume_url)
        .bind(&profile.linkedin_url)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(row)
    }

    async fn profile_by_user(&mut self, user_id: Uuid) -> Result<Option<CandidateProfile>> {
        let row = sqlx::query_as::<_, CandidateProfile>(
            "SELECT * FROM candidate_profiles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(row)
    }

    async fn application_exists(&mut self, job_id: Uuid, candidate_id: Uuid) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM applications WHERE job_id = $1 AND candidate_id = $2)",
        )
        .bind(job_id)
        .bind(candidate_id)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(exists)
    }

    async fn insert_application(&mut self, application: NewApplication) -> Result<Application> {
        let row = sqlx::query_as::<_, Application>(
            r#"
            INSERT INTO applications (
                job_id, candidate_id, status,
                applicant_name, applicant_email, applicant_phone, applicant_linkedin,
                cover_letter, resume_url, expected_salary, notice_period
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(application.job_id)
        .bind(application.candidate_id)
        .bind(ApplicationStatus::Pending)
        .bind(&application.applicant_name)
        .bind(&application.applicant_email)
        .bind(&application.applicant_phone)
        .bind(&application.applicant_linkedin)
        .bind(&application.cover_letter)
        .bind(&application.resume_url)
        .bind(application.expected_salary)
        .bind(&application.notice_period)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|err| {
            if unique_violation(&err, "applications_job_id_candidate_id_key") {
                Error::Conflict("You have already applied for this job".to_string())
            } else {
                Error::from(err)
            }
        })?;
        Ok(row)
    }

    async fn application_for_update(&mut self, id: Uuid) -> Result<Option<Application>> {
        let row =
            sqlx::query_as::<_, Application>("SELECT * FROM applications WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *self.tx)
                .await?;
        Ok(row)
    }

    async fn update_application_status(
        &mut self,
        id: Uuid,
        status: ApplicationStatus,
        stage: Option<StageTimestamp>,
    ) -> Result<Application> {
        let stage_column = stage.map(|s| match s {
            StageTimestamp::Reviewed => "reviewed_at",
            StageTimestamp::Interviewed => "interviewed_at",
            StageTimestamp::Rejected => "rejected_at",
            StageTimestamp::Accepted => "accepted_at",
        });
        let sql = match stage_column {
            Some(column) => format!(
                "UPDATE applications SET status = $1, {} = NOW(), updated_at = NOW() \
                 WHERE id = $2 RETURNING *",
                column
            ),
            None => "UPDATE applications SET status = $1, updated_at = NOW() \
                     WHERE id = $2 RETURNING *"
                .to_string(),
        };
        let row = sqlx::query_as::<_, Application>(&sql)
            .bind(status)
            .bind(id)
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(row)
    }

    async fn set_application_analysis(
        &mut self,
        id: Uuid,
        score: f64,
        result: Option<JsonValue>,
        status: ApplicationStatus,
    ) -> Result<Application> {
        let row = sqlx::query_as::<_, Application>(
            r#"
            UPDATE applications
            SET analysis_score = $1, analysis_result = $2, status = $3, updated_at = NOW()
            WHERE id = $4
            RETURNING *
            "#,
        )
        .bind(score)
        .bind(result)
        .bind(status)
        .bind(id)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(row)
    }

    async fn delete_application(&mut self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM applications WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_user_contact(
        &mut self,
        user_id: Uuid,
        email: Option<&str>,
        name: Option<&str>,
        phone: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET email = COALESCE($2, email),
                name = COALESCE($3, name),
                phone = COALESCE($4, phone),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(email)
        .bind(name)
        .bind(phone)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn update_profile(&mut self, profile_id: Uuid, patch: ProfilePatch) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE candidate_profiles
            SET resume_url = COALESCE($2, resume_url),
                summary = COALESCE($3, summary),
                skills = COALESCE($4, skills),
                linkedin_url = COALESCE($5, linkedin_url),
                portfolio_url = COALESCE($6, portfolio_url),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(profile_id)
        .bind(&patch.resume_url)
        .bind(&patch.summary)
        .bind(&patch.skills)
        .bind(&patch.linkedin_url)
        .bind(&patch.portfolio_url)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn replace_work_history(
        &mut self,
        profile_id: Uuid,
        work_experiences: Vec<NewWorkExperience>,
        educations: Vec<NewEducation>,
    ) -> Result<()> {
        sqlx::query("DELETE FROM work_experiences WHERE profile_id = $1")
            .bind(profile_id)
            .execute(&mut *self.tx)
            .await?;
        sqlx::query("DELETE FROM educations WHERE profile_id = $1")
            .bind(profile_id)
            .execute(&mut *self.tx)
            .await?;
        for w in work_experiences {
            sqlx::query(
                r#"
                INSERT INTO work_experiences (profile_id, company, title, start_date, end_date, description)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(profile_id)
            .bind(&w.company)
            .bind(&w.title)
            .bind(w.start_date)
            .bind(w.end_date)
            .bind(&w.description)
            .execute(&mut *self.tx)
            .await?;
        }
        for e in educations {
            sqlx::query(
                r#"
                INSERT INTO educations (profile_id, institution, degree, field_of_study, start_date, end_date)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(profile_id)
            .bind(&e.institution)
            .bind(&e.degree)
            .bind(&e.field_of_study)
            .bind(e.start_date)
            .bind(e.end_date)
            .execute(&mut *self.tx)
            .await?;
        }
        Ok(())
    }

    async fn increment_applicant_count(&mut self, job_id: Uuid) -> Result<()> {
        sqlx::query(
            "UPDATE jobs SET applicant_count = applicant_count + 1, updated_at = NOW() WHERE id = $1",
        )
        .bind(job_id)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn insert_note(&mut self, note: NewNote) -> Result<ApplicationNote> {
        let row = sqlx::query_as::<_, ApplicationNote>(
            r#"
            INSERT INTO application_notes (application_id, author_id, text, visibility)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(note.application_id)
        .bind(note.author_id)
        .bind(&note.text)
        .bind(note.visibility)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(row)
    }

    async fn update_note(
        &mut self,
        id: Uuid,
        text: Option<&str>,
        visibility: Option<NoteVisibility>,
    ) -> Result<ApplicationNote> {
        let row = sqlx::query_as::<_, ApplicationNote>(
            r#"
            UPDATE application_notes
            SET text = COALESCE($2, text),
                visibility = COALESCE($3, visibility),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(text)
        .bind(visibility)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(row)
    }

    async fn delete_note(&mut self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM application_notes WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
