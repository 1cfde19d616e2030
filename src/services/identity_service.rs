use crate::error::{Error, Result};
use crate::models::user::{CandidateProfile, NewProfile, NewUser, User};
use crate::store::StoreTx;
use crate::utils::{crypto, time, validation};

/// Single user-visible wording for every email collision on the anonymous
/// path, so a response never reveals whether the address belongs to an
/// account or an application.
pub const DUPLICATE_IDENTITY_MESSAGE: &str =
    "An account with this email already exists, please log in";

#[derive(Debug, Clone)]
pub struct ProvisionRequest<'a> {
    pub name: &'a str,
    pub email: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub linkedin: Option<&'a str>,
    pub resume_url: Option<&'a str>,
}

#[derive(Debug)]
pub struct ProvisionedIdentity {
    pub user: User,
    pub profile: CandidateProfile,
    /// Plaintext of the generated password, returned exactly once so the
    /// caller can hand out one-time credentials. Only the hash is stored.
    pub password: String,
}

/// Creates a user identity plus profile for an applicant without an account.
/// Runs inside the caller's transaction; nothing is observable if the
/// enclosing operation rolls back.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityService;

impl IdentityService {
    pub fn new() -> Self {
        Self
    }

    pub async fn provision(
        &self,
        tx: &mut dyn StoreTx,
        request: ProvisionRequest<'_>,
    ) -> Result<ProvisionedIdentity> {
        if let Some(email) = request.email {
            if tx.user_by_email(email).await?.is_some() {
                return Err(Error::Conflict(DUPLICATE_IDENTITY_MESSAGE.to_string()));
            }
        }

        // Placeholders share one timestamp so a pair from the same submission
        // can be correlated later.
        let nanos = time::high_res_nanos();
        let email = request
            .email
            .map(str::to_owned)
            .unwrap_or_else(|| validation::placeholder_email(nanos));
        let phone = request
            .phone
            .map(str::to_owned)
            .unwrap_or_else(|| validation::placeholder_phone(nanos));

        let password = crypto::generate_password();
        let password_hash = crypto::hash_password(&password)?;

        let user = tx
            .insert_user(NewUser {
                email,
                name: request.name.to_string(),
                phone: Some(phone),
                password_hash,
                role: "candidate".to_string(),
                organization_id: None,
                is_active: true,
            })
            .await?;
        let profile = tx
            .insert_profile(NewProfile {
                user_id: user.id,
                resume_url: request.resume_url.map(str::to_owned),
                linkedin_url: request.linkedin.map(str::to_owned),
            })
            .await?;

        tracing::info!(user_id = %user.id, "provisioned identity for anonymous applicant");
        Ok(ProvisionedIdentity {
            user,
            profile,
            password,
        })
    }
}
