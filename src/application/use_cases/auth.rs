use std::sync::Arc;

use rand::{Rng, rngs::OsRng};
use serde::Serialize;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::{
        ports::password_hasher::PasswordHasher,
        use_cases::profile::ProfileRepo,
        validators::{
            MIN_PASSWORD_LEN, is_valid_email, is_valid_password, is_valid_website,
            normalize_optional_text,
        },
    },
    domain::entities::{
        developer_profile::{
            DeveloperProfile, NewDeveloperProfile, PARTNER_ID_PREFIX, PARTNER_ID_SUFFIX_LEN,
        },
        usage_plan::UsagePlan,
    },
};

const PARTNER_ID_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Public view of an authenticated developer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: Uuid,
    pub email: String,
    pub partner_id: String,
}

impl From<&DeveloperProfile> for SessionUser {
    fn from(profile: &DeveloperProfile) -> Self {
        Self {
            id: profile.user_id,
            email: profile.email.clone(),
            partner_id: profile.partner_id.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SignupInput {
    pub email: Option<String>,
    pub password: Option<String>,
    pub company_name: Option<String>,
    pub website: Option<String>,
}

#[derive(Clone)]
pub struct AuthUseCases {
    profiles: Arc<dyn ProfileRepo>,
    hasher: Arc<dyn PasswordHasher>,
}

impl AuthUseCases {
    pub fn new(profiles: Arc<dyn ProfileRepo>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { profiles, hasher }
    }

    #[instrument(skip(self, input), fields(email = input.email.as_deref().unwrap_or_default()))]
    pub async fn signup(&self, input: SignupInput) -> AppResult<SessionUser> {
        let email = input
            .email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .ok_or_else(|| AppError::InvalidInput("Email and password are required".into()))?
            .to_lowercase();
        let password = input
            .password
            .filter(|p| !p.is_empty())
            .ok_or_else(|| AppError::InvalidInput("Email and password are required".into()))?;

        if !is_valid_email(&email) {
            return Err(AppError::InvalidInput("Invalid email address".into()));
        }
        if !is_valid_password(&password) {
            return Err(AppError::InvalidInput(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        let website = input.website.as_deref().and_then(normalize_optional_text);
        if let Some(url) = &website
            && !is_valid_website(url)
        {
            return Err(AppError::InvalidInput("Website must be an http(s) URL".into()));
        }

        if self.profiles.email_exists(&email).await? {
            return Err(AppError::Conflict("An account with this email already exists".into()));
        }

        let password_hash = self.hasher.hash(&password)?;
        let plan = UsagePlan::default();
        let profile = self
            .profiles
            .create(NewDeveloperProfile {
                user_id: Uuid::new_v4(),
                email,
                password_hash,
                company_name: input.company_name.as_deref().and_then(normalize_optional_text),
                website,
                usage_plan: plan,
                monthly_request_limit: plan.default_monthly_limit(),
                partner_id: generate_partner_id(),
            })
            .await?;

        tracing::info!(partner_id = %profile.partner_id, "Developer signed up");
        Ok(SessionUser::from(&profile))
    }

    /// Unknown email and wrong password produce the same error.
    #[instrument(skip(self, password))]
    pub async fn signin(&self, email: &str, password: &str) -> AppResult<SessionUser> {
        let email = email.trim().to_lowercase();
        if email.is_empty() || password.is_empty() {
            return Err(AppError::InvalidCredentials);
        }

        let credentials = self.profiles.get_credentials_by_email(&email).await?;
        let stored_hash = credentials
            .as_ref()
            .map_or(self.hasher.dummy_hash(), |c| c.password_hash.as_str());
        let verified = self.hasher.verify(password, stored_hash);

        match credentials {
            Some(credentials) if verified => Ok(SessionUser::from(&credentials.profile)),
            _ => Err(AppError::InvalidCredentials),
        }
    }

    /// Resolves a session subject to its user. A deleted profile is an auth failure.
    pub async fn session(&self, user_id: Uuid) -> AppResult<SessionUser> {
        self.profiles
            .get_by_user_id(user_id)
            .await?
            .map(|p| SessionUser::from(&p))
            .ok_or(AppError::InvalidCredentials)
    }
}

/// `AML-` followed by 12 characters from `[A-Z0-9]`.
pub fn generate_partner_id() -> String {
    let mut rng = OsRng;
    let suffix: String = (0..PARTNER_ID_SUFFIX_LEN)
        .map(|_| PARTNER_ID_CHARSET[rng.gen_range(0..PARTNER_ID_CHARSET.len())] as char)
        .collect();
    format!("{PARTNER_ID_PREFIX}{suffix}")
}
