use chrono::NaiveDateTime;
use serde::Serialize;
use uuid::Uuid;

use super::usage_plan::UsagePlan;

/// Prefix shared by every partner identifier.
pub const PARTNER_ID_PREFIX: &str = "AML-";
pub const PARTNER_ID_SUFFIX_LEN: usize = 12;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeveloperProfile {
    pub user_id: Uuid,
    pub email: String,
    pub company_name: Option<String>,
    pub website: Option<String>,
    pub usage_plan: UsagePlan,
    pub monthly_request_limit: i32,
    /// Assigned at signup and never changed afterwards.
    pub partner_id: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Profile row together with the stored password hash, for sign-in only.
#[derive(Debug, Clone)]
pub struct ProfileCredentials {
    pub profile: DeveloperProfile,
    pub password_hash: String,
}

/// Fields required to insert a new profile.
#[derive(Debug, Clone)]
pub struct NewDeveloperProfile {
    pub user_id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub company_name: Option<String>,
    pub website: Option<String>,
    pub usage_plan: UsagePlan,
    pub monthly_request_limit: i32,
    pub partner_id: String,
}

/// Partial profile update. `None` leaves a field untouched; `Some(None)`
/// clears an optional text field.
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub company_name: Option<Option<String>>,
    pub website: Option<Option<String>>,
    pub usage_plan: Option<UsagePlan>,
}

impl ProfileChanges {
    pub fn is_empty(&self) -> bool {
        self.company_name.is_none() && self.website.is_none() && self.usage_plan.is_none()
    }

    /// Apply the changes in place. Used by in-memory stores and tests.
    pub fn apply_to(&self, profile: &mut DeveloperProfile, now: NaiveDateTime) {
        if let Some(company_name) = &self.company_name {
            profile.company_name = company_name.clone();
        }
        if let Some(website) = &self.website {
            profile.website = website.clone();
        }
        if let Some(plan) = self.usage_plan {
            profile.usage_plan = plan;
        }
        profile.updated_at = now;
    }
}

pub fn is_partner_id(value: &str) -> bool {
    value
        .strip_prefix(PARTNER_ID_PREFIX)
        .is_some_and(|rest| {
            rest.len() == PARTNER_ID_SUFFIX_LEN
                && rest
                    .chars()
                    .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        })
}
