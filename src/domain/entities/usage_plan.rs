use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Billing tier attached to a developer profile.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    AsRefStr,
    Display,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[derive(Default)]
pub enum UsagePlan {
    #[default]
    Free,
    Starter,
    Pro,
    Enterprise,
}

impl UsagePlan {
    /// Monthly request allowance a new profile on this plan starts with.
    pub fn default_monthly_limit(&self) -> i32 {
        match self {
            UsagePlan::Free => 1_000,
            UsagePlan::Starter => 10_000,
            UsagePlan::Pro => 100_000,
            UsagePlan::Enterprise => 1_000_000,
        }
    }

    pub fn is_paid(&self) -> bool {
        !matches!(self, UsagePlan::Free)
    }
}
