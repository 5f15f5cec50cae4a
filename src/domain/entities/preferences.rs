use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    AsRefStr,
    Display,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[derive(Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// Dashboard preferences, one row per user. A missing row means defaults.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    pub user_id: Uuid,
    pub theme: Theme,
    pub updated_at: Option<NaiveDateTime>,
}

impl UserPreferences {
    pub fn defaults_for(user_id: Uuid) -> Self {
        Self {
            user_id,
            theme: Theme::default(),
            updated_at: None,
        }
    }
}
