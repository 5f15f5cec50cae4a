use serde::Serialize;
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

/// Closed set of dashboard views the frontend can ask for.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, AsRefStr, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum DashboardSection {
    Overview,
    ApiKeys,
    Analytics,
    Settings,
}

impl DashboardSection {
    pub fn all() -> Vec<DashboardSection> {
        DashboardSection::iter().collect()
    }

    pub fn title(&self) -> &'static str {
        match self {
            DashboardSection::Overview => "Overview",
            DashboardSection::ApiKeys => "API Keys",
            DashboardSection::Analytics => "API Analytics",
            DashboardSection::Settings => "Settings",
        }
    }
}
