use std::str::FromStr;

use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    adapters::http::{app_state::AppState, session::current_user},
    app_error::{AppError, AppResult},
    domain::entities::{
        api_key::ApiKeyStatus, dashboard_section::DashboardSection,
        developer_profile::DeveloperProfile, preferences::UserPreferences,
    },
    use_cases::{
        analytics::{AnalyticsReport, DEFAULT_WINDOW_DAYS, UsageSummary},
        api_key::ApiKeyView,
    },
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_sections))
        .route("/{section}", get(get_section))
}

#[derive(Serialize)]
struct SectionEntry {
    id: DashboardSection,
    title: &'static str,
}

#[derive(Serialize)]
struct SectionsResponse {
    sections: Vec<SectionEntry>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DashboardView {
    section: DashboardSection,
    title: &'static str,
    #[serde(flatten)]
    content: SectionContent,
}

#[derive(Serialize)]
#[serde(untagged)]
enum SectionContent {
    Overview(OverviewContent),
    ApiKeys(ApiKeysContent),
    Analytics(AnalyticsContent),
    Settings(SettingsContent),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OverviewContent {
    profile: DeveloperProfile,
    key_counts: KeyCounts,
    summary: UsageSummary,
}

#[derive(Serialize, Debug, PartialEq, Eq, Default)]
struct KeyCounts {
    total: usize,
    active: usize,
    disabled: usize,
}

impl KeyCounts {
    fn from_views(keys: &[ApiKeyView]) -> Self {
        let active = keys
            .iter()
            .filter(|k| k.status == ApiKeyStatus::Active)
            .count();
        Self {
            total: keys.len(),
            active,
            disabled: keys.len() - active,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiKeysContent {
    api_keys: Vec<ApiKeyView>,
}

#[derive(Serialize)]
struct AnalyticsContent {
    report: AnalyticsReport,
}

#[derive(Serialize)]
struct SettingsContent {
    profile: DeveloperProfile,
    preferences: UserPreferences,
}

async fn list_sections(
    State(app_state): State<AppState>,
    jar: CookieJar,
) -> AppResult<impl IntoResponse> {
    current_user(&jar, &app_state)?;
    let sections = DashboardSection::all()
        .into_iter()
        .map(|id| SectionEntry {
            id,
            title: id.title(),
        })
        .collect();
    Ok(Json(SectionsResponse { sections }))
}

async fn get_section(
    State(app_state): State<AppState>,
    jar: CookieJar,
    Path(section): Path<String>,
) -> AppResult<impl IntoResponse> {
    let user_id = current_user(&jar, &app_state)?;
    let section = DashboardSection::from_str(&section).map_err(|_| AppError::NotFound)?;

    let content = load_section(&app_state, user_id, section).await?;
    Ok(Json(DashboardView {
        section,
        title: section.title(),
        content,
    }))
}

async fn load_section(
    app_state: &AppState,
    user_id: Uuid,
    section: DashboardSection,
) -> AppResult<SectionContent> {
    let content = match section {
        DashboardSection::Overview => {
            let profile = app_state.profile_use_cases.get_profile(user_id).await?;
            let keys = app_state.api_key_use_cases.list_keys(user_id).await?;
            let report = app_state
                .analytics_use_cases
                .report(user_id, DEFAULT_WINDOW_DAYS)
                .await?;
            SectionContent::Overview(OverviewContent {
                profile,
                key_counts: KeyCounts::from_views(&keys),
                summary: report.summary,
            })
        }
        DashboardSection::ApiKeys => SectionContent::ApiKeys(ApiKeysContent {
            api_keys: app_state.api_key_use_cases.list_keys(user_id).await?,
        }),
        DashboardSection::Analytics => SectionContent::Analytics(AnalyticsContent {
            report: app_state
                .analytics_use_cases
                .report(user_id, DEFAULT_WINDOW_DAYS)
                .await?,
        }),
        DashboardSection::Settings => SectionContent::Settings(SettingsContent {
            profile: app_state.profile_use_cases.get_profile(user_id).await?,
            preferences: app_state.profile_use_cases.get_preferences(user_id).await?,
        }),
    };
    Ok(content)
}
