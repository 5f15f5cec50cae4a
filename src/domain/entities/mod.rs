pub mod api_key;
pub mod dashboard_section;
pub mod developer_profile;
pub mod preferences;
pub mod relay_log;
pub mod usage_plan;
pub mod usage_record;
