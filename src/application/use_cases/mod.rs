pub mod analytics;
pub mod api_key;
pub mod auth;
pub mod profile;
pub mod relay;
