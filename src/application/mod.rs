pub mod app_error;
pub mod change_feed;
pub mod jwt;
pub mod ports;
pub mod use_cases;
pub mod validators;
