pub mod password_hasher;
pub mod relay_service;
