//! HTTP client factory with consistent timeout configuration.
//!
//! Outbound clients go through `build_client()` rather than constructing
//! `reqwest::Client` directly.

use reqwest::Client;
use std::time::Duration;

/// TCP handshake + TLS.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Total request/response time for a screening call.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

pub fn build_client() -> Result<Client, reqwest::Error> {
    Client::builder()
        .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
        .timeout(DEFAULT_REQUEST_TIMEOUT)
        .user_agent(concat!("aml-portal/", env!("CARGO_PKG_VERSION")))
        .build()
}
