//! HTTP client for the external transaction screening service.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use url::Url;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::relay_service::{
        CheckRequest, RelayRequest, RelayService, ScreeningResponse,
    },
};

const PARTNER_ID_HEADER: &str = "X-Partner-Id";

#[derive(Clone)]
pub struct HttpRelayService {
    client: Client,
    base_url: Url,
    token: Option<SecretString>,
}

impl HttpRelayService {
    pub fn new(client: Client, base_url: Url, token: Option<SecretString>) -> Self {
        Self {
            client,
            base_url,
            token,
        }
    }

    fn endpoint(&self, path: &str) -> AppResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| AppError::Internal(format!("Invalid relay URL: {e}")))
    }

    async fn post<T: Serialize + ?Sized>(
        &self,
        path: &str,
        partner_id: &str,
        body: &T,
    ) -> AppResult<ScreeningResponse> {
        let url = self.endpoint(path)?;
        let mut request = self
            .client
            .post(url)
            .header(PARTNER_ID_HEADER, partner_id)
            .json(body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().await.map_err(|e| {
            tracing::error!(error = %e, path, "Relay service unreachable");
            AppError::Upstream("Relay service unreachable".into())
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                status = %status,
                path,
                body = %body.chars().take(200).collect::<String>(),
                "Relay service returned an error"
            );
            return Err(upstream_error(status));
        }

        response.json::<ScreeningResponse>().await.map_err(|e| {
            tracing::error!(error = %e, path, "Relay service returned an unreadable body");
            AppError::Upstream("Relay service returned an invalid response".into())
        })
    }
}

fn upstream_error(status: StatusCode) -> AppError {
    AppError::Upstream(format!("Relay service responded with {}", status.as_u16()))
}

#[async_trait]
impl RelayService for HttpRelayService {
    async fn check(&self, partner_id: &str, request: &CheckRequest) -> AppResult<ScreeningResponse> {
        self.post("v1/check", partner_id, request).await
    }

    async fn relay(&self, partner_id: &str, request: &RelayRequest) -> AppResult<ScreeningResponse> {
        self.post("v1/relay", partner_id, request).await
    }
}
