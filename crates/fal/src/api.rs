//! REST client for the fal queue endpoints, built on [`reqwest`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

use crate::config::FalConfig;
use crate::provider::{UpstreamProvider, UpstreamResponse};

/// Errors from the fal transport layer.
///
/// HTTP error statuses come back as an [`UpstreamResponse`] for
/// classification; [`FalApiError::ApiError`] is only produced when a caller
/// decides a status is unusable (see [`UpstreamResponse::error_for_status`]).
#[derive(Debug, thiserror::Error)]
pub enum FalApiError {
    /// The HTTP exchange failed (timeout, DNS, TLS, connection reset, ...).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider answered with a non-2xx status the caller cannot use.
    #[error("fal API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The configured key cannot be used as a header value.
    #[error("Invalid API key: {0}")]
    InvalidApiKey(#[from] reqwest::header::InvalidHeaderValue),
}

impl FalApiError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, FalApiError::Request(e) if e.is_timeout())
    }
}

/// HTTP client for the fal queue API.
pub struct FalApi {
    client: reqwest::Client,
    requests_url: String,
}

impl FalApi {
    /// Build a client with the credential header and timeout baked in.
    pub fn new(config: &FalConfig) -> Result<Self, FalApiError> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Key {}", config.api_key))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            requests_url: config.requests_url.clone(),
        })
    }

    /// Read status and body, keeping non-JSON bodies as text.
    async fn read_response(response: reqwest::Response) -> Result<UpstreamResponse, FalApiError> {
        let status = response.status().as_u16();
        let text = response.text().await?;
        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
        Ok(UpstreamResponse { status, body })
    }
}

#[async_trait]
impl UpstreamProvider for FalApi {
    async fn submit(
        &self,
        endpoint_url: &str,
        payload: &Value,
    ) -> Result<UpstreamResponse, FalApiError> {
        tracing::debug!(endpoint_url, "Submitting job to provider");
        let response = self.client.post(endpoint_url).json(payload).send().await?;
        Self::read_response(response).await
    }

    async fn status(&self, job_id: &str) -> Result<UpstreamResponse, FalApiError> {
        let response = self
            .client
            .get(format!("{}/{job_id}/status", self.requests_url))
            .send()
            .await?;
        Self::read_response(response).await
    }

    async fn result(&self, job_id: &str) -> Result<UpstreamResponse, FalApiError> {
        let response = self
            .client
            .get(format!("{}/{job_id}", self.requests_url))
            .send()
            .await?;
        Self::read_response(response).await
    }
}
