//! The seam between the lifecycle manager and the provider transport.

use async_trait::async_trait;
use serde_json::Value;

use crate::api::FalApiError;

/// One upstream HTTP exchange: status code plus body.
///
/// Non-2xx answers are not errors at this layer; they carry rejection
/// details the classifier needs to see.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamResponse {
    pub status: u16,
    /// Parsed JSON, or the raw text wrapped in [`Value::String`] when the
    /// body was not JSON.
    pub body: Value,
}

impl UpstreamResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    /// `true` for 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turn a non-2xx answer into [`FalApiError::ApiError`].
    pub fn error_for_status(self) -> Result<Self, FalApiError> {
        if self.is_success() {
            return Ok(self);
        }
        let body = match self.body {
            Value::String(text) => text,
            other => other.to_string(),
        };
        Err(FalApiError::ApiError {
            status: self.status,
            body,
        })
    }

    /// The job id issued by the provider, from `request_id` or `requestId`.
    pub fn job_id(&self) -> Option<String> {
        ["request_id", "requestId"].iter().find_map(|key| {
            self.body
                .get(key)
                .and_then(Value::as_str)
                .filter(|id| !id.is_empty())
                .map(str::to_string)
        })
    }
}

/// Submit/status/result calls against the provider.
///
/// Implementations hold no per-job state and never retry. A returned
/// [`FalApiError`] always means the exchange did not complete (timeout,
/// connection failure, unreadable body).
#[async_trait]
pub trait UpstreamProvider: Send + Sync {
    /// `POST <endpoint_url>` with the given payload.
    async fn submit(
        &self,
        endpoint_url: &str,
        payload: &Value,
    ) -> Result<UpstreamResponse, FalApiError>;

    /// `GET <requests_url>/<job_id>/status`.
    async fn status(&self, job_id: &str) -> Result<UpstreamResponse, FalApiError>;

    /// `GET <requests_url>/<job_id>`.
    async fn result(&self, job_id: &str) -> Result<UpstreamResponse, FalApiError>;
}
