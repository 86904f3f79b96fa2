use std::fmt;

use falgate_core::error::CoreError;
use falgate_fal::FalApiError;
use serde_json::Value;

/// Which upstream call a transport failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamCall {
    Submit,
    Status,
    Result,
}

impl fmt::Display for UpstreamCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UpstreamCall::Submit => "submission",
            UpstreamCall::Status => "status check",
            UpstreamCall::Result => "result fetch",
        })
    }
}

/// Errors returned by [`crate::LifecycleManager`].
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    /// Input rejected before anything was sent or stored.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The provider refused the request; a `failed` row was recorded.
    #[error("Upstream rejected the request")]
    UpstreamRejected { diagnostic: Value },

    /// The provider refused the request for billing reasons; a
    /// `billing_error` row was recorded.
    #[error("Upstream billing error")]
    Billing { diagnostic: Value },

    /// The upstream exchange did not complete. Nothing was persisted.
    #[error("Upstream {during} failed: {source}")]
    Transport {
        during: UpstreamCall,
        #[source]
        source: FalApiError,
    },

    #[error("Generation request not found: {job_id}")]
    NotFound { job_id: String },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Store error: {0}")]
    Store(#[from] sqlx::Error),
}

impl LifecycleError {
    pub(crate) fn transport(during: UpstreamCall) -> impl FnOnce(FalApiError) -> Self {
        move |source| LifecycleError::Transport { during, source }
    }

    pub(crate) fn not_found(job_id: &str) -> Self {
        LifecycleError::NotFound {
            job_id: job_id.to_string(),
        }
    }
}

impl From<CoreError> for LifecycleError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(msg) => LifecycleError::Validation(msg),
            CoreError::NotFound { id, .. } => LifecycleError::NotFound { job_id: id },
            CoreError::Conflict(msg) => LifecycleError::Conflict(msg),
            other => LifecycleError::Validation(other.to_string()),
        }
    }
}
