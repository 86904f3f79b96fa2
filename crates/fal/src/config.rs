//! Provider client configuration.

/// Default base URL for status and result lookups.
pub const DEFAULT_REQUESTS_URL: &str = "https://queue.fal.run/fal-ai/nano-banana-pro/requests";

/// Default per-call timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Credentials and addressing for the fal queue API.
#[derive(Debug, Clone)]
pub struct FalConfig {
    /// Sent as `Authorization: Key <api_key>` on every call.
    pub api_key: String,
    /// Base for `<requests_url>/<job_id>/status` and `<requests_url>/<job_id>`.
    pub requests_url: String,
    /// Upper bound on a single upstream call, connect through body.
    pub timeout_secs: u64,
}

impl FalConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var            | Required | Default                  |
    /// |--------------------|----------|--------------------------|
    /// | `FAL_KEY`          | **yes**  | --                       |
    /// | `FAL_REQUESTS_URL` | no       | [`DEFAULT_REQUESTS_URL`] |
    /// | `FAL_TIMEOUT_SECS` | no       | `30`                     |
    ///
    /// # Panics
    ///
    /// Panics if `FAL_KEY` is missing or `FAL_TIMEOUT_SECS` is not a valid
    /// `u64`.
    pub fn from_env() -> Self {
        let api_key = std::env::var("FAL_KEY").expect("FAL_KEY must be set");

        let requests_url =
            std::env::var("FAL_REQUESTS_URL").unwrap_or_else(|_| DEFAULT_REQUESTS_URL.into());

        let timeout_secs: u64 = std::env::var("FAL_TIMEOUT_SECS")
            .unwrap_or_else(|_| DEFAULT_TIMEOUT_SECS.to_string())
            .parse()
            .expect("FAL_TIMEOUT_SECS must be a valid u64");

        Self {
            api_key,
            requests_url: requests_url.trim_end_matches('/').to_string(),
            timeout_secs,
        }
    }

    /// Configuration pointing at an arbitrary base URL (tests, staging).
    pub fn with_requests_url(api_key: impl Into<String>, requests_url: impl Into<String>) -> Self {
        let requests_url: String = requests_url.into();
        Self {
            api_key: api_key.into(),
            requests_url: requests_url.trim_end_matches('/').to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}
