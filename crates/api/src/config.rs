use std::path::PathBuf;

use crate::auth::jwt::JwtConfig;

/// Default file that client error reports are appended to.
pub const DEFAULT_CLIENT_LOG_PATH: &str = "client-errors.log";

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development except the JWT
/// secret. Provider settings live in [`falgate_fal::FalConfig`] and
/// [`falgate_core::endpoint::EndpointConfig`].
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `4000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `60`).
    pub request_timeout_secs: u64,
    /// JWT token configuration (secret, expiry).
    pub jwt: JwtConfig,
    /// Append-only file for `POST /client-errors`, tailed by `GET /admin/logs`.
    pub client_log_path: PathBuf,
    /// Admin account ensured at startup, if configured.
    pub admin_bootstrap: Option<AdminBootstrap>,
}

/// Credentials for the startup admin account.
#[derive(Clone)]
pub struct AdminBootstrap {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for AdminBootstrap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminBootstrap")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                 |
    /// |------------------------|-------------------------|
    /// | `HOST`                 | `0.0.0.0`               |
    /// | `PORT`                 | `4000`                  |
    /// | `CORS_ORIGINS`         | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS` | `60`                    |
    /// | `CLIENT_LOG_PATH`      | `client-errors.log`     |
    /// | `ADMIN_USERNAME`       | unset                   |
    /// | `ADMIN_PASSWORD`       | unset                   |
    ///
    /// The request timeout must exceed the provider timeout
    /// (`FAL_TIMEOUT_SECS`) or slow provider calls surface as 408 instead of
    /// 502.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "4000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "60".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let client_log_path = std::env::var("CLIENT_LOG_PATH")
            .unwrap_or_else(|_| DEFAULT_CLIENT_LOG_PATH.into())
            .into();

        let admin_bootstrap = match (
            std::env::var("ADMIN_USERNAME"),
            std::env::var("ADMIN_PASSWORD"),
        ) {
            (Ok(username), Ok(password)) if !username.is_empty() && !password.is_empty() => {
                Some(AdminBootstrap { username, password })
            }
            _ => None,
        };

        let jwt = JwtConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            jwt,
            client_log_path,
            admin_bootstrap,
        }
    }
}
