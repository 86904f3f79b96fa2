//! Shared harness for the HTTP integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use falgate_api::auth::jwt::{generate_access_token, JwtConfig};
use falgate_api::auth::password::hash_password;
use falgate_api::config::ServerConfig;
use falgate_api::router::build_app_router;
use falgate_api::state::AppState;
use falgate_core::endpoint::EndpointConfig;
use falgate_db::models::user::{CreateUser, User};
use falgate_db::repositories::UserRepo;
use falgate_fal::{FalApiError, UpstreamProvider, UpstreamResponse};
use falgate_pipeline::{LifecycleManager, PgRequestStore};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sqlx::PgPool;
use tempfile::TempDir;
use tower::ServiceExt;

pub const TEST_PASSWORD: &str = "test_password_123";

// ---------------------------------------------------------------------------
// Provider double
// ---------------------------------------------------------------------------

/// Provider that issues `job-1`, `job-2`, ... and answers polls from
/// per-job scripts.
#[derive(Default)]
pub struct FakeProvider {
    next_job: AtomicUsize,
    submit_override: Mutex<Option<UpstreamResponse>>,
    statuses: Mutex<HashMap<String, String>>,
    results: Mutex<HashMap<String, Value>>,
    unreachable: AtomicBool,
}

impl FakeProvider {
    /// Answer every following submission with this response.
    pub fn answer_submit(&self, status: u16, body: Value) {
        *self.submit_override.lock().unwrap() = Some(UpstreamResponse::new(status, body));
    }

    pub fn set_status(&self, job_id: &str, raw_status: &str) {
        self.statuses
            .lock()
            .unwrap()
            .insert(job_id.to_string(), raw_status.to_string());
    }

    pub fn set_result(&self, job_id: &str, body: Value) {
        self.results
            .lock()
            .unwrap()
            .insert(job_id.to_string(), body);
    }

    pub fn go_offline(&self) {
        self.unreachable.store(true, Ordering::SeqCst);
    }

    fn check_reachable(&self) -> Result<(), FalApiError> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(FalApiError::ApiError {
                status: 504,
                body: "gateway timeout".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl UpstreamProvider for FakeProvider {
    async fn submit(
        &self,
        _endpoint_url: &str,
        _payload: &Value,
    ) -> Result<UpstreamResponse, FalApiError> {
        self.check_reachable()?;
        if let Some(response) = self.submit_override.lock().unwrap().clone() {
            return Ok(response);
        }
        let n = self.next_job.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(UpstreamResponse::new(
            200,
            json!({ "request_id": format!("job-{n}"), "status": "IN_QUEUE" }),
        ))
    }

    async fn status(&self, job_id: &str) -> Result<UpstreamResponse, FalApiError> {
        self.check_reachable()?;
        let raw = self
            .statuses
            .lock()
            .unwrap()
            .get(job_id)
            .cloned()
            .unwrap_or_else(|| "IN_QUEUE".to_string());
        Ok(UpstreamResponse::new(200, json!({ "status": raw })))
    }

    async fn result(&self, job_id: &str) -> Result<UpstreamResponse, FalApiError> {
        self.check_reachable()?;
        let body = self
            .results
            .lock()
            .unwrap()
            .get(job_id)
            .cloned()
            .unwrap_or_else(|| json!({ "images": [] }));
        Ok(UpstreamResponse::new(200, body))
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config(log_dir: &TempDir) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "test-jwt-secret-for-integration-tests".to_string(),
            access_token_expiry_mins: 60,
        },
        client_log_path: log_dir.path().join("client-errors.log"),
        admin_bootstrap: None,
    }
}

/// A router wired to a real database and a [`FakeProvider`].
pub struct TestApp {
    pub router: Router,
    pub provider: Arc<FakeProvider>,
    pub config: ServerConfig,
    pub pool: PgPool,
    _log_dir: TempDir,
}

impl TestApp {
    /// A fresh handle for one request; `oneshot` consumes the router.
    pub fn app(&self) -> Router {
        self.router.clone()
    }

    pub fn token_for(&self, user: &User) -> String {
        generate_access_token(user.id, user.role(), &self.config.jwt)
            .expect("token generation should succeed")
    }
}

/// Build the full application router with the production middleware stack.
pub fn build_test_app(pool: PgPool) -> TestApp {
    let log_dir = tempfile::tempdir().expect("tempdir should be created");
    let config = test_config(&log_dir);
    let provider = Arc::new(FakeProvider::default());

    let endpoints = EndpointConfig {
        text_endpoint: "http://fal.test/text".to_string(),
        edit_endpoint: "http://fal.test/edit".to_string(),
    };
    let lifecycle = LifecycleManager::new(
        provider.clone(),
        Arc::new(PgRequestStore::new(pool.clone())),
        endpoints,
    );

    let state = AppState {
        pool: pool.clone(),
        config: Arc::new(config.clone()),
        lifecycle: Arc::new(lifecycle),
    };
    let router = build_app_router(state, &config);

    TestApp {
        router,
        provider,
        config,
        pool,
        _log_dir: log_dir,
    }
}

/// Insert a user with [`TEST_PASSWORD`].
pub async fn create_user(pool: &PgPool, username: &str, is_admin: bool) -> User {
    let password_hash = hash_password(TEST_PASSWORD).expect("hashing should succeed");
    UserRepo::create(
        pool,
        &CreateUser {
            username: username.to_string(),
            password_hash,
            is_admin,
        },
    )
    .await
    .expect("user creation should succeed")
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn body_json(response: Response) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response {
    send(app, Method::GET, uri, None, None).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response {
    send(app, Method::POST, uri, None, Some(body)).await
}

pub async fn post_json_auth(app: Router, uri: &str, body: Value, token: &str) -> Response {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn put_json_auth(app: Router, uri: &str, body: Value, token: &str) -> Response {
    send(app, Method::PUT, uri, Some(token), Some(body)).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response {
    send(app, Method::DELETE, uri, Some(token), None).await
}

/// POST a multipart body built from `(field, content_type, content)` parts.
pub async fn post_multipart_auth(
    app: Router,
    uri: &str,
    parts: &[(&str, &str, &str)],
    token: &str,
) -> Response {
    const BOUNDARY: &str = "falgate-test-boundary";
    let mut body = Vec::new();
    for (i, (field, content_type, content)) in parts.iter().enumerate() {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{field}\"; filename=\"file{i}\"\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
        body.extend_from_slice(content.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();
    app.oneshot(request).await.unwrap()
}
