//! In-memory doubles for the lifecycle manager's two seams.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use falgate_core::endpoint::EndpointConfig;
use falgate_db::models::fallback_link::FallbackLink;
use falgate_db::models::generation_request::{
    CreateGenerationRequest, GenerationRequest, StatusUpdate,
};
use falgate_fal::{FalApiError, UpstreamProvider, UpstreamResponse};
use falgate_pipeline::store::RequestStore;
use falgate_pipeline::LifecycleManager;
use serde_json::{json, Value};

pub const TEXT_URL: &str = "http://fal.test/text";
pub const EDIT_URL: &str = "http://fal.test/edit";

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

#[derive(Default)]
struct MemoryState {
    rows: Vec<GenerationRequest>,
    links: Vec<FallbackLink>,
    next_id: i64,
}

/// Store that mirrors the conditional-update rules of the SQL repository
/// and counts status writes.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn row(&self, job_id: &str) -> Option<GenerationRequest> {
        let state = self.state.lock().unwrap();
        state
            .rows
            .iter()
            .find(|r| r.upstream_job_id.as_deref() == Some(job_id))
            .cloned()
    }

    pub fn rows(&self) -> Vec<GenerationRequest> {
        self.state.lock().unwrap().rows.clone()
    }

    pub fn links(&self) -> Vec<FallbackLink> {
        self.state.lock().unwrap().links.clone()
    }

    /// Number of `apply_status_update` calls seen.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Simulate an administrative purge of one request.
    pub fn remove(&self, job_id: &str) {
        let mut state = self.state.lock().unwrap();
        state
            .rows
            .retain(|r| r.upstream_job_id.as_deref() != Some(job_id));
    }

    fn insert(state: &mut MemoryState, input: &CreateGenerationRequest) -> GenerationRequest {
        state.next_id += 1;
        let now = chrono::Utc::now();
        let row = GenerationRequest {
            id: state.next_id,
            owner_id: input.owner_id,
            upstream_job_id: input.upstream_job_id.clone(),
            endpoint: input.endpoint,
            prompt: input.prompt.clone(),
            aspect_ratio: input.aspect_ratio.clone(),
            resolution: input.resolution.clone(),
            num_images: input.num_images,
            output_format: input.output_format.clone(),
            client_mode: input.client_mode.clone(),
            status: input.status,
            raw_status: None,
            result_url: None,
            diagnostic: input.diagnostic.clone(),
            created_at: now,
            updated_at: now,
        };
        state.rows.push(row.clone());
        row
    }
}

#[async_trait]
impl RequestStore for MemoryStore {
    async fn create(
        &self,
        input: &CreateGenerationRequest,
    ) -> Result<GenerationRequest, sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        if let Some(job_id) = &input.upstream_job_id {
            if state
                .rows
                .iter()
                .any(|r| r.upstream_job_id.as_ref() == Some(job_id))
            {
                return Err(sqlx::Error::Protocol(format!("duplicate job id {job_id}")));
            }
        }
        Ok(Self::insert(&mut state, input))
    }

    async fn find_by_job_id(
        &self,
        job_id: &str,
    ) -> Result<Option<GenerationRequest>, sqlx::Error> {
        Ok(self.row(job_id))
    }

    async fn apply_status_update(
        &self,
        job_id: &str,
        update: &StatusUpdate,
    ) -> Result<Option<GenerationRequest>, sqlx::Error> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        let Some(row) = state
            .rows
            .iter_mut()
            .find(|r| r.upstream_job_id.as_deref() == Some(job_id))
        else {
            return Ok(None);
        };
        if !row.status.can_transition_to(update.status) {
            return Ok(None);
        }
        row.status = update.status;
        if update.raw_status.is_some() {
            row.raw_status = update.raw_status.clone();
        }
        row.result_url = match update.status {
            falgate_core::lifecycle::LifecycleState::Completed => update.result_url.clone(),
            _ => None,
        };
        if update.diagnostic.is_some() {
            row.diagnostic = update.diagnostic.clone();
        }
        row.updated_at = chrono::Utc::now();
        Ok(Some(row.clone()))
    }

    async fn find_fallback(&self, job_id: &str) -> Result<Option<FallbackLink>, sqlx::Error> {
        let state = self.state.lock().unwrap();
        Ok(state
            .links
            .iter()
            .find(|l| l.original_upstream_job_id == job_id)
            .cloned())
    }

    async fn create_fallback(
        &self,
        original: &GenerationRequest,
        fallback_job_id: &str,
    ) -> Result<(FallbackLink, bool), sqlx::Error> {
        let original_job_id = original
            .upstream_job_id
            .clone()
            .ok_or(sqlx::Error::RowNotFound)?;
        let mut state = self.state.lock().unwrap();
        if let Some(existing) = state
            .links
            .iter()
            .find(|l| l.original_upstream_job_id == original_job_id)
        {
            return Ok((existing.clone(), false));
        }
        let link = FallbackLink {
            original_upstream_job_id: original_job_id,
            fallback_upstream_job_id: fallback_job_id.to_string(),
            created_at: chrono::Utc::now(),
        };
        state.links.push(link.clone());
        let row = CreateGenerationRequest::fallback_of(original, fallback_job_id);
        Self::insert(&mut state, &row);
        Ok((link, true))
    }
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

/// Provider whose answers are set per job id by the test.
pub struct ScriptedProvider {
    submit_response: Mutex<UpstreamResponse>,
    statuses: Mutex<HashMap<String, Value>>,
    results: Mutex<HashMap<String, UpstreamResponse>>,
    unreachable: AtomicBool,
    submits: Mutex<Vec<(String, Value)>>,
    status_calls: AtomicUsize,
    result_calls: AtomicUsize,
}

impl Default for ScriptedProvider {
    fn default() -> Self {
        Self {
            submit_response: Mutex::new(UpstreamResponse::new(
                200,
                json!({ "request_id": "job-1", "status": "IN_QUEUE" }),
            )),
            statuses: Mutex::new(HashMap::new()),
            results: Mutex::new(HashMap::new()),
            unreachable: AtomicBool::new(false),
            submits: Mutex::new(Vec::new()),
            status_calls: AtomicUsize::new(0),
            result_calls: AtomicUsize::new(0),
        }
    }
}

impl ScriptedProvider {
    pub fn answer_submit(&self, status: u16, body: Value) {
        *self.submit_response.lock().unwrap() = UpstreamResponse::new(status, body);
    }

    pub fn set_status(&self, job_id: &str, raw_status: &str) {
        self.statuses
            .lock()
            .unwrap()
            .insert(job_id.to_string(), json!({ "status": raw_status }));
    }

    pub fn set_result(&self, job_id: &str, status: u16, body: Value) {
        self.results
            .lock()
            .unwrap()
            .insert(job_id.to_string(), UpstreamResponse::new(status, body));
    }

    /// Make every following call fail at the transport level.
    pub fn go_offline(&self) {
        self.unreachable.store(true, Ordering::SeqCst);
    }

    pub fn submits(&self) -> Vec<(String, Value)> {
        self.submits.lock().unwrap().clone()
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn result_calls(&self) -> usize {
        self.result_calls.load(Ordering::SeqCst)
    }

    fn check_reachable(&self) -> Result<(), FalApiError> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(FalApiError::ApiError {
                status: 504,
                body: "upstream timed out".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl UpstreamProvider for ScriptedProvider {
    async fn submit(
        &self,
        endpoint_url: &str,
        payload: &Value,
    ) -> Result<UpstreamResponse, FalApiError> {
        self.submits
            .lock()
            .unwrap()
            .push((endpoint_url.to_string(), payload.clone()));
        self.check_reachable()?;
        Ok(self.submit_response.lock().unwrap().clone())
    }

    async fn status(&self, job_id: &str) -> Result<UpstreamResponse, FalApiError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.check_reachable()?;
        let body = self
            .statuses
            .lock()
            .unwrap()
            .get(job_id)
            .cloned()
            .unwrap_or_else(|| json!({ "status": "IN_QUEUE" }));
        Ok(UpstreamResponse::new(200, body))
    }

    async fn result(&self, job_id: &str) -> Result<UpstreamResponse, FalApiError> {
        self.result_calls.fetch_add(1, Ordering::SeqCst);
        self.check_reachable()?;
        Ok(self
            .results
            .lock()
            .unwrap()
            .get(job_id)
            .cloned()
            .unwrap_or_else(|| UpstreamResponse::new(200, json!({ "images": [] }))))
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

pub struct Harness {
    pub manager: Arc<LifecycleManager>,
    pub store: Arc<MemoryStore>,
    pub provider: Arc<ScriptedProvider>,
}

pub fn harness() -> Harness {
    let store = Arc::new(MemoryStore::default());
    let provider = Arc::new(ScriptedProvider::default());
    let endpoints = EndpointConfig {
        text_endpoint: TEXT_URL.to_string(),
        edit_endpoint: EDIT_URL.to_string(),
    };
    let manager = Arc::new(LifecycleManager::new(
        provider.clone(),
        store.clone(),
        endpoints,
    ));
    Harness {
        manager,
        store,
        provider,
    }
}
