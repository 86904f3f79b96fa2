//! The lifecycle manager: submission, polling and fallback relay.
//!
//! ```text
//! submit ──> select endpoint ──> provider.submit ──> store.create
//!                                     │
//!                                     └─ rejected ──> store.create(failed | billing_error)
//!
//! poll ──> lock(job_id) ──> store ──terminal──> answer from store
//!                             │
//!                             ├─ fallback link ──> relay to the substituted job
//!                             │
//!                             └─ provider.status ──> normalize ──> [provider.result] ──> store
//! ```

use std::sync::Arc;

use falgate_core::endpoint::{self, EndpointConfig, EndpointId};
use falgate_core::generation::{upstream_payload, validate_input, GenerationInput};
use falgate_core::lifecycle::LifecycleState;
use falgate_core::status_normalizer::{classify_result, classify_submission, normalize_status};
use falgate_core::types::DbId;
use falgate_db::models::fallback_link::FallbackLink;
use falgate_db::models::generation_request::{
    CreateGenerationRequest, GenerationRequest, StatusUpdate,
};
use falgate_fal::UpstreamProvider;
use serde::Serialize;
use serde_json::Value;

use crate::error::{LifecycleError, UpstreamCall};
use crate::locks::JobLocks;
use crate::store::RequestStore;

/// Upper bound on fallback links followed by one poll. Links always point
/// at freshly created rows, so a chain this long means corrupted data.
const MAX_RELAY_HOPS: usize = 8;

/// A submission the provider accepted.
#[derive(Debug, Clone, Serialize)]
pub struct AcceptedSubmission {
    pub job_id: String,
    pub endpoint: EndpointId,
    pub endpoint_url: String,
    pub request: GenerationRequest,
}

/// Normalized answer to one poll.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PollOutcome {
    /// The job id the caller asked about.
    pub job_id: String,
    #[serde(rename = "status")]
    pub state: LifecycleState,
    /// Provider status text as last observed.
    pub raw_status: Option<String>,
    pub result_url: Option<String>,
    /// Provider payload explaining a terminal failure.
    pub diagnostic: Option<Value>,
    /// Set when the caller's job was substituted by another one.
    pub fallback_job_id: Option<String>,
}

impl PollOutcome {
    fn from_request(job_id: &str, request: &GenerationRequest) -> Self {
        Self {
            job_id: job_id.to_string(),
            state: request.status,
            raw_status: request.raw_status.clone(),
            result_url: request.result_url.clone(),
            diagnostic: request.diagnostic.clone(),
            fallback_job_id: None,
        }
    }
}

/// Result of one locked step of a poll.
enum PollStep {
    Done(PollOutcome),
    /// The job is relayed; continue with this id.
    Follow(String),
}

/// Orchestrates submission and polling of generation requests.
///
/// Created once at startup and shared behind an `Arc`. Holds no timers;
/// every provider call happens inside a caller's request.
pub struct LifecycleManager {
    provider: Arc<dyn UpstreamProvider>,
    store: Arc<dyn RequestStore>,
    endpoints: EndpointConfig,
    locks: JobLocks,
}

impl LifecycleManager {
    pub fn new(
        provider: Arc<dyn UpstreamProvider>,
        store: Arc<dyn RequestStore>,
        endpoints: EndpointConfig,
    ) -> Self {
        Self {
            provider,
            store,
            endpoints,
            locks: JobLocks::new(),
        }
    }

    pub fn endpoints(&self) -> &EndpointConfig {
        &self.endpoints
    }

    // -----------------------------------------------------------------------
    // Submit
    // -----------------------------------------------------------------------

    /// Validate, pick an endpoint, submit once and record the attempt.
    ///
    /// Provider rejections are recorded as terminal rows and returned as
    /// [`LifecycleError::UpstreamRejected`] or [`LifecycleError::Billing`].
    /// Validation and transport failures record nothing.
    pub async fn submit(
        &self,
        owner_id: DbId,
        input: GenerationInput,
    ) -> Result<AcceptedSubmission, LifecycleError> {
        validate_input(&input)?;

        let endpoint = endpoint::select(input.has_reference_images());
        let endpoint_url = self.endpoints.url_for(endpoint).to_string();
        let payload = upstream_payload(&input);

        tracing::info!(
            owner_id,
            endpoint = %endpoint,
            reference_images = input.reference_image_urls.len(),
            num_images = input.num_images,
            prompt = %input.prompt_preview(),
            "Submitting generation request",
        );

        let response = self
            .provider
            .submit(&endpoint_url, &payload)
            .await
            .map_err(|e| {
                tracing::warn!(owner_id, endpoint = %endpoint, error = %e, "Provider unreachable");
                LifecycleError::transport(UpstreamCall::Submit)(e)
            })?;

        let job_id = response.job_id();
        let rejection = classify_submission(response.is_success(), &response.body)
            .or_else(|| job_id.is_none().then_some(LifecycleState::Failed));

        if let Some(state) = rejection {
            let diagnostic = response.body;
            let row = CreateGenerationRequest::from_input(owner_id, &input, endpoint, None, state)
                .with_diagnostic(diagnostic.clone());
            let stored = self.store.create(&row).await?;

            tracing::warn!(
                owner_id,
                request_id = stored.id,
                endpoint = %endpoint,
                http_status = response.status,
                state = %state,
                "Provider rejected submission",
            );

            return Err(match state {
                LifecycleState::BillingError => LifecycleError::Billing { diagnostic },
                _ => LifecycleError::UpstreamRejected { diagnostic },
            });
        }

        // The rejection check above covers a missing id.
        let job_id = job_id.unwrap_or_default();
        let row = CreateGenerationRequest::from_input(
            owner_id,
            &input,
            endpoint,
            Some(job_id.clone()),
            LifecycleState::Submitted,
        );
        let request = self.store.create(&row).await?;

        tracing::info!(
            owner_id,
            request_id = request.id,
            job_id = %job_id,
            endpoint = %endpoint,
            "Generation request submitted",
        );

        Ok(AcceptedSubmission {
            job_id,
            endpoint,
            endpoint_url,
            request,
        })
    }

    // -----------------------------------------------------------------------
    // Poll
    // -----------------------------------------------------------------------

    /// Run one poll cycle for `job_id` and return the normalized outcome.
    ///
    /// Terminal records are answered from the store. Transport failures
    /// return [`LifecycleError::Transport`] and leave the record untouched.
    pub async fn poll(&self, job_id: &str) -> Result<PollOutcome, LifecycleError> {
        let mut current = job_id.to_string();

        for _ in 0..=MAX_RELAY_HOPS {
            match self.poll_step(&current).await? {
                PollStep::Done(mut outcome) => {
                    if current != job_id {
                        outcome.job_id = job_id.to_string();
                        outcome.fallback_job_id = outcome.fallback_job_id.or(Some(current));
                    }
                    return Ok(outcome);
                }
                PollStep::Follow(next) => {
                    tracing::debug!(
                        job_id = %current,
                        fallback_job_id = %next,
                        "Following fallback link"
                    );
                    current = next;
                }
            }
        }

        Err(LifecycleError::Conflict(format!(
            "Fallback chain for job {job_id} is longer than {MAX_RELAY_HOPS} links"
        )))
    }

    /// One poll cycle on a single id, under that id's lock.
    async fn poll_step(&self, job_id: &str) -> Result<PollStep, LifecycleError> {
        let _guard = self.locks.acquire(job_id).await;

        let request = self
            .store
            .find_by_job_id(job_id)
            .await?
            .ok_or_else(|| LifecycleError::not_found(job_id))?;

        if request.status.is_terminal() {
            tracing::debug!(
                job_id,
                state = %request.status,
                "Answering terminal request from store"
            );
            return Ok(PollStep::Done(PollOutcome::from_request(job_id, &request)));
        }

        if let Some(link) = self.store.find_fallback(job_id).await? {
            return self.relay(&request, link).await;
        }

        self.poll_upstream(job_id, &request)
            .await
            .map(PollStep::Done)
    }

    /// First poll after a substitution marks the original as relayed and
    /// reports the new id; later polls follow the new id.
    async fn relay(
        &self,
        request: &GenerationRequest,
        link: FallbackLink,
    ) -> Result<PollStep, LifecycleError> {
        let job_id = link.original_upstream_job_id.as_str();
        if request.status == LifecycleState::FallbackCreated {
            return Ok(PollStep::Follow(link.fallback_upstream_job_id));
        }

        let update = StatusUpdate {
            status: LifecycleState::FallbackCreated,
            raw_status: None,
            result_url: None,
            diagnostic: None,
        };
        let stored = self.write(job_id, &update).await?;

        tracing::info!(
            job_id,
            fallback_job_id = %link.fallback_upstream_job_id,
            "Request relayed to fallback job",
        );

        let mut outcome = PollOutcome::from_request(job_id, &stored);
        outcome.fallback_job_id = Some(link.fallback_upstream_job_id);
        Ok(PollStep::Done(outcome))
    }

    /// Ask the provider, classify, persist.
    async fn poll_upstream(
        &self,
        job_id: &str,
        request: &GenerationRequest,
    ) -> Result<PollOutcome, LifecycleError> {
        let status = self
            .provider
            .status(job_id)
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                tracing::warn!(job_id, error = %e, "Status check failed");
                LifecycleError::transport(UpstreamCall::Status)(e)
            })?;

        let normalized = normalize_status(&status.body);

        if normalized.state != LifecycleState::Completed {
            let unchanged = request.status == LifecycleState::Processing
                && request.raw_status.as_deref() == Some(normalized.raw_status.as_str());
            if unchanged {
                tracing::debug!(job_id, raw_status = %normalized.raw_status, "Status unchanged");
                return Ok(PollOutcome::from_request(job_id, request));
            }

            let update = StatusUpdate {
                status: LifecycleState::Processing,
                raw_status: Some(normalized.raw_status.clone()),
                result_url: None,
                diagnostic: None,
            };
            let stored = self.write(job_id, &update).await?;
            tracing::debug!(job_id, raw_status = %normalized.raw_status, "Request processing");
            return Ok(PollOutcome::from_request(job_id, &stored));
        }

        let result = self.provider.result(job_id).await.map_err(|e| {
            tracing::warn!(job_id, error = %e, "Result fetch failed");
            LifecycleError::transport(UpstreamCall::Result)(e)
        })?;

        let classification = classify_result(&result.body);
        let update = match classification.state {
            LifecycleState::Completed => {
                // A non-2xx body without rejection markers is not a verdict.
                result.error_for_status().map_err(|e| {
                    tracing::warn!(job_id, error = %e, "Result fetch returned an error status");
                    LifecycleError::transport(UpstreamCall::Result)(e)
                })?;
                if classification.result_url.is_none() {
                    tracing::warn!(job_id, "Completed result carries no artifact URL");
                }
                StatusUpdate {
                    status: LifecycleState::Completed,
                    raw_status: Some(normalized.raw_status),
                    result_url: classification.result_url,
                    diagnostic: None,
                }
            }
            state => StatusUpdate {
                status: state,
                raw_status: Some(normalized.raw_status),
                result_url: None,
                diagnostic: Some(result.body),
            },
        };

        let stored = self.write(job_id, &update).await?;
        tracing::info!(
            job_id,
            request_id = stored.id,
            state = %stored.status,
            result_url = stored.result_url.as_deref().unwrap_or(""),
            "Request reached terminal state",
        );
        Ok(PollOutcome::from_request(job_id, &stored))
    }

    /// Conditional write. When the store refuses (the row moved on or
    /// vanished meanwhile) the current row wins.
    async fn write(
        &self,
        job_id: &str,
        update: &StatusUpdate,
    ) -> Result<GenerationRequest, LifecycleError> {
        if let Some(stored) = self.store.apply_status_update(job_id, update).await? {
            return Ok(stored);
        }
        tracing::debug!(job_id, state = %update.status, "Status update refused, re-reading");
        self.store
            .find_by_job_id(job_id)
            .await?
            .ok_or_else(|| LifecycleError::not_found(job_id))
    }

    // -----------------------------------------------------------------------
    // Fallback links
    // -----------------------------------------------------------------------

    /// Record that `fallback_job_id` replaces `original_job_id`.
    ///
    /// Creates the fallback's request row (same owner, prompt and
    /// parameters) and the link. Repeating the same link is a no-op.
    pub async fn link_fallback(
        &self,
        original_job_id: &str,
        fallback_job_id: &str,
    ) -> Result<FallbackLink, LifecycleError> {
        let original_job_id = original_job_id.trim();
        let fallback_job_id = fallback_job_id.trim();
        if original_job_id.is_empty() || fallback_job_id.is_empty() {
            return Err(LifecycleError::Validation(
                "Both job ids are required".to_string(),
            ));
        }
        if original_job_id == fallback_job_id {
            return Err(LifecycleError::Validation(
                "A job cannot fall back to itself".to_string(),
            ));
        }

        let _guard = self.locks.acquire(original_job_id).await;

        let original = self
            .store
            .find_by_job_id(original_job_id)
            .await?
            .ok_or_else(|| LifecycleError::not_found(original_job_id))?;

        if let Some(existing) = self.store.find_fallback(original_job_id).await? {
            return Self::same_link(existing, fallback_job_id);
        }

        if original.status.is_terminal() {
            return Err(LifecycleError::Conflict(format!(
                "Job {original_job_id} is already {}",
                original.status
            )));
        }

        if self.store.find_by_job_id(fallback_job_id).await?.is_some() {
            return Err(LifecycleError::Conflict(format!(
                "Job {fallback_job_id} is already tracked"
            )));
        }

        let (link, created) = self.store.create_fallback(&original, fallback_job_id).await?;
        if !created {
            return Self::same_link(link, fallback_job_id);
        }

        tracing::info!(
            job_id = original_job_id,
            fallback_job_id,
            owner_id = original.owner_id,
            "Fallback link recorded",
        );
        Ok(link)
    }

    fn same_link(
        existing: FallbackLink,
        fallback_job_id: &str,
    ) -> Result<FallbackLink, LifecycleError> {
        if existing.fallback_upstream_job_id == fallback_job_id {
            Ok(existing)
        } else {
            Err(LifecycleError::Conflict(format!(
                "Job {} already falls back to {}",
                existing.original_upstream_job_id, existing.fallback_upstream_job_id
            )))
        }
    }
}
