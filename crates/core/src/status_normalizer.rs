//! Maps the provider's free-form responses onto [`LifecycleState`].
//!
//! The provider's status vocabulary is untyped text discovered empirically,
//! so every check is a case-insensitive substring match against one of the
//! marker lists below. Keep all such checks in this module.
//!
//! | Input                                   | Marker list             | Result          |
//! |-----------------------------------------|-------------------------|-----------------|
//! | status text                             | [`COMPLETED_MARKERS`]   | `completed`     |
//! | status text (anything else)             | --                      | `processing`    |
//! | result / submit payload                 | [`REJECTION_MARKERS`]   | `failed`        |
//! | rejected payload                        | [`BILLING_MARKERS`]     | `billing_error` |

use serde_json::Value;

use crate::lifecycle::LifecycleState;

/// Raw status substrings meaning the job finished on the provider side.
pub const COMPLETED_MARKERS: &[&str] = &["completed", "succeeded"];

/// Payload substrings meaning the request was structurally invalid for the
/// endpoint it was sent to (wrong route or a missing required field).
pub const REJECTION_MARKERS: &[&str] =
    &["path /generate", "at least one image url", "field required"];

/// Payload substrings meaning the account cannot pay for the request.
pub const BILLING_MARKERS: &[&str] = &["exhausted", "locked", "balance"];

/// JSON pointers tried, in order, when looking for the first artifact URL.
pub const RESULT_URL_POINTERS: &[&str] = &[
    "/output/images/0/url",
    "/output/images/0/image",
    "/output/images/0/file_url",
    "/images/0/url",
];

/// Outcome of reading one status response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedStatus {
    /// `Completed` or `Processing`; the result payload decides anything else.
    pub state: LifecycleState,
    /// The provider's status text exactly as received.
    pub raw_status: String,
}

/// Outcome of reading the full result payload of a finished job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultClassification {
    /// `Completed`, `Failed` or `BillingError`.
    pub state: LifecycleState,
    /// First artifact URL, only ever set for `Completed`.
    pub result_url: Option<String>,
}

fn contains_any(haystack: &str, markers: &[&str]) -> bool {
    markers.iter().any(|m| haystack.contains(m))
}

/// Lower-cased text form of a payload, used for marker scans.
fn payload_text(payload: &Value) -> String {
    match payload {
        Value::String(s) => s.to_lowercase(),
        other => other.to_string().to_lowercase(),
    }
}

/// Extract the raw `status` field of a status response.
///
/// Missing or non-string values yield an empty string.
pub fn raw_status_of(payload: &Value) -> String {
    match payload.get("status") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// Whether a raw status text means the provider finished the job.
pub fn is_completed_status(raw_status: &str) -> bool {
    contains_any(&raw_status.to_lowercase(), COMPLETED_MARKERS)
}

/// Normalize a status response.
pub fn normalize_status(payload: &Value) -> NormalizedStatus {
    let raw_status = raw_status_of(payload);
    let state = if is_completed_status(&raw_status) {
        LifecycleState::Completed
    } else {
        LifecycleState::Processing
    };
    NormalizedStatus { state, raw_status }
}

/// Pick the terminal failure state for a payload already known to be a
/// rejection. Billing markers win over everything else.
pub fn failure_state(payload: &Value) -> LifecycleState {
    if contains_any(&payload_text(payload), BILLING_MARKERS) {
        LifecycleState::BillingError
    } else {
        LifecycleState::Failed
    }
}

/// Scan a payload for rejection markers.
///
/// Returns `Some(Failed)` or `Some(BillingError)` when the payload says the
/// request cannot be processed, `None` otherwise.
pub fn classify_rejection(payload: &Value) -> Option<LifecycleState> {
    let text = payload_text(payload);
    if !contains_any(&text, REJECTION_MARKERS) {
        return None;
    }
    Some(if contains_any(&text, BILLING_MARKERS) {
        LifecycleState::BillingError
    } else {
        LifecycleState::Failed
    })
}

/// Classify the provider's answer to a submission.
///
/// A non-success HTTP status or a body carrying rejection markers is a
/// terminal failure; `None` means the submission was accepted.
pub fn classify_submission(http_success: bool, body: &Value) -> Option<LifecycleState> {
    if !http_success {
        return Some(failure_state(body));
    }
    classify_rejection(body)
}

/// First artifact URL in a result payload, following [`RESULT_URL_POINTERS`].
pub fn extract_result_url(payload: &Value) -> Option<String> {
    RESULT_URL_POINTERS.iter().find_map(|pointer| {
        payload
            .pointer(pointer)
            .and_then(Value::as_str)
            .filter(|url| !url.is_empty())
            .map(str::to_string)
    })
}

/// Classify the full result payload of a job whose status is `completed`.
pub fn classify_result(payload: &Value) -> ResultClassification {
    match classify_rejection(payload) {
        Some(state) => ResultClassification {
            state,
            result_url: None,
        },
        None => ResultClassification {
            state: LifecycleState::Completed,
            result_url: extract_result_url(payload),
        },
    }
}
