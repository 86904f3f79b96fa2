//! The closed set of lifecycle states a generation request moves through.
//!
//! States are derived by this system, never copied from the provider. The
//! provider's own vocabulary is mapped onto them by
//! [`crate::status_normalizer`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Lifecycle state of a generation request.
///
/// ```text
/// submitted -> processing -> completed | failed | billing_error
///           \-> fallback_created (relay to a substituted job id)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Submitted,
    Processing,
    Completed,
    Failed,
    BillingError,
    FallbackCreated,
}

/// States from which no further transition is permitted.
pub const TERMINAL_STATES: [LifecycleState; 3] = [
    LifecycleState::Completed,
    LifecycleState::Failed,
    LifecycleState::BillingError,
];

impl LifecycleState {
    /// String representation used in the `status` column and in API payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Submitted => "submitted",
            LifecycleState::Processing => "processing",
            LifecycleState::Completed => "completed",
            LifecycleState::Failed => "failed",
            LifecycleState::BillingError => "billing_error",
            LifecycleState::FallbackCreated => "fallback_created",
        }
    }

    /// `true` for `completed`, `failed` and `billing_error`.
    pub fn is_terminal(&self) -> bool {
        TERMINAL_STATES.contains(self)
    }

    /// Whether a stored request in `self` may be moved to `next`.
    ///
    /// Terminal states accept no transition at all, not even to themselves.
    /// A relayed request stays relayed: its progress is tracked on the
    /// fallback job's own row.
    pub fn can_transition_to(&self, next: LifecycleState) -> bool {
        match self {
            s if s.is_terminal() => false,
            LifecycleState::FallbackCreated => next == LifecycleState::FallbackCreated,
            _ => true,
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LifecycleState {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "submitted" => Ok(LifecycleState::Submitted),
            "processing" => Ok(LifecycleState::Processing),
            "completed" => Ok(LifecycleState::Completed),
            "failed" => Ok(LifecycleState::Failed),
            "billing_error" => Ok(LifecycleState::BillingError),
            "fallback_created" => Ok(LifecycleState::FallbackCreated),
            other => Err(CoreError::Validation(format!(
                "Unknown lifecycle state '{other}'"
            ))),
        }
    }
}

impl TryFrom<String> for LifecycleState {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
