//! Upstream endpoint selection.
//!
//! A submission goes to the `edit` endpoint when it carries reference images
//! and to the `generate` endpoint otherwise. The choice is made once, at
//! submit time, and stored with the request.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Default text-to-image endpoint (no extra `/generate` path segment).
pub const DEFAULT_TEXT_ENDPOINT: &str = "https://queue.fal.run/fal-ai/nano-banana-pro";
/// Default image-edit endpoint.
pub const DEFAULT_EDIT_ENDPOINT: &str = "https://queue.fal.run/fal-ai/nano-banana-pro/edit";

/// Which of the two configured upstream endpoints a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointId {
    /// Text-only generation.
    Generate,
    /// Generation guided by one or more reference images.
    Edit,
}

impl EndpointId {
    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointId::Generate => "generate",
            EndpointId::Edit => "edit",
        }
    }
}

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EndpointId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "generate" => Ok(EndpointId::Generate),
            "edit" => Ok(EndpointId::Edit),
            other => Err(CoreError::Validation(format!("Unknown endpoint '{other}'"))),
        }
    }
}

impl TryFrom<String> for EndpointId {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Pick the endpoint for a submission.
pub fn select(has_reference_images: bool) -> EndpointId {
    if has_reference_images {
        EndpointId::Edit
    } else {
        EndpointId::Generate
    }
}

/// The two upstream endpoint URLs.
///
/// Passed to the lifecycle manager at construction so tests can point it at
/// fake endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    pub text_endpoint: String,
    pub edit_endpoint: String,
}

impl EndpointConfig {
    /// Load endpoint URLs from the environment.
    ///
    /// | Env Var                | Default                   |
    /// |------------------------|---------------------------|
    /// | `TEXT_MODEL_ENDPOINT`  | [`DEFAULT_TEXT_ENDPOINT`] |
    /// | `IMAGE_MODEL_ENDPOINT` | [`DEFAULT_EDIT_ENDPOINT`] |
    pub fn from_env() -> Self {
        Self {
            text_endpoint: std::env::var("TEXT_MODEL_ENDPOINT")
                .unwrap_or_else(|_| DEFAULT_TEXT_ENDPOINT.into()),
            edit_endpoint: std::env::var("IMAGE_MODEL_ENDPOINT")
                .unwrap_or_else(|_| DEFAULT_EDIT_ENDPOINT.into()),
        }
    }

    /// URL for the given endpoint.
    pub fn url_for(&self, endpoint: EndpointId) -> &str {
        match endpoint {
            EndpointId::Generate => &self.text_endpoint,
            EndpointId::Edit => &self.edit_endpoint,
        }
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            text_endpoint: DEFAULT_TEXT_ENDPOINT.to_string(),
            edit_endpoint: DEFAULT_EDIT_ENDPOINT.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_reference_images_selects_generate() {
        assert_eq!(select(false), EndpointId::Generate);
    }

    #[test]
    fn reference_images_select_edit() {
        for count in 1..=4usize {
            assert_eq!(select(count > 0), EndpointId::Edit);
        }
    }

    #[test]
    fn url_for_maps_each_endpoint() {
        let config = EndpointConfig {
            text_endpoint: "http://text".into(),
            edit_endpoint: "http://edit".into(),
        };
        assert_eq!(config.url_for(EndpointId::Generate), "http://text");
        assert_eq!(config.url_for(EndpointId::Edit), "http://edit");
    }

    #[test]
    fn endpoint_id_parses_its_own_name() {
        assert_eq!("edit".parse::<EndpointId>().unwrap(), EndpointId::Edit);
        assert_eq!(
            "generate".parse::<EndpointId>().unwrap(),
            EndpointId::Generate
        );
        assert!("upscale".parse::<EndpointId>().is_err());
    }
}
