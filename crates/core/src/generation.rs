//! Generation request input, defaults, validation and upstream payload shape.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Defaults and limits
// ---------------------------------------------------------------------------

/// Maximum number of reference images per request.
pub const MAX_REFERENCE_IMAGES: usize = 4;
/// Smallest allowed `num_images`.
pub const MIN_NUM_IMAGES: i32 = 1;
/// Largest allowed `num_images`.
pub const MAX_NUM_IMAGES: i32 = 4;

pub const DEFAULT_ASPECT_RATIO: &str = "auto";
pub const DEFAULT_RESOLUTION: &str = "1K";
pub const DEFAULT_OUTPUT_FORMAT: &str = "png";

/// Number of prompt characters included in log lines.
pub const PROMPT_LOG_PREVIEW_CHARS: usize = 120;

fn default_num_images() -> i32 {
    MIN_NUM_IMAGES
}

fn default_aspect_ratio() -> String {
    DEFAULT_ASPECT_RATIO.to_string()
}

fn default_resolution() -> String {
    DEFAULT_RESOLUTION.to_string()
}

fn default_output_format() -> String {
    DEFAULT_OUTPUT_FORMAT.to_string()
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// A generation request as submitted by a client.
///
/// Missing optional fields take the provider's documented defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct GenerationInput {
    /// Missing deserializes as empty so it fails validation like a blank one.
    #[serde(default)]
    #[validate(custom(function = "validate_prompt"))]
    pub prompt: String,

    #[serde(default, alias = "image_urls")]
    #[validate(length(
        max = 4,
        message = "At most 4 reference images may be attached"
    ))]
    pub reference_image_urls: Vec<String>,

    #[serde(default = "default_num_images")]
    #[validate(range(min = 1, max = 4, message = "num_images must be between 1 and 4"))]
    pub num_images: i32,

    #[serde(default = "default_aspect_ratio")]
    pub aspect_ratio: String,

    #[serde(default = "default_resolution")]
    pub resolution: String,

    #[serde(default = "default_output_format")]
    pub output_format: String,

    /// Free-form UI mode tag recorded for history views.
    #[serde(default)]
    pub client_mode: Option<String>,
}

impl GenerationInput {
    /// A text-only request with default parameters.
    pub fn from_prompt(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            reference_image_urls: Vec::new(),
            num_images: default_num_images(),
            aspect_ratio: default_aspect_ratio(),
            resolution: default_resolution(),
            output_format: default_output_format(),
            client_mode: None,
        }
    }

    pub fn has_reference_images(&self) -> bool {
        !self.reference_image_urls.is_empty()
    }

    /// Truncated prompt for log lines.
    pub fn prompt_preview(&self) -> String {
        self.prompt.chars().take(PROMPT_LOG_PREVIEW_CHARS).collect()
    }
}

fn validate_prompt(prompt: &str) -> Result<(), ValidationError> {
    if prompt.trim().is_empty() {
        let mut err = ValidationError::new("prompt_required");
        err.message = Some("Prompt must not be empty".into());
        return Err(err);
    }
    Ok(())
}

/// Flatten validator errors into one human-readable message.
fn describe(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(msg) => msg.to_string(),
                None => format!("{field} is invalid"),
            })
        })
        .collect();
    messages.sort();
    messages.join("; ")
}

/// Validate a submission before anything is sent upstream.
pub fn validate_input(input: &GenerationInput) -> Result<(), CoreError> {
    input
        .validate()
        .map_err(|errors| CoreError::Validation(describe(&errors)))
}

/// Body for the provider's submit call.
///
/// `image_urls` is only present when reference images are attached.
pub fn upstream_payload(input: &GenerationInput) -> Value {
    let mut payload = json!({
        "prompt": input.prompt,
        "num_images": input.num_images,
        "aspect_ratio": input.aspect_ratio,
        "output_format": input.output_format,
        "resolution": input.resolution,
    });
    if input.has_reference_images() {
        payload["image_urls"] = json!(input.reference_image_urls);
    }
    payload
}
