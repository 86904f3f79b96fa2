//! Transport client for the fal.ai queue API.
//!
//! Only moves bytes: submit a job, read its status, read its result. What the
//! responses *mean* is decided by `falgate_core::status_normalizer`.

pub mod api;
pub mod config;
pub mod provider;

pub use api::{FalApi, FalApiError};
pub use config::FalConfig;
pub use provider::{UpstreamProvider, UpstreamResponse};
