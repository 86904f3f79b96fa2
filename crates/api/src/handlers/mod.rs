//! Request handlers grouped by resource.
//!
//! Handlers extract state and the caller, delegate to the repositories in
//! `falgate_db` or to the lifecycle manager, and map errors via
//! [`crate::error::AppError`].

pub mod admin;
pub mod auth;
pub mod client_errors;
pub mod generation;
pub mod models;
pub mod upload;
