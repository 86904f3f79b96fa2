//! Domain types and pure decision logic for the generation gateway.
//!
//! Nothing in this crate performs I/O. The lifecycle manager in
//! `falgate-pipeline` composes these pieces with the provider client and
//! the request store.

pub mod endpoint;
pub mod error;
pub mod generation;
pub mod lifecycle;
pub mod roles;
pub mod status_normalizer;
pub mod types;
