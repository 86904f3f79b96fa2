//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - `Deserialize` or plain DTOs for inserts and updates

pub mod fallback_link;
pub mod generation_request;
pub mod model_endpoint;
pub mod user;
