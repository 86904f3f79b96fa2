//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod fallback_link_repo;
pub mod generation_request_repo;
pub mod model_endpoint_repo;
pub mod user_repo;

pub use fallback_link_repo::FallbackLinkRepo;
pub use generation_request_repo::GenerationRequestRepo;
pub use model_endpoint_repo::ModelEndpointRepo;
pub use user_repo::UserRepo;
