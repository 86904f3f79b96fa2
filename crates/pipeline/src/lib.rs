//! Generation request lifecycle: submit to the provider, poll on demand,
//! normalize what comes back and persist each outcome exactly once.
//!
//! [`LifecycleManager`] is the entry point. It talks to the provider through
//! [`falgate_fal::UpstreamProvider`] and to persistence through
//! [`RequestStore`], so both can be replaced in tests.

pub mod error;
pub mod lifecycle;
pub mod locks;
pub mod store;

pub use error::{LifecycleError, UpstreamCall};
pub use lifecycle::{AcceptedSubmission, LifecycleManager, PollOutcome};
pub use store::{PgRequestStore, RequestStore};
