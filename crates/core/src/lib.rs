//! Shared types for the database initializer custom resource.
//!
//! - [`lifecycle`] — inbound lifecycle events, the outbound callback
//!   payload, and the phases an invocation moves through.
//! - [`credential`] — database credentials as stored in the secret store.
//! - [`error`] — the failure taxonomy shared by every crate.
//! - [`retry`] — the fixed-attempt retry policy used for callbacks.

pub mod credential;
pub mod error;
pub mod lifecycle;
pub mod retry;

pub use credential::Credential;
pub use error::{DbError, LifecycleError, SecretError};
pub use lifecycle::{LifecycleEvent, LifecyclePhase, LifecycleResponse, RequestType, ResponseStatus};
pub use retry::RetryPolicy;
