//! `dbinit-function` library crate.
//!
//! The lifecycle handler and its configuration. The binary entrypoint
//! lives in `main.rs`; everything it wires together is exposed here so
//! the handler can be driven with in-memory collaborators in tests.

pub mod config;
pub mod handler;
pub mod script;

pub use config::{ConfigError, FunctionConfig, LogFormat};
pub use handler::{HandlerOutcome, InvocationFault, LifecycleHandler};
