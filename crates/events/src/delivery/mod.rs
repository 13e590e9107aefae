//! External delivery channels for lifecycle responses.
//!
//! Only the callback URL channel exists; the orchestration protocol has no
//! other way to receive a completion status.

pub mod callback;
