//! Secret store access for the database initializer.
//!
//! [`SecretResolver`] is the seam the lifecycle handler depends on;
//! [`SecretsManagerResolver`] is the AWS Secrets Manager implementation.

pub mod secrets;

pub use secrets::{SecretResolver, SecretsManagerResolver};
