//! Credential lookup by secret name.
//!
//! One remote read per call. No caching and no retry: a missing or
//! malformed secret is a configuration fault, not a transient condition.

use async_trait::async_trait;
use aws_sdk_secretsmanager::error::{DisplayErrorContext, SdkError};
use aws_sdk_secretsmanager::operation::get_secret_value::GetSecretValueError;
use dbinit_core::{Credential, SecretError};

/// Resolves a secret name to database credentials.
#[async_trait]
pub trait SecretResolver: Send + Sync {
    async fn resolve(&self, name: &str) -> Result<Credential, SecretError>;
}

// ---------------------------------------------------------------------------
// AWS Secrets Manager
// ---------------------------------------------------------------------------

/// [`SecretResolver`] backed by AWS Secrets Manager.
#[derive(Debug, Clone)]
pub struct SecretsManagerResolver {
    client: aws_sdk_secretsmanager::Client,
}

impl SecretsManagerResolver {
    /// Wrap an already-configured client.
    pub fn new(client: aws_sdk_secretsmanager::Client) -> Self {
        Self { client }
    }

    /// Build a client from the ambient AWS environment (region, role).
    pub async fn from_env() -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(aws_sdk_secretsmanager::Client::new(&config))
    }
}

#[async_trait]
impl SecretResolver for SecretsManagerResolver {
    async fn resolve(&self, name: &str) -> Result<Credential, SecretError> {
        tracing::debug!(secret = %name, "Fetching database credentials");

        let output = self
            .client
            .get_secret_value()
            .secret_id(name)
            .send()
            .await
            .map_err(|err| classify_sdk_error(name, err))?;

        let credential = decode_secret(name, output.secret_string())?;
        tracing::info!(
            secret = %name,
            host = %credential.host,
            dbname = %credential.dbname,
            "Resolved database credentials",
        );
        Ok(credential)
    }
}

/// Only the store's own not-found answer is [`SecretError::NotFound`];
/// access, network and timeout failures are [`SecretError::Store`].
fn classify_sdk_error(name: &str, err: SdkError<GetSecretValueError>) -> SecretError {
    let not_found = err
        .as_service_error()
        .is_some_and(GetSecretValueError::is_resource_not_found_exception);
    if not_found {
        SecretError::NotFound(name.to_string())
    } else {
        SecretError::Store {
            name: name.to_string(),
            message: DisplayErrorContext(&err).to_string(),
        }
    }
}

/// Decode a secret payload. Binary-only secrets have no string value.
fn decode_secret(name: &str, secret_string: Option<&str>) -> Result<Credential, SecretError> {
    let raw = secret_string.ok_or_else(|| SecretError::Malformed {
        name: name.to_string(),
        reason: "secret has no string value".to_string(),
    })?;
    Credential::from_secret_string(name, raw)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
