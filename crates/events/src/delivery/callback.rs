//! Callback delivery with fixed-attempt retry.
//!
//! [`CallbackReporter`] sends a JSON-encoded [`LifecycleResponse`] to the
//! event's callback URL via HTTP PUT. Network failures and non-2xx
//! responses are retried alike until the [`RetryPolicy`] runs out. Running
//! out is not an error for the caller: it gets
//! [`DeliveryOutcome::Exhausted`] back and the orchestration layer's own
//! timeout takes over from there.

use std::time::Duration;

use async_trait::async_trait;
use dbinit_core::{LifecycleResponse, RetryPolicy};
use reqwest::header::CONTENT_TYPE;

/// HTTP request timeout for a single delivery attempt.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Failure of a single delivery attempt.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The callback endpoint returned a non-2xx status code.
    #[error("Callback returned HTTP {0}")]
    HttpStatus(u16),

    /// The payload could not be encoded.
    #[error("Failed to encode response: {0}")]
    Serialize(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Result of delivering one response.
#[derive(Debug)]
pub enum DeliveryOutcome {
    /// The endpoint accepted the payload on attempt number `attempts`.
    Delivered { attempts: u32 },
    /// Every attempt failed; `last_error` is from the final one.
    Exhausted {
        attempts: u32,
        last_error: DeliveryError,
    },
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            Self::Delivered { attempts } | Self::Exhausted { attempts, .. } => *attempts,
        }
    }
}

// ---------------------------------------------------------------------------
// Reporter trait
// ---------------------------------------------------------------------------

/// Delivers a lifecycle response to a callback URL.
///
/// Implementations never fail past their own retry budget; the outcome is
/// returned, not raised.
#[async_trait]
pub trait ResponseReporter: Send + Sync {
    async fn deliver(&self, url: &str, payload: &LifecycleResponse) -> DeliveryOutcome;
}

// ---------------------------------------------------------------------------
// CallbackReporter
// ---------------------------------------------------------------------------

/// Delivers lifecycle responses to presigned callback URLs.
#[derive(Debug, Clone)]
pub struct CallbackReporter {
    client: reqwest::Client,
    policy: RetryPolicy,
}

impl CallbackReporter {
    /// Create a reporter with its own HTTP client.
    pub fn new(policy: RetryPolicy, request_timeout: Duration) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder().timeout(request_timeout).build()?;
        Ok(Self::with_client(client, policy))
    }

    /// Create a reporter around an existing client.
    pub fn with_client(client: reqwest::Client, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Execute a single PUT request and check the response status.
    async fn try_send(&self, url: &str, body: &[u8]) -> Result<(), DeliveryError> {
        let response = self
            .client
            .put(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body.to_vec())
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(DeliveryError::HttpStatus(response.status().as_u16()));
        }
        Ok(())
    }
}

#[async_trait]
impl ResponseReporter for CallbackReporter {
    async fn deliver(&self, url: &str, payload: &LifecycleResponse) -> DeliveryOutcome {
        let body = match serde_json::to_vec(payload) {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode lifecycle response");
                return DeliveryOutcome::Exhausted {
                    attempts: 0,
                    last_error: e.into(),
                };
            }
        };

        let target = redact_url(url);
        let max_attempts = self.policy.max_attempts();
        let mut attempt = 1;

        loop {
            tracing::info!(
                attempt,
                max_attempts,
                url = %target,
                status = ?payload.status,
                "Submitting lifecycle response",
            );

            match self.try_send(url, &body).await {
                Ok(()) => {
                    tracing::info!(attempt, url = %target, "Lifecycle response delivered");
                    return DeliveryOutcome::Delivered { attempts: attempt };
                }
                Err(e) if attempt >= max_attempts => {
                    tracing::error!(
                        attempts = attempt,
                        url = %target,
                        error = %e,
                        "Lifecycle response delivery failed after all attempts, giving up",
                    );
                    return DeliveryOutcome::Exhausted {
                        attempts: attempt,
                        last_error: e,
                    };
                }
                Err(e) => {
                    tracing::warn!(
                        attempt,
                        url = %target,
                        error = %e,
                        "Lifecycle response delivery attempt failed, retrying",
                    );
                    attempt += 1;
                    if !self.policy.delay().is_zero() {
                        tokio::time::sleep(self.policy.delay()).await;
                    }
                }
            }
        }
    }
}

/// Strip the query string; presigned URLs carry their signature there.
fn redact_url(url: &str) -> String {
    match reqwest::Url::parse(url) {
        Ok(mut parsed) => {
            parsed.set_query(None);
            parsed.to_string()
        }
        Err(_) => "<invalid url>".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
