//! Lifecycle event dispatch.
//!
//! [`LifecycleHandler::handle`] moves one event through
//! Dispatched → (Executing →) Reported and always ends by handing exactly one
//! [`LifecycleResponse`] to the reporter. Failures are reported on two
//! independent channels: the structured `FAILED` callback, and an opaque
//! [`InvocationFault`] for the function runtime.

use std::sync::Arc;

use dbinit_cloud::SecretResolver;
use dbinit_core::lifecycle::SECRET_NAME_KEY;
use dbinit_core::{
    LifecycleError, LifecycleEvent, LifecyclePhase, LifecycleResponse, RequestType,
    ResponseStatus,
};
use dbinit_db::{Connector, DatabaseClient};
use dbinit_events::{DeliveryOutcome, ResponseReporter};
use tracing::Instrument;

/// Opaque fault signalled to the runtime after a failure was reported.
///
/// Carries no detail of the cause; the logs have it.
#[derive(Debug, thiserror::Error)]
#[error("Lifecycle handler failed for request {request_id}")]
pub struct InvocationFault {
    pub request_id: String,
}

/// Everything one invocation produced.
#[derive(Debug)]
pub struct HandlerOutcome {
    /// The payload handed to the reporter.
    pub response: LifecycleResponse,
    /// Whether the callback endpoint accepted it.
    pub delivery: DeliveryOutcome,
    /// The side-effect failure behind a `FAILED` response, if any.
    pub failure: Option<LifecycleError>,
}

impl HandlerOutcome {
    /// Collapse into the runtime channel.
    ///
    /// Delivery exhaustion alone is not a fault: the orchestration layer's
    /// own timeout surfaces it.
    pub fn into_invocation_result(self) -> Result<LifecycleResponse, InvocationFault> {
        match self.failure {
            None => Ok(self.response),
            Some(_) => Err(InvocationFault {
                request_id: self.response.request_id,
            }),
        }
    }
}

/// Dispatches lifecycle events for the database initializer resource.
pub struct LifecycleHandler<S, C, R> {
    secrets: S,
    database: DatabaseClient<C>,
    reporter: R,
    script: Arc<str>,
}

impl<S, C, R> LifecycleHandler<S, C, R>
where
    S: SecretResolver,
    C: Connector,
    R: ResponseReporter,
{
    pub fn new(
        secrets: S,
        database: DatabaseClient<C>,
        reporter: R,
        script: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            secrets,
            database,
            reporter,
            script: script.into(),
        }
    }

    /// Handle one event. Never fails; see [`HandlerOutcome`].
    pub async fn handle(&self, event: &LifecycleEvent) -> HandlerOutcome {
        let span = tracing::info_span!(
            "lifecycle",
            request_id = %event.request_id,
            logical_resource_id = %event.logical_resource_id,
            request_type = %event.request_type,
        );

        self.handle_inner(event).instrument(span).await
    }

    async fn handle_inner(&self, event: &LifecycleEvent) -> HandlerOutcome {
        tracing::info!(
            phase = %LifecyclePhase::Dispatched,
            stack_id = %event.stack_id,
            resource_type = event.resource_type.as_deref().unwrap_or_default(),
            config_keys = ?event.resource_properties.config.keys().collect::<Vec<_>>(),
            "Lifecycle event received",
        );

        let result = match &event.request_type {
            RequestType::Create => {
                tracing::info!(phase = %LifecyclePhase::Executing, "Running initialization");
                self.on_create(event).await
            }
            RequestType::Delete => {
                tracing::info!("Delete requested; initialized schema is left in place");
                Ok(())
            }
            RequestType::Update => {
                tracing::info!("Update requested; no update action is defined");
                Ok(())
            }
            RequestType::Other(raw) => {
                tracing::warn!(raw_request_type = %raw, "No matching request type");
                Ok(())
            }
        };

        let (status, failure) = match result {
            Ok(()) => (ResponseStatus::Success, None),
            Err(e) => {
                tracing::error!(error = %e, error_kind = e.kind(), "Initialization failed");
                (ResponseStatus::Failed, Some(e))
            }
        };

        let response = LifecycleResponse::for_event(event, status);
        let delivery = self.reporter.deliver(&event.response_url, &response).await;

        if let DeliveryOutcome::Exhausted { attempts, last_error } = &delivery {
            tracing::error!(
                attempts,
                error = %last_error,
                "Lifecycle response was not delivered; the deployment will wait for its timeout",
            );
        }

        tracing::info!(
            phase = %LifecyclePhase::Reported,
            status = ?status,
            delivered = delivery.is_delivered(),
            "Lifecycle event reported",
        );

        HandlerOutcome {
            response,
            delivery,
            failure,
        }
    }

    async fn on_create(&self, event: &LifecycleEvent) -> Result<(), LifecycleError> {
        let secret_name = event.resource_properties.secret_name().ok_or_else(|| {
            LifecycleError::InvalidProperties(format!("config.{SECRET_NAME_KEY} is required"))
        })?;

        let credential = self.secrets.resolve(secret_name).await?;
        let result = self.database.run(&credential, &self.script).await?;

        tracing::info!(
            rows_affected = result.rows_affected,
            duration_ms = result.duration_ms,
            "Initialization script completed",
        );
        Ok(())
    }
}
