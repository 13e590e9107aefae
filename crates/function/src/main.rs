//! `dbinit-function` -- database initializer custom resource.
//!
//! Invoked by the stack orchestration provider on Create/Update/Delete of
//! the initializer resource. On Create it reads database credentials from
//! Secrets Manager and runs the bundled SQL script; every event ends with a
//! status PUT to the event's callback URL.
//!
//! # Environment variables
//!
//! | Variable                  | Required | Default   | Description                        |
//! |---------------------------|----------|-----------|------------------------------------|
//! | `RESPONSE_MAX_ATTEMPTS`   | no       | `5`       | Callback PUT attempts              |
//! | `RESPONSE_RETRY_DELAY_MS` | no       | `0`       | Pause between callback attempts    |
//! | `RESPONSE_TIMEOUT_SECS`   | no       | `10`      | Per-attempt callback timeout       |
//! | `DB_CONNECT_TIMEOUT_SECS` | no       | `10`      | Database connect timeout           |
//! | `INIT_SCRIPT_PATH`        | no       | (bundled) | Script to run instead of the bundled one |
//! | `LOG_FORMAT`              | no       | `json`    | `json` or `pretty`                 |

use anyhow::Context;
use lambda_runtime::{service_fn, LambdaEvent};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dbinit_cloud::SecretsManagerResolver;
use dbinit_core::{LifecycleEvent, LifecycleResponse};
use dbinit_db::{DatabaseClient, PgConnector};
use dbinit_events::CallbackReporter;
use dbinit_function::{script, FunctionConfig, LifecycleHandler, LogFormat};

/// Filter used when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str =
    "dbinit_function=info,dbinit_events=info,dbinit_db=info,dbinit_cloud=info";

#[tokio::main]
async fn main() -> Result<(), lambda_runtime::Error> {
    dotenvy::dotenv().ok();

    let config = FunctionConfig::from_env().context("Invalid function configuration")?;
    init_tracing(config.log_format);

    let script = script::load(config.script_path.as_deref())
        .with_context(|| format!("Failed to read init script {:?}", config.script_path))?;

    let reporter = CallbackReporter::new(config.retry_policy(), config.response_timeout)
        .context("Failed to build callback HTTP client")?;

    let handler = LifecycleHandler::new(
        SecretsManagerResolver::from_env().await,
        DatabaseClient::new(PgConnector::new(config.db_connect_timeout)),
        reporter,
        script,
    );

    tracing::info!(
        max_attempts = config.response_max_attempts,
        script_override = config.script_path.is_some(),
        "Starting dbinit-function",
    );

    let handler = &handler;
    lambda_runtime::run(service_fn(move |event: LambdaEvent<LifecycleEvent>| async move {
        invoke(handler, event).await
    }))
    .await
}

/// One runtime invocation: structured callback first, then the runtime's
/// own fault channel.
async fn invoke<S, C, R>(
    handler: &LifecycleHandler<S, C, R>,
    event: LambdaEvent<LifecycleEvent>,
) -> Result<LifecycleResponse, lambda_runtime::Error>
where
    S: dbinit_cloud::SecretResolver,
    C: dbinit_db::Connector,
    R: dbinit_events::ResponseReporter,
{
    let (payload, context) = event.into_parts();
    tracing::debug!(invocation_id = %context.request_id, "Invocation started");

    let outcome = handler.handle(&payload).await;
    outcome.into_invocation_result().map_err(|fault| {
        tracing::error!(invocation_id = %context.request_id, "{fault}");
        fault.into()
    })
}

fn init_tracing(format: LogFormat) {
    let registry = tracing_subscriber::registry().with(
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
    );

    match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}
