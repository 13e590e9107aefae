//! Script execution against the target database.
//!
//! [`DatabaseClient`] owns the connection lifecycle: it opens exactly one
//! connection per call through a [`Connector`], runs the script as a single
//! batch, and closes the connection on every exit path before returning.
//! [`PgConnector`] is the PostgreSQL implementation.

pub mod postgres;

use std::time::{Duration, Instant};

use async_trait::async_trait;
use dbinit_core::{Credential, DbError};
use serde::Serialize;

pub use postgres::PgConnector;

/// Metadata returned by the driver after a script ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExecutionResult {
    /// Rows affected across every statement in the batch.
    pub rows_affected: u64,
    /// Wall-clock time from connect to close, in milliseconds.
    pub duration_ms: u64,
}

// ---------------------------------------------------------------------------
// Connection traits
// ---------------------------------------------------------------------------

/// An open, exclusively owned database connection.
#[async_trait]
pub trait ScriptConnection: Send {
    /// Execute `script` as one batch and return the rows affected.
    async fn execute_batch(&mut self, script: &str) -> Result<u64, DbError>;

    /// Close the connection. Consumes it so it cannot be reused.
    async fn close(self) -> Result<(), DbError>;
}

/// Opens connections from resolved credentials.
#[async_trait]
pub trait Connector: Send + Sync {
    type Connection: ScriptConnection;

    async fn connect(&self, credential: &Credential) -> Result<Self::Connection, DbError>;
}

// ---------------------------------------------------------------------------
// DatabaseClient
// ---------------------------------------------------------------------------

/// Runs initialization scripts over short-lived connections.
#[derive(Debug, Clone)]
pub struct DatabaseClient<C> {
    connector: C,
}

impl<C: Connector> DatabaseClient<C> {
    pub fn new(connector: C) -> Self {
        Self { connector }
    }

    /// Connect with `credential`, run `script`, close.
    ///
    /// No retry: a redelivered lifecycle event is the retry mechanism.
    pub async fn run(
        &self,
        credential: &Credential,
        script: &str,
    ) -> Result<ExecutionResult, DbError> {
        let started = Instant::now();

        let mut conn = self.connector.connect(credential).await?;
        tracing::info!(
            host = %credential.host,
            dbname = %credential.dbname,
            "Connected to database",
        );

        let executed = conn.execute_batch(script).await;

        if let Err(e) = conn.close().await {
            tracing::warn!(error = %e, "Database connection did not close cleanly");
        }

        let rows_affected = executed?;
        Ok(ExecutionResult {
            rows_affected,
            duration_ms: whole_millis(started.elapsed()),
        })
    }
}

/// Milliseconds in `elapsed`, saturating at `u64::MAX`.
fn whole_millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
