//! PostgreSQL connector built on a single `sqlx` connection.

use std::time::Duration;

use async_trait::async_trait;
use dbinit_core::{Credential, DbError};
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::{ConnectOptions, Connection};

use crate::{Connector, ScriptConnection};

/// Default time allowed for the TCP connect + auth handshake.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Opens one [`PgConnection`] per call; no pooling.
#[derive(Debug, Clone)]
pub struct PgConnector {
    connect_timeout: Duration,
}

impl PgConnector {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

impl Default for PgConnector {
    fn default() -> Self {
        Self::new(DEFAULT_CONNECT_TIMEOUT)
    }
}

/// Build connection options from a credential.
///
/// Statement logging is off: the script is logged by size, not content.
pub fn connect_options(credential: &Credential) -> PgConnectOptions {
    PgConnectOptions::new()
        .host(&credential.host)
        .port(credential.port)
        .username(&credential.username)
        .password(&credential.password)
        .database(&credential.dbname)
        .disable_statement_logging()
}

#[async_trait]
impl Connector for PgConnector {
    type Connection = PgScriptConnection;

    async fn connect(&self, credential: &Credential) -> Result<Self::Connection, DbError> {
        let options = connect_options(credential);

        let conn = tokio::time::timeout(self.connect_timeout, PgConnection::connect_with(&options))
            .await
            .map_err(|_| {
                DbError::Connection(format!(
                    "timed out after {}s connecting to {}:{}",
                    self.connect_timeout.as_secs(),
                    credential.host,
                    credential.port
                ))
            })?
            .map_err(|e| DbError::Connection(e.to_string()))?;

        Ok(PgScriptConnection { conn })
    }
}

/// An open PostgreSQL connection.
#[derive(Debug)]
pub struct PgScriptConnection {
    conn: PgConnection,
}

#[async_trait]
impl ScriptConnection for PgScriptConnection {
    async fn execute_batch(&mut self, script: &str) -> Result<u64, DbError> {
        tracing::debug!(script_bytes = script.len(), "Executing script batch");
        let result = sqlx::Executor::execute(&mut self.conn, sqlx::raw_sql(script))
            .await
            .map_err(classify_execute_error)?;
        Ok(result.rows_affected())
    }

    async fn close(self) -> Result<(), DbError> {
        self.conn
            .close()
            .await
            .map_err(|e| DbError::Connection(e.to_string()))
    }
}

/// Transport failures mid-script are connection errors; everything else
/// the server or driver raised is an execution error.
fn classify_execute_error(err: sqlx::Error) -> DbError {
    match err {
        sqlx::Error::Io(_) | sqlx::Error::Tls(_) | sqlx::Error::Protocol(_) => {
            DbError::Connection(err.to_string())
        }
        other => DbError::Execution(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
