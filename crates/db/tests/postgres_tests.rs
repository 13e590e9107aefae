//! Live PostgreSQL tests.
//!
//! Ignored by default. Run with a reachable server:
//!
//! ```text
//! PGHOST=localhost PGUSER=postgres PGPASSWORD=postgres PGDATABASE=postgres \
//!     cargo test -p dbinit-db --test postgres_tests -- --ignored
//! ```

use assert_matches::assert_matches;
use dbinit_core::{Credential, DbError};
use dbinit_db::{DatabaseClient, PgConnector};

const RERUNNABLE_SCRIPT: &str = "
    CREATE TABLE IF NOT EXISTS dbinit_live_check (id BIGSERIAL PRIMARY KEY, label TEXT NOT NULL);
    CREATE INDEX IF NOT EXISTS idx_dbinit_live_check_label ON dbinit_live_check (label);
    INSERT INTO dbinit_live_check (label)
    SELECT 'seed' WHERE NOT EXISTS (SELECT 1 FROM dbinit_live_check WHERE label = 'seed');
";

fn credential_from_env() -> Credential {
    let var = |key: &str, default: &str| std::env::var(key).unwrap_or_else(|_| default.to_string());
    Credential {
        host: var("PGHOST", "localhost"),
        username: var("PGUSER", "postgres"),
        password: var("PGPASSWORD", "postgres"),
        dbname: var("PGDATABASE", "postgres"),
        port: var("PGPORT", "5432").parse().expect("PGPORT must be a port number"),
    }
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn rerunnable_script_succeeds_twice() {
    let client = DatabaseClient::new(PgConnector::default());
    let credential = credential_from_env();

    client.run(&credential, RERUNNABLE_SCRIPT).await.unwrap();
    client.run(&credential, RERUNNABLE_SCRIPT).await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn database_error_is_an_execution_error() {
    let client = DatabaseClient::new(PgConnector::default());

    let err = client
        .run(&credential_from_env(), "SELECT * FROM dbinit_table_that_does_not_exist;")
        .await
        .unwrap_err();

    assert_matches!(err, DbError::Execution(_));
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL"]
async fn wrong_password_is_a_connection_error() {
    let client = DatabaseClient::new(PgConnector::default());
    let mut credential = credential_from_env();
    credential.password = "definitely-not-the-password".into();

    let err = client.run(&credential, "SELECT 1;").await.unwrap_err();

    assert_matches!(err, DbError::Connection(_));
}
