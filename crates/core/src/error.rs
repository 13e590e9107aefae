/// Failure looking up or decoding a credential in the secret store.
#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("Secret not found: {0}")]
    NotFound(String),

    #[error("Secret {name} is malformed: {reason}")]
    Malformed { name: String, reason: String },

    #[error("Secret store request for {name} failed: {message}")]
    Store { name: String, message: String },
}

/// Failure talking to the target database.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// Network failure or authentication refused while connecting.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The script raised a database-side error.
    #[error("Execution error: {0}")]
    Execution(String),
}

/// Any failure while executing a lifecycle side effect.
///
/// All variants collapse into the same `FAILED` callback status; the
/// distinction only survives in logs via [`LifecycleError::kind`].
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Secret(#[from] SecretError),

    #[error(transparent)]
    Database(#[from] DbError),

    #[error("Invalid resource properties: {0}")]
    InvalidProperties(String),
}

impl LifecycleError {
    /// Stable identifier for structured log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Secret(SecretError::NotFound(_)) => "secret_not_found",
            Self::Secret(SecretError::Malformed { .. }) => "secret_malformed",
            Self::Secret(SecretError::Store { .. }) => "secret_store",
            Self::Database(DbError::Connection(_)) => "connection",
            Self::Database(DbError::Execution(_)) => "execution",
            Self::InvalidProperties(_) => "invalid_properties",
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
