//! Database credentials as stored in the secret store.
//!
//! The stored value is a JSON document with at least `host`, `username`,
//! `password` and `dbname`. Secrets generated alongside a managed database
//! also carry `port` and `engine`; `port` is honored when present and
//! everything else is ignored.

use std::fmt;

use serde::{Deserialize, Deserializer};

use crate::error::SecretError;

/// Port used when the secret does not carry one.
pub const DEFAULT_PORT: u16 = 5432;

/// Resolved credentials for a single invocation.
///
/// Never persisted. `Debug` redacts the password so the value can be
/// passed through tracing fields safely.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Credential {
    pub host: String,
    pub username: String,
    pub password: String,
    pub dbname: String,
    #[serde(default = "default_port", deserialize_with = "deserialize_port")]
    pub port: u16,
}

impl Credential {
    /// Decode the secret string stored under `name`.
    pub fn from_secret_string(name: &str, raw: &str) -> Result<Self, SecretError> {
        let credential: Self =
            serde_json::from_str(raw).map_err(|e| SecretError::Malformed {
                name: name.to_string(),
                reason: e.to_string(),
            })?;

        for (field, value) in [
            ("host", &credential.host),
            ("username", &credential.username),
            ("dbname", &credential.dbname),
        ] {
            if value.trim().is_empty() {
                return Err(SecretError::Malformed {
                    name: name.to_string(),
                    reason: format!("field `{field}` is empty"),
                });
            }
        }

        Ok(credential)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("dbname", &self.dbname)
            .field("port", &self.port)
            .finish()
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

/// Accepts the port as a JSON number or a numeric string.
fn deserialize_port<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Port {
        Number(u16),
        Text(String),
    }

    match Port::deserialize(deserializer)? {
        Port::Number(n) => Ok(n),
        Port::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
