//! Function configuration loaded from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use dbinit_core::retry::DEFAULT_MAX_ATTEMPTS;
use dbinit_core::RetryPolicy;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per line, for the platform log collector.
    Json,
    /// Human-readable, for local runs.
    Pretty,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got {value:?}")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Runtime settings for the function binary.
///
/// The lifecycle handler itself reads nothing from the environment; these
/// values are resolved once at startup and passed in.
#[derive(Debug, Clone)]
pub struct FunctionConfig {
    /// Total callback PUT attempts (default: `5`).
    pub response_max_attempts: u32,
    /// Pause between callback attempts (default: none).
    pub response_retry_delay: Duration,
    /// Per-attempt callback timeout (default: `10s`).
    pub response_timeout: Duration,
    /// Database connect timeout (default: `10s`).
    pub db_connect_timeout: Duration,
    /// Replaces the bundled initialization script when set.
    pub script_path: Option<PathBuf>,
    pub log_format: LogFormat,
}

impl FunctionConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default   |
    /// |---------------------------|-----------|
    /// | `RESPONSE_MAX_ATTEMPTS`   | `5`       |
    /// | `RESPONSE_RETRY_DELAY_MS` | `0`       |
    /// | `RESPONSE_TIMEOUT_SECS`   | `10`      |
    /// | `DB_CONNECT_TIMEOUT_SECS` | `10`      |
    /// | `INIT_SCRIPT_PATH`        | (bundled) |
    /// | `LOG_FORMAT`              | `json`    |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let response_max_attempts: u32 = positive_or(
            &lookup,
            "RESPONSE_MAX_ATTEMPTS",
            DEFAULT_MAX_ATTEMPTS,
            "a positive integer",
        )?;
        let retry_delay_ms: u64 =
            parse_or(&lookup, "RESPONSE_RETRY_DELAY_MS", 0, "a number of milliseconds")?;
        let response_timeout_secs: u64 =
            positive_or(&lookup, "RESPONSE_TIMEOUT_SECS", 10, "a positive number of seconds")?;
        let db_connect_timeout_secs: u64 =
            positive_or(&lookup, "DB_CONNECT_TIMEOUT_SECS", 10, "a positive number of seconds")?;

        let script_path = lookup("INIT_SCRIPT_PATH")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        let log_format = match lookup("LOG_FORMAT").as_deref().map(str::trim) {
            None | Some("") | Some("json") => LogFormat::Json,
            Some("pretty") => LogFormat::Pretty,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "LOG_FORMAT",
                    expected: "`json` or `pretty`",
                    value: other.to_string(),
                })
            }
        };

        Ok(Self {
            response_max_attempts,
            response_retry_delay: Duration::from_millis(retry_delay_ms),
            response_timeout: Duration::from_secs(response_timeout_secs),
            db_connect_timeout: Duration::from_secs(db_connect_timeout_secs),
            script_path,
            log_format,
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.response_max_attempts, self.response_retry_delay)
    }
}

fn parse_or<F, T>(
    lookup: &F,
    var: &'static str,
    default: T,
    expected: &'static str,
) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(var) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            var,
            expected,
            value: raw,
        }),
    }
}

/// Like [`parse_or`], but zero is rejected.
fn positive_or<F, T>(
    lookup: &F,
    var: &'static str,
    default: T,
    expected: &'static str,
) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + Default + PartialEq,
{
    let value = parse_or(lookup, var, default, expected)?;
    if value == T::default() {
        return Err(ConfigError::Invalid {
            var,
            expected,
            value: lookup(var).unwrap_or_default(),
        });
    }
    Ok(value)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert_matches::assert_matches;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<FunctionConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        FunctionConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let config = load(&[]).unwrap();
        assert_eq!(config.response_max_attempts, 5);
        assert_eq!(config.response_retry_delay, Duration::ZERO);
        assert_eq!(config.response_timeout, Duration::from_secs(10));
        assert_eq!(config.db_connect_timeout, Duration::from_secs(10));
        assert!(config.script_path.is_none());
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.retry_policy(), RetryPolicy::default());
    }

    #[test]
    fn overrides_are_applied() {
        let config = load(&[
            ("RESPONSE_MAX_ATTEMPTS", "3"),
            ("RESPONSE_RETRY_DELAY_MS", "250"),
            ("INIT_SCRIPT_PATH", "/var/task/script.sql"),
            ("LOG_FORMAT", "pretty"),
        ])
        .unwrap();

        assert_eq!(config.retry_policy().max_attempts(), 3);
        assert_eq!(config.retry_policy().delay(), Duration::from_millis(250));
        assert_eq!(config.script_path, Some(PathBuf::from("/var/task/script.sql")));
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn rejects_zero_attempts() {
        let err = load(&[("RESPONSE_MAX_ATTEMPTS", "0")]).unwrap_err();
        assert_matches!(err, ConfigError::Invalid { var: "RESPONSE_MAX_ATTEMPTS", .. });
    }

    #[test]
    fn rejects_non_numeric_timeout() {
        let err = load(&[("RESPONSE_TIMEOUT_SECS", "soon")]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "RESPONSE_TIMEOUT_SECS must be a positive number of seconds, got \"soon\""
        );
    }

    #[test]
    fn rejects_zero_timeouts() {
        for var in ["RESPONSE_TIMEOUT_SECS", "DB_CONNECT_TIMEOUT_SECS"] {
            let err = load(&[(var, "0")]).unwrap_err();
            assert_eq!(
                err.to_string(),
                format!("{var} must be a positive number of seconds, got \"0\"")
            );
        }
    }

    #[test]
    fn zero_retry_delay_is_allowed() {
        let config = load(&[("RESPONSE_RETRY_DELAY_MS", "0")]).unwrap();
        assert_eq!(config.response_retry_delay, Duration::ZERO);
    }

    #[test]
    fn rejects_unknown_log_format() {
        let err = load(&[("LOG_FORMAT", "xml")]).unwrap_err();
        assert_matches!(err, ConfigError::Invalid { var: "LOG_FORMAT", .. });
    }
}
