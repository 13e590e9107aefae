//! Lifecycle event envelope and callback payload.
//!
//! Field names on both types are fixed by the orchestration protocol and
//! are serialized verbatim (`RequestType`, `ResponseURL`, `Status`, ...).

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Property-bag key holding the name of the credentials secret.
pub const SECRET_NAME_KEY: &str = "CredsSecretName";

// ---------------------------------------------------------------------------
// Request type
// ---------------------------------------------------------------------------

/// Kind of lifecycle transition. Unrecognized values are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RequestType {
    Create,
    Update,
    Delete,
    Other(String),
}

impl RequestType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Create => "Create",
            Self::Update => "Update",
            Self::Delete => "Delete",
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for RequestType {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "Create" => Self::Create,
            "Update" => Self::Update,
            "Delete" => Self::Delete,
            _ => Self::Other(raw),
        }
    }
}

impl From<RequestType> for String {
    fn from(value: RequestType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

/// Resource properties supplied by the stack template.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ResourceProperties {
    /// Opaque initializer configuration; must contain [`SECRET_NAME_KEY`] for Create.
    ///
    /// Anything other than an object (`null`, a string, a list) reads as empty
    /// so the event still parses and can be answered.
    #[serde(default, deserialize_with = "lenient_object")]
    pub config: Map<String, Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ResourceProperties {
    /// Name of the secret holding database credentials, if configured.
    pub fn secret_name(&self) -> Option<&str> {
        self.config
            .get(SECRET_NAME_KEY)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

fn lenient_object<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Object(map) => Ok(map),
        _ => Ok(Map::new()),
    }
}

/// A lifecycle notification for one logical resource.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LifecycleEvent {
    pub request_type: RequestType,
    pub request_id: String,
    pub stack_id: String,
    pub logical_resource_id: String,
    #[serde(rename = "ResponseURL")]
    pub response_url: String,
    #[serde(default)]
    pub physical_resource_id: Option<String>,
    #[serde(default)]
    pub resource_type: Option<String>,
    #[serde(default)]
    pub service_token: Option<String>,
    #[serde(default)]
    pub resource_properties: ResourceProperties,
    #[serde(default)]
    pub old_resource_properties: Option<ResourceProperties>,
}

// ---------------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------------

/// Outcome reported to the callback URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseStatus {
    #[serde(rename = "SUCCESS")]
    Success,
    #[serde(rename = "FAILED")]
    Failed,
}

/// Callback payload. Exactly these five fields go over the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LifecycleResponse {
    pub status: ResponseStatus,
    pub request_id: String,
    pub logical_resource_id: String,
    pub stack_id: String,
    pub physical_resource_id: String,
}

impl LifecycleResponse {
    /// Build a response carrying the correlation ids of `event`.
    pub fn for_event(event: &LifecycleEvent, status: ResponseStatus) -> Self {
        Self {
            status,
            request_id: event.request_id.clone(),
            logical_resource_id: event.logical_resource_id.clone(),
            stack_id: event.stack_id.clone(),
            physical_resource_id: event.physical_resource_id.clone().unwrap_or_default(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ResponseStatus::Success
    }
}

// ---------------------------------------------------------------------------
// Phases
// ---------------------------------------------------------------------------

/// States an invocation moves through. Every invocation ends in `Reported`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecyclePhase {
    Dispatched,
    Executing,
    Reported,
}

impl LifecyclePhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dispatched => "dispatched",
            Self::Executing => "executing",
            Self::Reported => "reported",
        }
    }
}

impl fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
