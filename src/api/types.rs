//! API request and response types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::session::SessionDataContainer;

/// All keys stored in one namespace for the calling client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageResponse {
    /// Namespace (package id).
    pub namespace: String,
    /// Key/value pairs, ordered by key.
    pub items: BTreeMap<String, Value>,
}

/// A single stored value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueResponse {
    /// Namespace (package id).
    pub namespace: String,
    /// Key within the namespace.
    pub key: String,
    /// Stored value.
    pub value: Value,
}

/// Policy and size of one container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerSummary {
    /// Container name.
    pub name: String,
    /// Backing store kind ("memory", "file").
    pub store: String,
    /// Inactivity timeout in seconds (0 = never expire).
    pub timeout_secs: u64,
    /// Last-access resolution in seconds.
    pub resolution_secs: u64,
    /// Whether access-triggered sweeps are on.
    pub implicit_sweep: bool,
    /// Stored entries, including expired ones not yet swept.
    pub sessions: usize,
}

impl ContainerSummary {
    pub fn from_container(container: &SessionDataContainer) -> crate::Result<Self> {
        let policy = container.policy()?;
        Ok(Self {
            name: container.name().to_string(),
            store: container.store_kind().to_string(),
            timeout_secs: policy.timeout(),
            resolution_secs: policy.resolution(),
            implicit_sweep: container.implicit_sweep(),
            sessions: container.len()?,
        })
    }
}

/// Container listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListContainersResponse {
    /// Number of distinct containers.
    pub count: usize,
    /// Container summaries, default first.
    pub containers: Vec<ContainerSummary>,
    /// Registered namespace -> container name.
    pub namespaces: BTreeMap<String, String>,
}

/// Result of a manual sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepResponse {
    /// Entries evicted across all containers.
    pub removed: usize,
}

/// Generic API error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "NOT_FOUND").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional details (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", format!("{} not found", what.into()))
    }

    pub fn missing_client_id(header: &str) -> Self {
        Self::new(
            "MISSING_CLIENT_ID",
            format!("Request has no '{}' header", header),
        )
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }
}
