//! Provider descriptors.
//!
//! Descriptors are supplied by the caller (usually from the config file) and
//! are never mutated by the health core.

use serde::{Deserialize, Serialize};

/// A single interchangeable upstream API endpoint candidate.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProviderDescriptor {
    /// Stable identifier, used as the health record key.
    pub id: String,

    /// Human-readable name.
    #[serde(default)]
    pub name: String,

    /// Candidate endpoints. The first one is probed.
    #[serde(default)]
    pub endpoints: Vec<String>,
}

impl ProviderDescriptor {
    pub fn new(id: impl Into<String>, name: impl Into<String>, endpoints: Vec<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            endpoints,
        }
    }

    /// The endpoint health checks are sent to, if any is configured.
    pub fn primary_endpoint(&self) -> Option<&str> {
        self.endpoints
            .iter()
            .map(|e| e.trim())
            .find(|e| !e.is_empty())
    }
}
