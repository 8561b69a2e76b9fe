//! Access log record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::StateError;

/// One gateway request, shipped to the audit topic as JSON
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessLog {
    /// API key used by the request, absent for anonymous requests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub path: String,
    pub status: u16,
    #[serde(rename = "ts")]
    pub timestamp: DateTime<Utc>,
}

impl AccessLog {
    pub fn new(path: impl Into<String>, status: u16, timestamp: DateTime<Utc>) -> Self {
        Self {
            key: None,
            path: path.into(),
            status,
            timestamp,
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn to_json(&self) -> Result<Vec<u8>, StateError> {
        serde_json::to_vec(self).map_err(|e| {
            StateError::serialization(format!("Failed to marshal access log {:?}: {}", self, e))
        })
    }

    pub fn from_json(payload: &[u8]) -> Result<Self, StateError> {
        serde_json::from_slice(payload).map_err(|e| {
            StateError::serialization(format!("Failed to parse access log: {}", e))
        })
    }
}
