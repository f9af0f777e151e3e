//! Device — a physical or virtual thing reachable through the HAL.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{HubError, NotFoundError};
use crate::id::DeviceId;
use crate::time::Timestamp;

/// The latest known state of a device.
///
/// Owned by the in-memory state store; `last_updated` is stamped by the
/// store on every write, overriding whatever the caller supplied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceState {
    /// Primary state value, e.g. `"on"`, `"off"`, `"open"`.
    pub state: String,
    /// Additional attributes (brightness, temperature, …).
    #[serde(default)]
    pub attributes: HashMap<String, serde_json::Value>,
    pub last_updated: Timestamp,
}

impl DeviceState {
    /// Create a state with no attributes, stamped with the current time.
    #[must_use]
    pub fn new(state: impl Into<String>) -> Self {
        Self {
            state: state.into(),
            attributes: HashMap::new(),
            last_updated: crate::time::now(),
        }
    }

    /// Add an attribute (builder style).
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }
}

/// A registered device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    /// Device kind, e.g. `"light"`, `"sensor"`, `"switch"`.
    #[serde(rename = "type")]
    pub device_type: String,
    /// Backend-specific configuration, opaque to the controller.
    #[serde(default)]
    pub config: Option<serde_json::Value>,
    pub created_at: Timestamp,
}

impl Device {
    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Definition`] when `id` or `name` is empty.
    pub fn validate(&self) -> Result<(), HubError> {
        if self.id.as_str().is_empty() {
            return Err(crate::error::DefinitionError::new("device id must not be empty").into());
        }
        if self.name.is_empty() {
            return Err(crate::error::DefinitionError::new("device name must not be empty").into());
        }
        Ok(())
    }

    /// Build a [`NotFoundError`] for this entity kind.
    #[must_use]
    pub fn not_found(id: &DeviceId) -> NotFoundError {
        NotFoundError {
            entity: "Device",
            id: id.to_string(),
        }
    }
}
