//! Action — the effect performed when a scene runs.

use serde::{Deserialize, Serialize};

use crate::id::DeviceId;

/// An operation executed when a scene's conditions hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// Send a command map to a device through the HAL,
    /// e.g. `{"state": "on", "brightness": 80}`.
    DeviceControl {
        device_id: DeviceId,
        command: serde_json::Map<String, serde_json::Value>,
    },
    /// Suspend this execution (and only this execution) before continuing.
    Delay { seconds: u64 },
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DeviceControl { device_id, .. } => write!(f, "device_control({device_id})"),
            Self::Delay { seconds } => write!(f, "delay({seconds}s)"),
        }
    }
}
