//! Event — an immutable record of something that happened.
//!
//! Events are published on the bus when device states change, scenes run,
//! or records are created/updated/removed. Payloads are opaque structured
//! JSON forwarded verbatim to notification consumers.

use serde::{Deserialize, Serialize};

use crate::id::EventId;
use crate::time::Timestamp;

/// Topic a bus event is published under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    DeviceStateChanged,
    DeviceAdded,
    DeviceRemoved,
    SceneTriggered,
    SceneCompleted,
    SceneFailed,
    SceneAdded,
    SceneUpdated,
    SceneRemoved,
}

impl EventType {
    /// The wire name of this topic.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DeviceStateChanged => "device_state_changed",
            Self::DeviceAdded => "device_added",
            Self::DeviceRemoved => "device_removed",
            Self::SceneTriggered => "scene_triggered",
            Self::SceneCompleted => "scene_completed",
            Self::SceneFailed => "scene_failed",
            Self::SceneAdded => "scene_added",
            Self::SceneUpdated => "scene_updated",
            Self::SceneRemoved => "scene_removed",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single bus notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub data: serde_json::Value,
    pub timestamp: Timestamp,
}

impl Event {
    /// Create an event stamped with a fresh id and the current time.
    #[must_use]
    pub fn new(event_type: EventType, data: serde_json::Value) -> Self {
        Self {
            id: EventId::new(),
            event_type,
            data,
            timestamp: crate::time::now(),
        }
    }
}
