//! Trigger — the event source that may initiate scene evaluation.

use serde::{Deserialize, Serialize};

use crate::device::DeviceState;
use crate::id::DeviceId;

use super::condition::StateMatch;

/// Describes what should initiate evaluation of a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Trigger {
    /// Fires when a device's reported state satisfies a [`StateMatch`].
    DeviceState {
        device_id: DeviceId,
        condition: StateMatch,
    },
    /// Fires on a 5-field cron pattern (`minute hour day month day_of_week`).
    Time { cron: String },
    /// Fires only when triggered explicitly via the API.
    Manual,
}

impl Trigger {
    /// Check whether a device state change activates this trigger.
    ///
    /// `Time` and `Manual` triggers never match state changes; they are
    /// activated through the scheduler and the API respectively.
    #[must_use]
    pub fn matches_state_change(&self, changed: &DeviceId, state: &DeviceState) -> bool {
        match self {
            Self::DeviceState {
                device_id,
                condition,
            } => device_id == changed && condition.matches(state),
            Self::Time { .. } | Self::Manual => false,
        }
    }
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DeviceState { device_id, .. } => write!(f, "device_state({device_id})"),
            Self::Time { cron } => write!(f, "time({cron})"),
            Self::Manual => f.write_str("manual"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::condition::{CompareOp, STATE_ATTRIBUTE};

    fn open_door_trigger() -> Trigger {
        Trigger::DeviceState {
            device_id: DeviceId::new("door_sensor_01"),
            condition: StateMatch {
                operator: CompareOp::Eq,
                attribute: STATE_ATTRIBUTE.to_string(),
                value: serde_json::json!("open"),
            },
        }
    }

    #[test]
    fn should_match_when_device_and_state_satisfy_condition() {
        let trigger = open_door_trigger();
        let state = DeviceState::new("open");
        assert!(trigger.matches_state_change(&DeviceId::new("door_sensor_01"), &state));
    }

    #[test]
    fn should_not_match_when_state_differs() {
        let trigger = open_door_trigger();
        let state = DeviceState::new("closed");
        assert!(!trigger.matches_state_change(&DeviceId::new("door_sensor_01"), &state));
    }

    #[test]
    fn should_not_match_when_device_differs() {
        let trigger = open_door_trigger();
        let state = DeviceState::new("open");
        assert!(!trigger.matches_state_change(&DeviceId::new("window_sensor_01"), &state));
    }

    #[test]
    fn should_never_match_state_changes_for_time_and_manual_triggers() {
        let state = DeviceState::new("open");
        let device = DeviceId::new("door_sensor_01");
        let time = Trigger::Time {
            cron: "0 18 * * *".to_string(),
        };
        assert!(!time.matches_state_change(&device, &state));
        assert!(!Trigger::Manual.matches_state_change(&device, &state));
    }

    #[test]
    fn should_deserialize_time_trigger_from_tagged_json() {
        let json = serde_json::json!({"type": "time", "cron": "0 18 * * *"});
        let trigger: Trigger = serde_json::from_value(json).unwrap();
        assert!(matches!(trigger, Trigger::Time { cron } if cron == "0 18 * * *"));
    }

    #[test]
    fn should_serialize_manual_trigger_with_type_tag_only() {
        let json = serde_json::to_value(&Trigger::Manual).unwrap();
        assert_eq!(json, serde_json::json!({"type": "manual"}));
    }

    #[test]
    fn should_reject_unknown_trigger_type_tag() {
        let json = serde_json::json!({"type": "sunrise"});
        let result: Result<Trigger, _> = serde_json::from_value(json);
        assert!(result.is_err());
    }
}
