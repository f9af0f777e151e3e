//! In-memory cache of the latest known state per device.
//!
//! The store is the only source of truth consulted during condition
//! evaluation. It is deliberately not synchronised with the persistence
//! layer: on process restart it starts empty and is repopulated by querying
//! the HAL for each known device.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use scenehub_domain::device::DeviceState;
use scenehub_domain::error::NotFoundError;
use scenehub_domain::id::DeviceId;
use scenehub_domain::time::now;

/// Thread-safe per-device state cache.
///
/// All operations serialise through one coarse lock. Every operation is
/// short and never suspends, so the lock is never held across an await
/// point; unrelated state lookups can never be serialised behind a slow
/// external call.
#[derive(Debug, Default)]
pub struct StateStore {
    states: Mutex<HashMap<DeviceId, DeviceState>>,
}

impl StateStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the cached state of a device, if any.
    #[must_use]
    pub fn get(&self, device_id: &DeviceId) -> Option<DeviceState> {
        self.lock().get(device_id).cloned()
    }

    /// Cache a device state wholesale.
    ///
    /// `last_updated` is stamped by the store, overriding whatever the
    /// caller supplied.
    pub fn set(&self, device_id: DeviceId, mut state: DeviceState) {
        state.last_updated = now();
        self.lock().insert(device_id, state);
    }

    /// Merge attributes into an existing cached state.
    ///
    /// # Errors
    ///
    /// Returns [`NotFoundError`] when the device has no cached state.
    pub fn patch_attributes(
        &self,
        device_id: &DeviceId,
        attributes: HashMap<String, serde_json::Value>,
    ) -> Result<(), NotFoundError> {
        let mut states = self.lock();
        let state = states.get_mut(device_id).ok_or_else(|| NotFoundError {
            entity: "Device state",
            id: device_id.to_string(),
        })?;
        state.attributes.extend(attributes);
        state.last_updated = now();
        Ok(())
    }

    /// Drop a device's cached state. Unknown ids are a no-op.
    pub fn remove(&self, device_id: &DeviceId) {
        self.lock().remove(device_id);
    }

    /// Snapshot all cached states.
    #[must_use]
    pub fn all(&self) -> HashMap<DeviceId, DeviceState> {
        self.lock().clone()
    }

    /// Drop all cached states.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Number of devices with a cached state.
    #[must_use]
    pub fn count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<DeviceId, DeviceState>> {
        // A panic while holding the lock leaves the map intact, so a
        // poisoned guard is still safe to use.
        self.states.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn should_return_none_for_unknown_device() {
        let store = StateStore::new();
        assert!(store.get(&DeviceId::new("ghost")).is_none());
    }

    #[test]
    fn should_store_and_return_state() {
        let store = StateStore::new();
        store.set(DeviceId::new("light_01"), DeviceState::new("on"));
        let state = store.get(&DeviceId::new("light_01")).unwrap();
        assert_eq!(state.state, "on");
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn should_override_caller_supplied_last_updated_on_set() {
        let store = StateStore::new();
        let mut state = DeviceState::new("on");
        state.last_updated = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
        let before = now();
        store.set(DeviceId::new("light_01"), state);
        let cached = store.get(&DeviceId::new("light_01")).unwrap();
        assert!(cached.last_updated >= before);
    }

    #[test]
    fn should_merge_attributes_when_patching() {
        let store = StateStore::new();
        let id = DeviceId::new("light_01");
        store.set(
            id.clone(),
            DeviceState::new("on").with_attribute("brightness", serde_json::json!(50)),
        );

        let mut patch = HashMap::new();
        patch.insert("brightness".to_string(), serde_json::json!(80));
        patch.insert("color".to_string(), serde_json::json!("warm"));
        store.patch_attributes(&id, patch).unwrap();

        let state = store.get(&id).unwrap();
        assert_eq!(state.attributes["brightness"], serde_json::json!(80));
        assert_eq!(state.attributes["color"], serde_json::json!("warm"));
        assert_eq!(state.state, "on");
    }

    #[test]
    fn should_fail_patch_for_unknown_device() {
        let store = StateStore::new();
        let result = store.patch_attributes(&DeviceId::new("ghost"), HashMap::new());
        let err = result.unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn should_remove_state_and_tolerate_unknown_ids() {
        let store = StateStore::new();
        let id = DeviceId::new("light_01");
        store.set(id.clone(), DeviceState::new("on"));
        store.remove(&id);
        assert!(store.get(&id).is_none());
        // removing again is a no-op
        store.remove(&id);
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn should_snapshot_all_states() {
        let store = StateStore::new();
        store.set(DeviceId::new("a"), DeviceState::new("on"));
        store.set(DeviceId::new("b"), DeviceState::new("off"));
        let all = store.all();
        assert_eq!(all.len(), 2);
        assert_eq!(all[&DeviceId::new("b")].state, "off");
    }

    #[test]
    fn should_clear_all_states() {
        let store = StateStore::new();
        store.set(DeviceId::new("a"), DeviceState::new("on"));
        store.clear();
        assert_eq!(store.count(), 0);
    }
}
