//! Device service — use-cases for managing devices and their cached state.

use std::sync::Arc;

use scenehub_domain::device::{Device, DeviceState};
use scenehub_domain::error::HubError;
use scenehub_domain::event::{Event, EventType};
use scenehub_domain::id::DeviceId;

use crate::ports::{DeviceRepository, EventPublisher, HalClient};
use crate::state_store::StateStore;

/// Application service for device CRUD, control, and state access.
pub struct DeviceService<DR, H, P> {
    repo: Arc<DR>,
    hal: Arc<H>,
    store: Arc<StateStore>,
    publisher: Arc<P>,
}

impl<DR, H, P> Clone for DeviceService<DR, H, P> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
            hal: Arc::clone(&self.hal),
            store: Arc::clone(&self.store),
            publisher: Arc::clone(&self.publisher),
        }
    }
}

impl<DR, H, P> DeviceService<DR, H, P>
where
    DR: DeviceRepository + Send + Sync + 'static,
    H: HalClient + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    /// Create a new service from shared engine components.
    pub fn new(repo: Arc<DR>, hal: Arc<H>, store: Arc<StateStore>, publisher: Arc<P>) -> Self {
        Self {
            repo,
            hal,
            store,
            publisher,
        }
    }

    /// List all devices.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_devices(&self) -> Result<Vec<Device>, HubError> {
        self.repo.get_all().await
    }

    /// Look up a device by id, returning an error if not found.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::NotFound`] when no device with `id` exists, or a
    /// storage error from the repository.
    pub async fn get_device(&self, id: &DeviceId) -> Result<Device, HubError> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| Device::not_found(id).into())
    }

    /// Register a device and seed its cached state from the HAL.
    ///
    /// When the HAL is unreachable the device still registers, cached with
    /// an `unknown` state until the first successful read.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Definition`] when invariants fail, or a storage
    /// error from the repository.
    #[tracing::instrument(skip(self, device), fields(device_id = %device.id))]
    pub async fn add_device(&self, device: Device) -> Result<Device, HubError> {
        device.validate()?;
        let device = self.repo.save(device).await?;

        match self.hal.get_state(&device.id).await {
            Ok(state) => self.store.set(device.id.clone(), state),
            Err(err) => {
                tracing::warn!(device_id = %device.id, error = %err, "seeding state from HAL failed");
                self.store.set(device.id.clone(), DeviceState::new("unknown"));
            }
        }

        self.publisher.publish(Event::new(
            EventType::DeviceAdded,
            serde_json::json!({"device_id": &device.id, "device": &device}),
        ));
        Ok(device)
    }

    /// Update a device's registration record.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::NotFound`] when the device does not exist,
    /// [`HubError::Definition`] when invariants fail, or a storage error
    /// from the repository.
    #[tracing::instrument(skip(self, device), fields(device_id = %device.id))]
    pub async fn update_device(&self, device: Device) -> Result<Device, HubError> {
        self.get_device(&device.id).await?;
        device.validate()?;
        self.repo.save(device).await
    }

    /// Remove a device and drop its cached state.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::NotFound`] when the device does not exist, or a
    /// storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn remove_device(&self, id: &DeviceId) -> Result<bool, HubError> {
        self.get_device(id).await?;
        let deleted = self.repo.delete(id).await?;
        if deleted {
            self.store.remove(id);
            self.publisher.publish(Event::new(
                EventType::DeviceRemoved,
                serde_json::json!({"device_id": id}),
            ));
        }
        Ok(deleted)
    }

    /// Get a device's state, preferring the cache and falling back to the
    /// HAL (caching the result).
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Communication`] when the state is uncached and
    /// the HAL is unreachable.
    pub async fn get_state(&self, id: &DeviceId) -> Result<DeviceState, HubError> {
        if let Some(state) = self.store.get(id) {
            return Ok(state);
        }
        let state = self.hal.get_state(id).await?;
        self.store.set(id.clone(), state);
        // read back so the caller sees the store-stamped timestamp
        self.store
            .get(id)
            .ok_or_else(|| Device::not_found(id).into())
    }

    /// Send a command to a device and refresh its cached state.
    ///
    /// Publishes `device_state_changed` when the command is accepted.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::NotFound`] when the device is not registered, or
    /// [`HubError::Communication`] when the HAL is unreachable.
    #[tracing::instrument(skip(self, command))]
    pub async fn control_device(
        &self,
        id: &DeviceId,
        command: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<bool, HubError> {
        self.get_device(id).await?;
        let accepted = self.hal.send_command(id, command).await?;
        if accepted {
            let state = self.hal.get_state(id).await?;
            self.store.set(id.clone(), state.clone());
            self.publisher.publish(Event::new(
                EventType::DeviceStateChanged,
                serde_json::json!({"device_id": id, "state": state, "command": command}),
            ));
        }
        Ok(accepted)
    }

    /// Force-refresh a device's cached state from the HAL.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Communication`] when the HAL is unreachable.
    #[tracing::instrument(skip(self))]
    pub async fn sync_state(&self, id: &DeviceId) -> Result<DeviceState, HubError> {
        let state = self.hal.get_state(id).await?;
        self.store.set(id.clone(), state.clone());
        self.publisher.publish(Event::new(
            EventType::DeviceStateChanged,
            serde_json::json!({"device_id": id, "state": &state, "source": "sync"}),
        ));
        Ok(state)
    }

    /// Load the state of every registered device into the store (startup
    /// path). Devices the HAL cannot answer for are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns a storage error from the repository.
    pub async fn preload_states(&self) -> Result<usize, HubError> {
        let devices = self.repo.get_all().await?;
        let mut loaded = 0_usize;
        for device in &devices {
            match self.hal.get_state(&device.id).await {
                Ok(state) => {
                    self.store.set(device.id.clone(), state);
                    loaded += 1;
                }
                Err(err) => {
                    tracing::warn!(device_id = %device.id, error = %err, "failed to load device state");
                }
            }
        }
        tracing::info!(loaded, total = devices.len(), "device states preloaded");
        Ok(loaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenehub_domain::error::CommunicationError;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    #[derive(Default)]
    struct InMemoryDeviceRepo {
        store: Mutex<HashMap<DeviceId, Device>>,
    }

    impl InMemoryDeviceRepo {
        fn with(devices: Vec<Device>) -> Self {
            let map: HashMap<_, _> = devices.into_iter().map(|d| (d.id.clone(), d)).collect();
            Self {
                store: Mutex::new(map),
            }
        }
    }

    impl DeviceRepository for InMemoryDeviceRepo {
        async fn get_all(&self) -> Result<Vec<Device>, HubError> {
            let mut devices: Vec<_> = self.store.lock().unwrap().values().cloned().collect();
            devices.sort_by(|a, b| a.id.cmp(&b.id));
            Ok(devices)
        }
        async fn get_by_id(&self, id: &DeviceId) -> Result<Option<Device>, HubError> {
            Ok(self.store.lock().unwrap().get(id).cloned())
        }
        async fn save(&self, device: Device) -> Result<Device, HubError> {
            self.store
                .lock()
                .unwrap()
                .insert(device.id.clone(), device.clone());
            Ok(device)
        }
        async fn delete(&self, id: &DeviceId) -> Result<bool, HubError> {
            Ok(self.store.lock().unwrap().remove(id).is_some())
        }
    }

    #[derive(Default)]
    struct FakeHal {
        unreachable: Mutex<HashSet<DeviceId>>,
        rejected: Mutex<HashSet<DeviceId>>,
    }

    impl FakeHal {
        fn mark_unreachable(&self, device_id: &str) {
            self.unreachable
                .lock()
                .unwrap()
                .insert(DeviceId::new(device_id));
        }
    }

    impl HalClient for FakeHal {
        async fn get_state(&self, device_id: &DeviceId) -> Result<DeviceState, CommunicationError> {
            if self.unreachable.lock().unwrap().contains(device_id) {
                return Err(CommunicationError::new(format!("no route to {device_id}")));
            }
            Ok(DeviceState::new("on").with_attribute("brightness", serde_json::json!(80)))
        }
        async fn send_command(
            &self,
            device_id: &DeviceId,
            _command: &serde_json::Map<String, serde_json::Value>,
        ) -> Result<bool, CommunicationError> {
            if self.unreachable.lock().unwrap().contains(device_id) {
                return Err(CommunicationError::new(format!("no route to {device_id}")));
            }
            Ok(!self.rejected.lock().unwrap().contains(device_id))
        }
        async fn health_check(&self) -> bool {
            true
        }
    }

    #[derive(Default)]
    struct SpyPublisher {
        events: Mutex<Vec<Event>>,
    }

    impl SpyPublisher {
        fn topics(&self) -> Vec<EventType> {
            self.events
                .lock()
                .unwrap()
                .iter()
                .map(|e| e.event_type)
                .collect()
        }
    }

    impl EventPublisher for SpyPublisher {
        fn publish(&self, event: Event) {
            self.events.lock().unwrap().push(event);
        }
    }

    struct Harness {
        service: DeviceService<InMemoryDeviceRepo, FakeHal, SpyPublisher>,
        hal: Arc<FakeHal>,
        store: Arc<StateStore>,
        publisher: Arc<SpyPublisher>,
    }

    fn harness(devices: Vec<Device>) -> Harness {
        let hal = Arc::new(FakeHal::default());
        let store = Arc::new(StateStore::new());
        let publisher = Arc::new(SpyPublisher::default());
        let service = DeviceService::new(
            Arc::new(InMemoryDeviceRepo::with(devices)),
            Arc::clone(&hal),
            Arc::clone(&store),
            Arc::clone(&publisher),
        );
        Harness {
            service,
            hal,
            store,
            publisher,
        }
    }

    fn light(id: &str) -> Device {
        Device {
            id: DeviceId::new(id),
            name: format!("device {id}"),
            device_type: "light".to_string(),
            config: None,
            created_at: scenehub_domain::time::now(),
        }
    }

    #[tokio::test]
    async fn should_add_device_and_seed_state_from_hal() {
        let h = harness(vec![]);
        h.service.add_device(light("light_01")).await.unwrap();

        let state = h.store.get(&DeviceId::new("light_01")).unwrap();
        assert_eq!(state.state, "on");
        assert_eq!(h.publisher.topics(), vec![EventType::DeviceAdded]);
    }

    #[tokio::test]
    async fn should_fall_back_to_unknown_state_when_hal_unreachable() {
        let h = harness(vec![]);
        h.hal.mark_unreachable("light_01");
        h.service.add_device(light("light_01")).await.unwrap();

        let state = h.store.get(&DeviceId::new("light_01")).unwrap();
        assert_eq!(state.state, "unknown");
    }

    #[tokio::test]
    async fn should_error_when_controlling_unknown_device() {
        let h = harness(vec![]);
        let result = h
            .service
            .control_device(&DeviceId::new("ghost"), &serde_json::Map::new())
            .await;
        assert!(matches!(result, Err(HubError::NotFound(_))));
    }

    #[tokio::test]
    async fn should_refresh_store_and_publish_on_successful_control() {
        let h = harness(vec![light("light_01")]);
        let mut command = serde_json::Map::new();
        command.insert("state".to_string(), serde_json::json!("on"));

        let accepted = h
            .service
            .control_device(&DeviceId::new("light_01"), &command)
            .await
            .unwrap();

        assert!(accepted);
        assert_eq!(h.store.get(&DeviceId::new("light_01")).unwrap().state, "on");
        assert_eq!(h.publisher.topics(), vec![EventType::DeviceStateChanged]);
    }

    #[tokio::test]
    async fn should_surface_communication_error_on_control() {
        let h = harness(vec![light("light_01")]);
        h.hal.mark_unreachable("light_01");
        let result = h
            .service
            .control_device(&DeviceId::new("light_01"), &serde_json::Map::new())
            .await;
        assert!(matches!(result, Err(HubError::Communication(_))));
    }

    #[tokio::test]
    async fn should_prefer_cached_state_over_hal() {
        let h = harness(vec![light("light_01")]);
        let id = DeviceId::new("light_01");
        h.store.set(id.clone(), DeviceState::new("cached"));

        let state = h.service.get_state(&id).await.unwrap();
        assert_eq!(state.state, "cached");
    }

    #[tokio::test]
    async fn should_fetch_and_cache_state_when_uncached() {
        let h = harness(vec![light("light_01")]);
        let id = DeviceId::new("light_01");

        let state = h.service.get_state(&id).await.unwrap();
        assert_eq!(state.state, "on");
        assert_eq!(h.store.count(), 1);
    }

    #[tokio::test]
    async fn should_force_refresh_on_sync() {
        let h = harness(vec![light("light_01")]);
        let id = DeviceId::new("light_01");
        h.store.set(id.clone(), DeviceState::new("stale"));

        let state = h.service.sync_state(&id).await.unwrap();
        assert_eq!(state.state, "on");
        assert_eq!(h.store.get(&id).unwrap().state, "on");
        assert_eq!(h.publisher.topics(), vec![EventType::DeviceStateChanged]);
    }

    #[tokio::test]
    async fn should_drop_cached_state_and_publish_on_remove() {
        let h = harness(vec![light("light_01")]);
        let id = DeviceId::new("light_01");
        h.store.set(id.clone(), DeviceState::new("on"));

        let removed = h.service.remove_device(&id).await.unwrap();
        assert!(removed);
        assert!(h.store.get(&id).is_none());
        assert_eq!(h.publisher.topics(), vec![EventType::DeviceRemoved]);
    }

    #[tokio::test]
    async fn should_preload_reachable_devices_and_skip_the_rest() {
        let h = harness(vec![light("light_01"), light("light_02")]);
        h.hal.mark_unreachable("light_02");

        let loaded = h.service.preload_states().await.unwrap();
        assert_eq!(loaded, 1);
        assert!(h.store.get(&DeviceId::new("light_01")).is_some());
        assert!(h.store.get(&DeviceId::new("light_02")).is_none());
    }
}
