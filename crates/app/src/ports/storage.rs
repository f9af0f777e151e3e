//! Storage ports — repository traits for persistence.

use std::future::Future;

use scenehub_domain::device::Device;
use scenehub_domain::error::HubError;
use scenehub_domain::id::{DeviceId, SceneId};
use scenehub_domain::scene::Scene;

/// Repository for persisting and querying [`Device`]s.
pub trait DeviceRepository {
    /// Get all devices.
    fn get_all(&self) -> impl Future<Output = Result<Vec<Device>, HubError>> + Send;

    /// Get a device by its identifier.
    fn get_by_id(
        &self,
        id: &DeviceId,
    ) -> impl Future<Output = Result<Option<Device>, HubError>> + Send;

    /// Insert or update a device by id.
    fn save(&self, device: Device) -> impl Future<Output = Result<Device, HubError>> + Send;

    /// Delete a device; returns whether a record was removed.
    fn delete(&self, id: &DeviceId) -> impl Future<Output = Result<bool, HubError>> + Send;
}

impl<T: DeviceRepository + Send + Sync> DeviceRepository for std::sync::Arc<T> {
    fn get_all(&self) -> impl Future<Output = Result<Vec<Device>, HubError>> + Send {
        (**self).get_all()
    }

    fn get_by_id(
        &self,
        id: &DeviceId,
    ) -> impl Future<Output = Result<Option<Device>, HubError>> + Send {
        (**self).get_by_id(id)
    }

    fn save(&self, device: Device) -> impl Future<Output = Result<Device, HubError>> + Send {
        (**self).save(device)
    }

    fn delete(&self, id: &DeviceId) -> impl Future<Output = Result<bool, HubError>> + Send {
        (**self).delete(id)
    }
}

/// Repository for persisting and querying [`Scene`]s.
pub trait SceneRepository {
    /// Get all scenes, optionally restricted to active ones.
    fn get_all(&self, active_only: bool)
    -> impl Future<Output = Result<Vec<Scene>, HubError>> + Send;

    /// Get a scene by its identifier.
    fn get_by_id(&self, id: &SceneId)
    -> impl Future<Output = Result<Option<Scene>, HubError>> + Send;

    /// Insert or update a scene by id; updates replace the whole record.
    fn save(&self, scene: Scene) -> impl Future<Output = Result<Scene, HubError>> + Send;

    /// Update only the activation flag of a scene.
    fn set_active(
        &self,
        id: &SceneId,
        is_active: bool,
    ) -> impl Future<Output = Result<(), HubError>> + Send;

    /// Delete a scene; returns whether a record was removed.
    fn delete(&self, id: &SceneId) -> impl Future<Output = Result<bool, HubError>> + Send;
}

impl<T: SceneRepository + Send + Sync> SceneRepository for std::sync::Arc<T> {
    fn get_all(
        &self,
        active_only: bool,
    ) -> impl Future<Output = Result<Vec<Scene>, HubError>> + Send {
        (**self).get_all(active_only)
    }

    fn get_by_id(
        &self,
        id: &SceneId,
    ) -> impl Future<Output = Result<Option<Scene>, HubError>> + Send {
        (**self).get_by_id(id)
    }

    fn save(&self, scene: Scene) -> impl Future<Output = Result<Scene, HubError>> + Send {
        (**self).save(scene)
    }

    fn set_active(
        &self,
        id: &SceneId,
        is_active: bool,
    ) -> impl Future<Output = Result<(), HubError>> + Send {
        (**self).set_active(id, is_active)
    }

    fn delete(&self, id: &SceneId) -> impl Future<Output = Result<bool, HubError>> + Send {
        (**self).delete(id)
    }
}
