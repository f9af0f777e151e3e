//! Shared application state for axum handlers.

use std::sync::Arc;

use tokio::sync::broadcast;

use scenehub_app::ports::{DeviceRepository, EventPublisher, HalClient, SceneRepository};
use scenehub_app::scheduler::SceneScheduler;
use scenehub_app::services::device_service::DeviceService;
use scenehub_app::services::scene_service::SceneService;
use scenehub_app::state_store::StateStore;
use scenehub_domain::event::Event;

/// Application state shared across all axum handlers.
///
/// Generic over the repository, HAL, and publisher types to avoid dynamic
/// dispatch. `Clone` is implemented manually so the underlying types
/// themselves do not need to be `Clone` — only the `Arc` wrappers are
/// cloned.
pub struct AppState<SR, DR, H, P> {
    /// Scene CRUD, scheduling, and execution service.
    pub scene_service: Arc<SceneService<SR, H, P>>,
    /// Device CRUD, control, and state service.
    pub device_service: Arc<DeviceService<DR, H, P>>,
    /// In-memory device state cache (system status introspection).
    pub store: Arc<StateStore>,
    /// Scheduler (system status introspection).
    pub scheduler: Arc<SceneScheduler>,
    /// HAL client (health probe).
    pub hal: Arc<H>,
    /// Broadcast channel feeding the SSE event stream.
    pub events: broadcast::Sender<Event>,
}

impl<SR, DR, H, P> Clone for AppState<SR, DR, H, P> {
    fn clone(&self) -> Self {
        Self {
            scene_service: Arc::clone(&self.scene_service),
            device_service: Arc::clone(&self.device_service),
            store: Arc::clone(&self.store),
            scheduler: Arc::clone(&self.scheduler),
            hal: Arc::clone(&self.hal),
            events: self.events.clone(),
        }
    }
}

impl<SR, DR, H, P> AppState<SR, DR, H, P>
where
    SR: SceneRepository + Send + Sync + 'static,
    DR: DeviceRepository + Send + Sync + 'static,
    H: HalClient + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    /// Create a new application state from pre-wrapped shared components.
    pub fn new(
        scene_service: Arc<SceneService<SR, H, P>>,
        device_service: Arc<DeviceService<DR, H, P>>,
        store: Arc<StateStore>,
        scheduler: Arc<SceneScheduler>,
        hal: Arc<H>,
        events: broadcast::Sender<Event>,
    ) -> Self {
        Self {
            scene_service,
            device_service,
            store,
            scheduler,
            hal,
            events,
        }
    }
}
