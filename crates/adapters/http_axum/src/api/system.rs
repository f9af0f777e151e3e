//! System status and health handlers.

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use scenehub_app::ports::{DeviceRepository, EventPublisher, HalClient, SceneRepository};

use crate::state::AppState;

/// Response body for the system status endpoint.
#[derive(Serialize)]
pub struct SystemStatusResponse {
    pub status: &'static str,
    pub hal_connected: bool,
    pub device_count: usize,
    pub scheduled_scene_count: usize,
    pub version: &'static str,
}

/// `GET /api/system/status` — controller status overview.
pub async fn status<SR, DR, H, P>(
    State(state): State<AppState<SR, DR, H, P>>,
) -> Json<SystemStatusResponse>
where
    SR: SceneRepository + Send + Sync + 'static,
    DR: DeviceRepository + Send + Sync + 'static,
    H: HalClient + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let hal_connected = state.hal.health_check().await;
    Json(SystemStatusResponse {
        status: "running",
        hal_connected,
        device_count: state.store.count(),
        scheduled_scene_count: state.scheduler.scheduled_scene_ids().len(),
        version: env!("CARGO_PKG_VERSION"),
    })
}
