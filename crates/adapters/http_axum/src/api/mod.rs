//! JSON REST API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod devices;
#[allow(clippy::missing_errors_doc)]
pub mod scenes;
pub mod sse;
pub mod system;

use axum::Router;
use axum::routing::{get, post};

use scenehub_app::ports::{DeviceRepository, EventPublisher, HalClient, SceneRepository};

use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes<SR, DR, H, P>() -> Router<AppState<SR, DR, H, P>>
where
    SR: SceneRepository + Send + Sync + 'static,
    DR: DeviceRepository + Send + Sync + 'static,
    H: HalClient + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    Router::new()
        // Devices
        .route(
            "/devices",
            get(devices::list::<SR, DR, H, P>).post(devices::create::<SR, DR, H, P>),
        )
        .route(
            "/devices/{id}",
            get(devices::get::<SR, DR, H, P>).delete(devices::delete::<SR, DR, H, P>),
        )
        .route("/devices/{id}/state", get(devices::state::<SR, DR, H, P>))
        .route(
            "/devices/{id}/control",
            post(devices::control::<SR, DR, H, P>),
        )
        .route("/devices/{id}/sync", post(devices::sync::<SR, DR, H, P>))
        // Scenes
        .route(
            "/scenes",
            get(scenes::list::<SR, DR, H, P>).post(scenes::create::<SR, DR, H, P>),
        )
        .route(
            "/scenes/{id}",
            get(scenes::get::<SR, DR, H, P>)
                .put(scenes::update::<SR, DR, H, P>)
                .delete(scenes::delete::<SR, DR, H, P>),
        )
        .route(
            "/scenes/{id}/activate",
            post(scenes::activate::<SR, DR, H, P>),
        )
        .route("/scenes/{id}/trigger", post(scenes::trigger::<SR, DR, H, P>))
        // System
        .route("/system/status", get(system::status::<SR, DR, H, P>))
        // Live event stream
        .route("/events/stream", get(sse::stream::<SR, DR, H, P>))
}
