//! JSON REST handlers for devices.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use scenehub_app::ports::{DeviceRepository, EventPublisher, HalClient, SceneRepository};
use scenehub_domain::device::{Device, DeviceState};
use scenehub_domain::id::DeviceId;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for registering a device.
#[derive(Deserialize)]
pub struct CreateDeviceRequest {
    pub id: DeviceId,
    pub name: String,
    #[serde(rename = "type")]
    pub device_type: String,
    #[serde(default)]
    pub config: Option<serde_json::Value>,
}

/// Response body for control requests.
#[derive(Serialize)]
pub struct ControlResponse {
    pub success: bool,
}

/// Possible responses from the create endpoint.
pub enum CreateResponse {
    Created(Json<Device>),
}

impl IntoResponse for CreateResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Created(json) => (StatusCode::CREATED, json).into_response(),
        }
    }
}

/// `GET /api/devices` — list all devices.
pub async fn list<SR, DR, H, P>(
    State(state): State<AppState<SR, DR, H, P>>,
) -> Result<Json<Vec<Device>>, ApiError>
where
    SR: SceneRepository + Send + Sync + 'static,
    DR: DeviceRepository + Send + Sync + 'static,
    H: HalClient + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let devices = state.device_service.list_devices().await?;
    Ok(Json(devices))
}

/// `GET /api/devices/{id}` — get a device by id.
pub async fn get<SR, DR, H, P>(
    State(state): State<AppState<SR, DR, H, P>>,
    Path(id): Path<String>,
) -> Result<Json<Device>, ApiError>
where
    SR: SceneRepository + Send + Sync + 'static,
    DR: DeviceRepository + Send + Sync + 'static,
    H: HalClient + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let device = state.device_service.get_device(&DeviceId::new(id)).await?;
    Ok(Json(device))
}

/// `POST /api/devices` — register a new device.
pub async fn create<SR, DR, H, P>(
    State(state): State<AppState<SR, DR, H, P>>,
    Json(req): Json<CreateDeviceRequest>,
) -> Result<CreateResponse, ApiError>
where
    SR: SceneRepository + Send + Sync + 'static,
    DR: DeviceRepository + Send + Sync + 'static,
    H: HalClient + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let device = state
        .device_service
        .add_device(Device {
            id: req.id,
            name: req.name,
            device_type: req.device_type,
            config: req.config,
            created_at: scenehub_domain::time::now(),
        })
        .await?;
    Ok(CreateResponse::Created(Json(device)))
}

/// `DELETE /api/devices/{id}` — remove a device.
pub async fn delete<SR, DR, H, P>(
    State(state): State<AppState<SR, DR, H, P>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError>
where
    SR: SceneRepository + Send + Sync + 'static,
    DR: DeviceRepository + Send + Sync + 'static,
    H: HalClient + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    state
        .device_service
        .remove_device(&DeviceId::new(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/devices/{id}/state` — current (cache-first) device state.
pub async fn state<SR, DR, H, P>(
    State(state): State<AppState<SR, DR, H, P>>,
    Path(id): Path<String>,
) -> Result<Json<DeviceState>, ApiError>
where
    SR: SceneRepository + Send + Sync + 'static,
    DR: DeviceRepository + Send + Sync + 'static,
    H: HalClient + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let device_state = state.device_service.get_state(&DeviceId::new(id)).await?;
    Ok(Json(device_state))
}

/// `POST /api/devices/{id}/control` — send a command map to a device.
pub async fn control<SR, DR, H, P>(
    State(state): State<AppState<SR, DR, H, P>>,
    Path(id): Path<String>,
    Json(command): Json<serde_json::Map<String, serde_json::Value>>,
) -> Result<Json<ControlResponse>, ApiError>
where
    SR: SceneRepository + Send + Sync + 'static,
    DR: DeviceRepository + Send + Sync + 'static,
    H: HalClient + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let success = state
        .device_service
        .control_device(&DeviceId::new(id), &command)
        .await?;
    Ok(Json(ControlResponse { success }))
}

/// `POST /api/devices/{id}/sync` — force-refresh a device's cached state.
pub async fn sync<SR, DR, H, P>(
    State(state): State<AppState<SR, DR, H, P>>,
    Path(id): Path<String>,
) -> Result<Json<DeviceState>, ApiError>
where
    SR: SceneRepository + Send + Sync + 'static,
    DR: DeviceRepository + Send + Sync + 'static,
    H: HalClient + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let device_state = state.device_service.sync_state(&DeviceId::new(id)).await?;
    Ok(Json(device_state))
}
