//! JSON REST handlers for scenes.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use scenehub_app::executor::ExecutionResult;
use scenehub_app::ports::{DeviceRepository, EventPublisher, HalClient, SceneRepository};
use scenehub_app::services::scene_service::{SceneDraft, SceneUpdate, TRIGGERED_BY_MANUAL};
use scenehub_domain::id::SceneId;
use scenehub_domain::scene::Scene;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for creating a scene.
#[derive(Deserialize)]
pub struct CreateSceneRequest {
    pub id: SceneId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub definition: serde_json::Value,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// Request body for updating a scene; absent fields keep their value.
#[derive(Deserialize, Default)]
#[serde(default)]
pub struct UpdateSceneRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub definition: Option<serde_json::Value>,
    pub is_active: Option<bool>,
}

/// Request body for (de)activating a scene.
#[derive(Deserialize)]
pub struct ActivateSceneRequest {
    pub is_active: bool,
}

/// Query parameters for the list endpoint.
#[derive(Deserialize, Default)]
#[serde(default)]
pub struct ListScenesQuery {
    pub active_only: bool,
}

/// Possible responses from the create endpoint.
pub enum CreateResponse {
    Created(Json<Scene>),
}

impl IntoResponse for CreateResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Created(json) => (StatusCode::CREATED, json).into_response(),
        }
    }
}

/// Possible responses from the delete endpoint.
pub enum DeleteResponse {
    NoContent,
}

impl IntoResponse for DeleteResponse {
    fn into_response(self) -> Response {
        match self {
            Self::NoContent => StatusCode::NO_CONTENT.into_response(),
        }
    }
}

/// `GET /api/scenes` — list scenes, optionally only active ones.
pub async fn list<SR, DR, H, P>(
    State(state): State<AppState<SR, DR, H, P>>,
    Query(query): Query<ListScenesQuery>,
) -> Result<Json<Vec<Scene>>, ApiError>
where
    SR: SceneRepository + Send + Sync + 'static,
    DR: DeviceRepository + Send + Sync + 'static,
    H: HalClient + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let scenes = state.scene_service.list_scenes(query.active_only).await?;
    Ok(Json(scenes))
}

/// `GET /api/scenes/{id}` — get a scene by id.
pub async fn get<SR, DR, H, P>(
    State(state): State<AppState<SR, DR, H, P>>,
    Path(id): Path<String>,
) -> Result<Json<Scene>, ApiError>
where
    SR: SceneRepository + Send + Sync + 'static,
    DR: DeviceRepository + Send + Sync + 'static,
    H: HalClient + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let scene = state.scene_service.get_scene(&SceneId::new(id)).await?;
    Ok(Json(scene))
}

/// `POST /api/scenes` — create a new scene.
pub async fn create<SR, DR, H, P>(
    State(state): State<AppState<SR, DR, H, P>>,
    Json(req): Json<CreateSceneRequest>,
) -> Result<CreateResponse, ApiError>
where
    SR: SceneRepository + Send + Sync + 'static,
    DR: DeviceRepository + Send + Sync + 'static,
    H: HalClient + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let scene = state
        .scene_service
        .create_scene(SceneDraft {
            id: req.id,
            name: req.name,
            description: req.description,
            definition: req.definition,
            is_active: req.is_active,
        })
        .await?;
    Ok(CreateResponse::Created(Json(scene)))
}

/// `PUT /api/scenes/{id}` — partially update a scene.
pub async fn update<SR, DR, H, P>(
    State(state): State<AppState<SR, DR, H, P>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateSceneRequest>,
) -> Result<Json<Scene>, ApiError>
where
    SR: SceneRepository + Send + Sync + 'static,
    DR: DeviceRepository + Send + Sync + 'static,
    H: HalClient + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let scene = state
        .scene_service
        .update_scene(
            &SceneId::new(id),
            SceneUpdate {
                name: req.name,
                description: req.description,
                definition: req.definition,
                is_active: req.is_active,
            },
        )
        .await?;
    Ok(Json(scene))
}

/// `DELETE /api/scenes/{id}` — delete a scene.
pub async fn delete<SR, DR, H, P>(
    State(state): State<AppState<SR, DR, H, P>>,
    Path(id): Path<String>,
) -> Result<DeleteResponse, ApiError>
where
    SR: SceneRepository + Send + Sync + 'static,
    DR: DeviceRepository + Send + Sync + 'static,
    H: HalClient + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    state.scene_service.delete_scene(&SceneId::new(id)).await?;
    Ok(DeleteResponse::NoContent)
}

/// `POST /api/scenes/{id}/activate` — activate or deactivate a scene.
pub async fn activate<SR, DR, H, P>(
    State(state): State<AppState<SR, DR, H, P>>,
    Path(id): Path<String>,
    Json(req): Json<ActivateSceneRequest>,
) -> Result<Json<Scene>, ApiError>
where
    SR: SceneRepository + Send + Sync + 'static,
    DR: DeviceRepository + Send + Sync + 'static,
    H: HalClient + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let scene = state
        .scene_service
        .set_active(&SceneId::new(id), req.is_active)
        .await?;
    Ok(Json(scene))
}

/// `POST /api/scenes/{id}/trigger` — run a scene now.
pub async fn trigger<SR, DR, H, P>(
    State(state): State<AppState<SR, DR, H, P>>,
    Path(id): Path<String>,
) -> Result<Json<ExecutionResult>, ApiError>
where
    SR: SceneRepository + Send + Sync + 'static,
    DR: DeviceRepository + Send + Sync + 'static,
    H: HalClient + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let result = state
        .scene_service
        .trigger_scene(&SceneId::new(id), TRIGGERED_BY_MANUAL)
        .await?;
    Ok(Json(result))
}
