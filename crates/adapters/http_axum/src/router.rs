//! Axum router assembly.

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use scenehub_app::ports::{DeviceRepository, EventPublisher, HalClient, SceneRepository};

use crate::state::AppState;

/// Build the top-level axum [`Router`].
///
/// Nests the API under `/api` and includes a [`TraceLayer`] that logs each
/// HTTP request/response at the `DEBUG` level using the `tracing`
/// ecosystem.
pub fn build<SR, DR, H, P>(state: AppState<SR, DR, H, P>) -> Router
where
    SR: SceneRepository + Send + Sync + 'static,
    DR: DeviceRepository + Send + Sync + 'static,
    H: HalClient + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", crate::api::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use http_body_util::BodyExt;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use tower::ServiceExt;

    use scenehub_app::executor::SceneExecutor;
    use scenehub_app::scheduler::SceneScheduler;
    use scenehub_app::services::device_service::DeviceService;
    use scenehub_app::services::scene_service::SceneService;
    use scenehub_app::state_store::StateStore;
    use scenehub_domain::device::{Device, DeviceState};
    use scenehub_domain::error::{CommunicationError, HubError};
    use scenehub_domain::event::Event as DomainEvent;
    use scenehub_domain::id::{DeviceId, SceneId};
    use scenehub_domain::scene::Scene;

    #[derive(Default)]
    struct InMemorySceneRepo {
        store: Mutex<HashMap<SceneId, Scene>>,
    }

    impl SceneRepository for InMemorySceneRepo {
        async fn get_all(&self, active_only: bool) -> Result<Vec<Scene>, HubError> {
            Ok(self
                .store
                .lock()
                .unwrap()
                .values()
                .filter(|s| !active_only || s.is_active)
                .cloned()
                .collect())
        }
        async fn get_by_id(&self, id: &SceneId) -> Result<Option<Scene>, HubError> {
            Ok(self.store.lock().unwrap().get(id).cloned())
        }
        async fn save(&self, scene: Scene) -> Result<Scene, HubError> {
            self.store
                .lock()
                .unwrap()
                .insert(scene.id.clone(), scene.clone());
            Ok(scene)
        }
        async fn set_active(&self, id: &SceneId, is_active: bool) -> Result<(), HubError> {
            if let Some(scene) = self.store.lock().unwrap().get_mut(id) {
                scene.is_active = is_active;
            }
            Ok(())
        }
        async fn delete(&self, id: &SceneId) -> Result<bool, HubError> {
            Ok(self.store.lock().unwrap().remove(id).is_some())
        }
    }

    #[derive(Default)]
    struct InMemoryDeviceRepo {
        store: Mutex<HashMap<DeviceId, Device>>,
    }

    impl DeviceRepository for InMemoryDeviceRepo {
        async fn get_all(&self) -> Result<Vec<Device>, HubError> {
            Ok(self.store.lock().unwrap().values().cloned().collect())
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

    struct FakeHal;

    impl HalClient for FakeHal {
        async fn get_state(
            &self,
            _device_id: &DeviceId,
        ) -> Result<DeviceState, CommunicationError> {
            Ok(DeviceState::new("on"))
        }
        async fn send_command(
            &self,
            _device_id: &DeviceId,
            _command: &serde_json::Map<String, serde_json::Value>,
        ) -> Result<bool, CommunicationError> {
            Ok(true)
        }
        async fn health_check(&self) -> bool {
            true
        }
    }

    struct NullPublisher;

    impl EventPublisher for NullPublisher {
        fn publish(&self, _event: DomainEvent) {}
    }

    fn test_app() -> Router {
        let scene_repo = Arc::new(InMemorySceneRepo::default());
        let device_repo = Arc::new(InMemoryDeviceRepo::default());
        let hal = Arc::new(FakeHal);
        let store = Arc::new(StateStore::new());
        let scheduler = Arc::new(SceneScheduler::new(chrono_tz::UTC));
        let publisher = Arc::new(NullPublisher);
        let executor = Arc::new(SceneExecutor::new(
            Arc::clone(&hal),
            Arc::clone(&store),
            chrono_tz::UTC,
        ));
        let scene_service = Arc::new(SceneService::new(
            scene_repo,
            Arc::clone(&hal),
            Arc::clone(&store),
            executor,
            Arc::clone(&scheduler),
            Arc::clone(&publisher),
        ));
        let device_service = Arc::new(DeviceService::new(
            device_repo,
            Arc::clone(&hal),
            Arc::clone(&store),
            publisher,
        ));
        let (events, _) = tokio::sync::broadcast::channel(16);
        build(AppState::new(
            scene_service,
            device_service,
            store,
            scheduler,
            hal,
            events,
        ))
    }

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn should_return_ok_when_health_check_called() {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn should_create_and_get_scene() {
        let app = test_app();

        let created = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/scenes",
                serde_json::json!({
                    "id": "scene_001",
                    "name": "Evening lights",
                    "definition": {
                        "triggers": [{"type": "manual"}],
                        "actions": [
                            {"type": "device_control", "device_id": "light_01", "command": {"state": "on"}}
                        ]
                    }
                }),
            ))
            .await
            .unwrap();
        assert_eq!(created.status(), StatusCode::CREATED);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/scenes/scene_001")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["name"], "Evening lights");
        assert_eq!(body["is_active"], true);
    }

    #[tokio::test]
    async fn should_reject_invalid_definition_with_bad_request() {
        let response = test_app()
            .oneshot(json_request(
                "POST",
                "/api/scenes",
                serde_json::json!({
                    "id": "scene_001",
                    "name": "broken",
                    "definition": {"triggers": [{"type": "sunset"}], "actions": []}
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn should_return_not_found_for_unknown_scene() {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .uri("/api/scenes/ghost")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn should_trigger_scene_and_return_execution_result() {
        let app = test_app();
        app.clone()
            .oneshot(json_request(
                "POST",
                "/api/scenes",
                serde_json::json!({
                    "id": "scene_001",
                    "name": "Evening lights",
                    "definition": {
                        "actions": [
                            {"type": "device_control", "device_id": "light_01", "command": {"state": "on"}}
                        ]
                    }
                }),
            ))
            .await
            .unwrap();

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/scenes/scene_001/trigger",
                serde_json::json!({}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "success");
        assert_eq!(body["scene_id"], "scene_001");
    }

    #[tokio::test]
    async fn should_register_device_and_read_state() {
        let app = test_app();

        let created = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/devices",
                serde_json::json!({
                    "id": "light_01",
                    "name": "Living room light",
                    "type": "light"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(created.status(), StatusCode::CREATED);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/devices/light_01/state")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["state"], "on");
    }

    #[tokio::test]
    async fn should_report_system_status() {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .uri("/api/system/status")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "running");
        assert_eq!(body["hal_connected"], true);
    }
}
