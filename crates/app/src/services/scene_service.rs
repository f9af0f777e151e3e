//! Scene service — use-cases for managing and triggering scenes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use scenehub_domain::error::HubError;
use scenehub_domain::event::{Event, EventType};
use scenehub_domain::id::{DeviceId, SceneId};
use scenehub_domain::scene::{Scene, SceneDefinition};

use crate::executor::{ExecutionResult, ExecutionStatus, SceneExecutor};
use crate::ports::{EventPublisher, HalClient, SceneRepository};
use crate::scheduler::SceneScheduler;
use crate::state_store::StateStore;

/// Trigger source recorded for scheduler firings.
pub const TRIGGERED_BY_SCHEDULE: &str = "schedule";
/// Trigger source recorded for device-state firings.
pub const TRIGGERED_BY_DEVICE: &str = "device_state";
/// Trigger source recorded for manual API calls.
pub const TRIGGERED_BY_MANUAL: &str = "manual";

/// Input for creating a scene: an untrusted definition plus metadata.
#[derive(Debug, Clone)]
pub struct SceneDraft {
    pub id: SceneId,
    pub name: String,
    pub description: Option<String>,
    pub definition: serde_json::Value,
    pub is_active: bool,
}

/// Partial update of a scene; absent fields keep their current value.
#[derive(Debug, Clone, Default)]
pub struct SceneUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub definition: Option<serde_json::Value>,
    pub is_active: Option<bool>,
}

/// Per-scene execution locks.
///
/// Two concurrent triggers of the same scene id would otherwise interleave
/// their action sequences; the second trigger waits for the first to
/// finish. Locks for different scene ids are independent.
#[derive(Default)]
struct RunLocks {
    locks: Mutex<HashMap<SceneId, Arc<tokio::sync::Mutex<()>>>>,
}

impl RunLocks {
    async fn acquire(&self, scene_id: &SceneId) -> tokio::sync::OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(scene_id.clone()).or_default())
        };
        lock.lock_owned().await
    }
}

/// Application service for scene CRUD, scheduling, and execution.
pub struct SceneService<SR, H, P> {
    repo: Arc<SR>,
    hal: Arc<H>,
    store: Arc<StateStore>,
    executor: Arc<SceneExecutor<H>>,
    scheduler: Arc<SceneScheduler>,
    publisher: Arc<P>,
    run_locks: Arc<RunLocks>,
}

impl<SR, H, P> Clone for SceneService<SR, H, P> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
            hal: Arc::clone(&self.hal),
            store: Arc::clone(&self.store),
            executor: Arc::clone(&self.executor),
            scheduler: Arc::clone(&self.scheduler),
            publisher: Arc::clone(&self.publisher),
            run_locks: Arc::clone(&self.run_locks),
        }
    }
}

impl<SR, H, P> SceneService<SR, H, P>
where
    SR: SceneRepository + Send + Sync + 'static,
    H: HalClient + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    /// Create a new service from shared engine components.
    pub fn new(
        repo: Arc<SR>,
        hal: Arc<H>,
        store: Arc<StateStore>,
        executor: Arc<SceneExecutor<H>>,
        scheduler: Arc<SceneScheduler>,
        publisher: Arc<P>,
    ) -> Self {
        Self {
            repo,
            hal,
            store,
            executor,
            scheduler,
            publisher,
            run_locks: Arc::new(RunLocks::default()),
        }
    }

    /// List all scenes, optionally only the active ones.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_scenes(&self, active_only: bool) -> Result<Vec<Scene>, HubError> {
        self.repo.get_all(active_only).await
    }

    /// Look up a scene by id, returning an error if not found.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::NotFound`] when no scene with `id` exists, or a
    /// storage error from the repository.
    pub async fn get_scene(&self, id: &SceneId) -> Result<Scene, HubError> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| Scene::not_found(id).into())
    }

    /// Parse, persist, and (when active) schedule a new scene.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Definition`] when the definition is invalid, or
    /// a storage error from the repository.
    #[tracing::instrument(skip(self, draft), fields(scene_id = %draft.id))]
    pub async fn create_scene(&self, draft: SceneDraft) -> Result<Scene, HubError> {
        let definition = SceneDefinition::parse(draft.definition)?;
        let scene = Scene {
            id: draft.id,
            name: draft.name,
            description: draft.description,
            definition,
            is_active: draft.is_active,
            created_at: scenehub_domain::time::now(),
        };
        scene.validate()?;

        let scene = self.repo.save(scene).await?;
        if scene.is_active {
            self.register_schedule(&scene);
        }
        self.publisher.publish(Event::new(
            EventType::SceneAdded,
            serde_json::json!({"scene_id": &scene.id, "scene": &scene}),
        ));
        Ok(scene)
    }

    /// Apply a partial update, replacing the stored scene wholesale and
    /// re-registering its schedule.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::NotFound`] when the scene does not exist,
    /// [`HubError::Definition`] when the new definition is invalid, or a
    /// storage error from the repository.
    #[tracing::instrument(skip(self, update))]
    pub async fn update_scene(&self, id: &SceneId, update: SceneUpdate) -> Result<Scene, HubError> {
        let existing = self.get_scene(id).await?;
        let definition = match update.definition {
            Some(raw) => SceneDefinition::parse(raw)?,
            None => existing.definition,
        };
        let scene = Scene {
            id: existing.id,
            name: update.name.unwrap_or(existing.name),
            description: update.description.or(existing.description),
            definition,
            is_active: update.is_active.unwrap_or(existing.is_active),
            created_at: existing.created_at,
        };
        scene.validate()?;

        let scene = self.repo.save(scene).await?;
        self.scheduler.unregister(&scene.id);
        if scene.is_active {
            self.register_schedule(&scene);
        }
        self.publisher.publish(Event::new(
            EventType::SceneUpdated,
            serde_json::json!({"scene_id": &scene.id, "scene": &scene}),
        ));
        Ok(scene)
    }

    /// Delete a scene, cancelling its future firings.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::NotFound`] when the scene does not exist, or a
    /// storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn delete_scene(&self, id: &SceneId) -> Result<bool, HubError> {
        self.get_scene(id).await?;
        self.scheduler.unregister(id);
        let deleted = self.repo.delete(id).await?;
        if deleted {
            self.publisher.publish(Event::new(
                EventType::SceneRemoved,
                serde_json::json!({"scene_id": id}),
            ));
        }
        Ok(deleted)
    }

    /// Activate or deactivate a scene, updating its schedule accordingly.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::NotFound`] when the scene does not exist, or a
    /// storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn set_active(&self, id: &SceneId, is_active: bool) -> Result<Scene, HubError> {
        let mut scene = self.get_scene(id).await?;
        self.repo.set_active(id, is_active).await?;
        scene.is_active = is_active;
        if is_active {
            self.register_schedule(&scene);
        } else {
            self.scheduler.unregister(id);
        }
        Ok(scene)
    }

    /// Trigger one scene run.
    ///
    /// An inactive scene short-circuits to a `skipped` result without
    /// publishing or touching the HAL. Otherwise a `scene_triggered` event
    /// goes out, the executor runs under the per-scene lock, the state
    /// store is refreshed for devices the scene controlled, and a
    /// `scene_completed`/`scene_failed` event reports the outcome.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::NotFound`] when the scene does not exist, or a
    /// storage error from the repository. Action failures do not error;
    /// they yield a `failed` result.
    #[tracing::instrument(skip(self))]
    pub async fn trigger_scene(
        &self,
        id: &SceneId,
        triggered_by: &str,
    ) -> Result<ExecutionResult, HubError> {
        let scene = self.get_scene(id).await?;
        if !scene.is_active {
            return Ok(ExecutionResult::skipped(
                scene.id.clone(),
                "scene is not active",
            ));
        }

        self.publisher.publish(Event::new(
            EventType::SceneTriggered,
            serde_json::json!({"scene_id": id, "triggered_by": triggered_by}),
        ));

        let guard = self.run_locks.acquire(id).await;
        let result = self.executor.execute(&scene, triggered_by).await;
        match result.status {
            ExecutionStatus::Success => {
                self.refresh_after_run(&scene).await;
                self.publisher.publish(Event::new(
                    EventType::SceneCompleted,
                    serde_json::json!(&result),
                ));
            }
            ExecutionStatus::Failed => {
                self.publisher
                    .publish(Event::new(EventType::SceneFailed, serde_json::json!(&result)));
            }
            ExecutionStatus::Skipped => {}
        }
        drop(guard);

        Ok(result)
    }

    /// Trigger every active scene with a `device_state` trigger matching
    /// the reported state.
    ///
    /// Failures of individual scenes are logged and do not affect the
    /// others.
    ///
    /// # Errors
    ///
    /// Returns a storage error from the repository when the scene list
    /// cannot be loaded.
    pub async fn handle_state_change(
        &self,
        device_id: &DeviceId,
        state: &scenehub_domain::device::DeviceState,
    ) -> Result<Vec<ExecutionResult>, HubError> {
        let scenes = self.repo.get_all(true).await?;
        let mut results = Vec::new();
        for scene in scenes {
            let matched = scene
                .definition
                .triggers
                .iter()
                .any(|trigger| trigger.matches_state_change(device_id, state));
            if !matched {
                continue;
            }
            match self.trigger_scene(&scene.id, TRIGGERED_BY_DEVICE).await {
                Ok(result) => results.push(result),
                Err(err) => {
                    tracing::warn!(scene_id = %scene.id, error = %err, "device-state trigger failed");
                }
            }
        }
        Ok(results)
    }

    /// Register the schedules of all active scenes (startup path).
    ///
    /// # Errors
    ///
    /// Returns a storage error from the repository.
    pub async fn register_active_scenes(&self) -> Result<usize, HubError> {
        let scenes = self.repo.get_all(true).await?;
        for scene in &scenes {
            self.register_schedule(scene);
        }
        Ok(scenes.len())
    }

    fn register_schedule(&self, scene: &Scene) {
        let service = self.clone();
        self.scheduler.register(scene, move |scene: Scene| {
            let service = service.clone();
            async move {
                match service
                    .trigger_scene(&scene.id, TRIGGERED_BY_SCHEDULE)
                    .await
                {
                    Ok(result) => {
                        tracing::debug!(scene_id = %scene.id, status = %result.status, "scheduled run finished");
                    }
                    Err(err) => {
                        tracing::warn!(scene_id = %scene.id, error = %err, "scheduled trigger failed");
                    }
                }
            }
        });
    }

    /// Refresh cached state from the HAL for every device the scene
    /// controlled, announcing each refresh on the bus. Best-effort: a
    /// failed read is logged and skipped.
    async fn refresh_after_run(&self, scene: &Scene) {
        let mut refreshed = std::collections::BTreeSet::new();
        for action in &scene.definition.actions {
            let scenehub_domain::scene::Action::DeviceControl { device_id, .. } = action else {
                continue;
            };
            if !refreshed.insert(device_id.clone()) {
                continue;
            }
            match self.hal.get_state(device_id).await {
                Ok(state) => {
                    self.store.set(device_id.clone(), state.clone());
                    self.publisher.publish(Event::new(
                        EventType::DeviceStateChanged,
                        serde_json::json!({
                            "device_id": device_id,
                            "state": state,
                            "source": "scene",
                        }),
                    ));
                }
                Err(err) => {
                    tracing::warn!(%device_id, error = %err, "state refresh after scene run failed");
                }
            }
        }
    }
}
