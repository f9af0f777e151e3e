//! Scene executor — evaluate-and-act engine for a single scene run.
//!
//! The executor pulls the referenced device states from the state store,
//! asks the condition tree for a go/no-go decision, and runs the action
//! sequence against the HAL. It publishes no events and refreshes no state;
//! both are the caller's job, which keeps the executor independently
//! testable against a fake HAL and a fake snapshot.

use std::collections::HashMap;
use std::sync::Arc;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use scenehub_domain::error::ExecutionError;
use scenehub_domain::id::SceneId;
use scenehub_domain::scene::{self, Action, EvaluationContext, Scene};
use scenehub_domain::time::Timestamp;

use crate::ports::HalClient;
use crate::state_store::StateStore;

/// Outcome class of one scene run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Success,
    Skipped,
    Failed,
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => f.write_str("success"),
            Self::Skipped => f.write_str("skipped"),
            Self::Failed => f.write_str("failed"),
        }
    }
}

/// Result of one scene run. A value type, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub status: ExecutionStatus,
    pub scene_id: SceneId,
    pub message: String,
    pub executed_at: Timestamp,
}

impl ExecutionResult {
    #[must_use]
    pub fn success(scene_id: SceneId, message: impl Into<String>) -> Self {
        Self::new(ExecutionStatus::Success, scene_id, message)
    }

    #[must_use]
    pub fn skipped(scene_id: SceneId, message: impl Into<String>) -> Self {
        Self::new(ExecutionStatus::Skipped, scene_id, message)
    }

    #[must_use]
    pub fn failed(scene_id: SceneId, message: impl Into<String>) -> Self {
        Self::new(ExecutionStatus::Failed, scene_id, message)
    }

    fn new(status: ExecutionStatus, scene_id: SceneId, message: impl Into<String>) -> Self {
        Self {
            status,
            scene_id,
            message: message.into(),
            executed_at: scenehub_domain::time::now(),
        }
    }
}

/// Runs one scene against the HAL using the state store as its only source
/// of truth for conditions.
pub struct SceneExecutor<H> {
    hal: Arc<H>,
    store: Arc<StateStore>,
    timezone: Tz,
}

impl<H: HalClient + Send + Sync> SceneExecutor<H> {
    /// Create an executor reading condition time-of-day in `timezone`.
    pub fn new(hal: Arc<H>, store: Arc<StateStore>, timezone: Tz) -> Self {
        Self {
            hal,
            store,
            timezone,
        }
    }

    /// Run a scene once.
    ///
    /// Actions run strictly in sequence; the first failure aborts the rest
    /// and yields `failed`. Actions already sent are not rolled back: the
    /// run is best-effort, not transactional. Errors never escape this
    /// method; every outcome is an [`ExecutionResult`].
    #[tracing::instrument(skip(self, scene), fields(scene_id = %scene.id, triggered_by))]
    pub async fn execute(&self, scene: &Scene, triggered_by: &str) -> ExecutionResult {
        let context = self.build_context(scene);
        if !scene::evaluate(scene.definition.conditions.as_ref(), &context) {
            tracing::debug!("conditions not met");
            return ExecutionResult::skipped(scene.id.clone(), "conditions not met");
        }

        let mut executed = 0_usize;
        for action in &scene.definition.actions {
            if let Err(err) = self.run_action(&scene.id, action).await {
                tracing::warn!(error = %err, "action sequence aborted");
                return ExecutionResult::failed(scene.id.clone(), err.reason);
            }
            executed += 1;
        }

        ExecutionResult::success(scene.id.clone(), format!("executed {executed} actions"))
    }

    /// Snapshot the states of every device the definition references.
    ///
    /// Devices with no cached state are left out; condition evaluation
    /// treats them as "false" for any leaf referencing them.
    fn build_context(&self, scene: &Scene) -> EvaluationContext {
        let mut device_states = HashMap::new();
        for device_id in scene.definition.referenced_device_ids() {
            if let Some(state) = self.store.get(&device_id) {
                device_states.insert(device_id, state);
            }
        }
        EvaluationContext {
            device_states,
            scene_id: scene.id.clone(),
            current_time: scenehub_domain::time::now_in(&self.timezone),
        }
    }

    async fn run_action(&self, scene_id: &SceneId, action: &Action) -> Result<(), ExecutionError> {
        match action {
            Action::DeviceControl { device_id, command } => {
                match self.hal.send_command(device_id, command).await {
                    Ok(true) => Ok(()),
                    Ok(false) => Err(ExecutionError::new(
                        scene_id.clone(),
                        format!("device {device_id} rejected command"),
                    )),
                    Err(err) => Err(ExecutionError::new(
                        scene_id.clone(),
                        format!("failed to control device {device_id}: {err}"),
                    )),
                }
            }
            Action::Delay { seconds } => {
                // suspends only this execution; the scheduler and sibling
                // runs keep going
                tokio::time::sleep(std::time::Duration::from_secs(*seconds)).await;
                Ok(())
            }
        }
    }
}
