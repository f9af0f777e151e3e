//! Common error types used across the workspace.
//!
//! Each concern carries its own typed error; [`HubError`] is the workspace
//! umbrella that layers convert into via `#[from]`. No `String`-typed error
//! returns anywhere in the API surface.

use crate::id::SceneId;

/// A scene definition failed structural validation.
///
/// Surfaced to the caller that submitted the definition, never retried.
#[derive(Debug, thiserror::Error)]
#[error("invalid scene definition: {message}")]
pub struct DefinitionError {
    pub message: String,
}

impl DefinitionError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The HAL was unreachable or answered with a non-success status.
#[derive(Debug, thiserror::Error)]
#[error("HAL communication failed: {message}")]
pub struct CommunicationError {
    pub message: String,
}

impl CommunicationError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A device or scene id did not resolve to a known record.
#[derive(Debug, thiserror::Error)]
#[error("{entity} not found: {id}")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// An action sequence aborted mid-run.
///
/// Caught at the executor boundary and folded into a `failed` execution
/// result; it never propagates into the scheduler or sibling scenes.
#[derive(Debug, thiserror::Error)]
#[error("scene execution failed: {scene_id}: {reason}")]
pub struct ExecutionError {
    pub scene_id: SceneId,
    pub reason: String,
}

impl ExecutionError {
    #[must_use]
    pub fn new(scene_id: SceneId, reason: impl Into<String>) -> Self {
        Self {
            scene_id,
            reason: reason.into(),
        }
    }
}

/// Workspace-level error umbrella.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    #[error(transparent)]
    Definition(#[from] DefinitionError),

    #[error(transparent)]
    Communication(#[from] CommunicationError),

    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_render_not_found_with_entity_and_id() {
        let err = NotFoundError {
            entity: "Device",
            id: "light_01".to_string(),
        };
        assert_eq!(err.to_string(), "Device not found: light_01");
    }

    #[test]
    fn should_convert_definition_error_into_hub_error() {
        let err: HubError = DefinitionError::new("missing field `actions`").into();
        assert!(matches!(err, HubError::Definition(_)));
        assert!(err.to_string().contains("missing field `actions`"));
    }

    #[test]
    fn should_render_execution_error_with_scene_and_reason() {
        let err = ExecutionError::new(SceneId::new("scene_001"), "device unreachable");
        assert!(err.to_string().contains("scene_001"));
        assert!(err.to_string().contains("device unreachable"));
    }
}
